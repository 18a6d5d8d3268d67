use crate::payloads::{
    gemini_image_request, gemini_response_text, gemini_text_request, image_analysis_prompt,
    mock_image_analysis, mock_summary, summary_prompt, PersonContext,
};
use crate::AlertError;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Utc;
use safemap_core::types::GeoPoint;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const VISION_MODEL: &str = "gemini-2.5-pro";
pub const SUMMARY_MODEL: &str = "gemini-2.5-flash";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Placeholder key the web client ships with; treated as "no key".
const MOCK_KEY: &str = "mock-key";

#[async_trait]
pub trait EvidenceAnalyzer: Send + Sync {
    /// Describe what a JPEG shows, from an emergency responder's view.
    async fn analyze_image(&self, photo: &[u8], location: Option<GeoPoint>) -> Result<String, AlertError>;

    /// Turn an analysis into an alert text for emergency contacts.
    async fn summarize(
        &self,
        analysis: &str,
        location: GeoPoint,
        person: Option<&PersonContext>,
    ) -> Result<String, AlertError>;
}

/// Pick the Gemini client when a usable key is configured, the mock otherwise.
pub fn analyzer_from_config(api_key: Option<String>, base_url: Option<String>) -> Arc<dyn EvidenceAnalyzer> {
    match api_key.filter(|k| !k.trim().is_empty() && k != MOCK_KEY) {
        Some(key) => {
            let base_url = base_url.unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());
            info!("Using Gemini evidence analysis at {}", base_url);
            Arc::new(GeminiAnalyzer::new(key, base_url))
        }
        None => {
            info!("No Gemini API key configured, using mock evidence analysis");
            Arc::new(MockAnalyzer)
        }
    }
}

fn now_label() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

pub struct GeminiAnalyzer {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiAnalyzer {
    pub fn new(api_key: String, base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    async fn generate(&self, model: &str, body: serde_json::Value) -> Result<String, AlertError> {
        debug!("Calling Gemini model {}", model);
        let response = self
            .client
            .post(self.endpoint(model))
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AlertError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = response.json().await?;
        gemini_response_text(&json).ok_or(AlertError::EmptyResponse)
    }
}

#[async_trait]
impl EvidenceAnalyzer for GeminiAnalyzer {
    async fn analyze_image(&self, photo: &[u8], location: Option<GeoPoint>) -> Result<String, AlertError> {
        let prompt = image_analysis_prompt(location);
        let body = gemini_image_request(&STANDARD.encode(photo), &prompt);
        self.generate(VISION_MODEL, body).await
    }

    async fn summarize(
        &self,
        analysis: &str,
        location: GeoPoint,
        person: Option<&PersonContext>,
    ) -> Result<String, AlertError> {
        let prompt = summary_prompt(analysis, location, person, &now_label());
        self.generate(SUMMARY_MODEL, gemini_text_request(&prompt)).await
    }
}

/// Offline analyzer used when no API key is configured.
pub struct MockAnalyzer;

#[async_trait]
impl EvidenceAnalyzer for MockAnalyzer {
    async fn analyze_image(&self, _photo: &[u8], location: Option<GeoPoint>) -> Result<String, AlertError> {
        Ok(mock_image_analysis(location))
    }

    async fn summarize(
        &self,
        analysis: &str,
        location: GeoPoint,
        person: Option<&PersonContext>,
    ) -> Result<String, AlertError> {
        Ok(mock_summary(analysis, location, person, &now_label()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let analyzer = GeminiAnalyzer::new("k".to_string(), "http://localhost:9999/".to_string());
        assert_eq!(
            analyzer.endpoint(VISION_MODEL),
            "http://localhost:9999/v1beta/models/gemini-2.5-pro:generateContent"
        );
    }

    #[tokio::test]
    async fn test_mock_analyzer() {
        let analyzer = MockAnalyzer;
        let location = GeoPoint::new(26.85, 80.95);
        let analysis = analyzer.analyze_image(b"jpeg", Some(location)).await.unwrap();
        assert!(analysis.starts_with("MOCK ANALYSIS"));
        assert!(analysis.contains("26.85, 80.95"));

        let person = PersonContext {
            name: "Asha".to_string(),
            phone: None,
        };
        let summary = analyzer.summarize(&analysis, location, Some(&person)).await.unwrap();
        assert!(summary.contains("Person: Asha"));
        assert!(summary.contains(&analysis));
    }

    #[tokio::test]
    async fn test_unreachable_gemini_is_an_error() {
        // Port 9 (discard) is not listening in test environments
        let analyzer = GeminiAnalyzer::new("k".to_string(), "http://127.0.0.1:9".to_string());
        let result = analyzer.analyze_image(b"jpeg", None).await;
        assert!(matches!(result, Err(AlertError::Http(_))));
    }

    #[tokio::test]
    async fn test_transport_error_hides_api_key() {
        let analyzer = GeminiAnalyzer::new("SECRET123".to_string(), "http://127.0.0.1:9".to_string());
        let err = analyzer.analyze_image(b"jpeg", None).await.unwrap_err();
        let text = format!("Error analyzing image: {}", err);
        assert!(text.contains("127.0.0.1:9"), "{}", text);
        assert!(!text.contains("SECRET123"), "{}", text);

        let err = analyzer
            .summarize("analysis", GeoPoint::new(26.85, 80.95), None)
            .await
            .unwrap_err();
        assert!(!format!("{:?}", err).contains("SECRET123"));
    }
}
