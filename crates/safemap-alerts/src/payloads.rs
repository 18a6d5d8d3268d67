use safemap_core::types::GeoPoint;
use serde::Serialize;
use serde_json::json;

/// Who is in trouble, as far as the summary prompt is concerned.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PersonContext {
    pub name: String,
    pub phone: Option<String>,
}

impl PersonContext {
    fn describe(&self) -> String {
        match &self.phone {
            Some(phone) => format!("{} (Phone: {})", self.name, phone),
            None => self.name.clone(),
        }
    }
}

/// Build the prompt sent alongside an emergency photo
pub fn image_analysis_prompt(location: Option<GeoPoint>) -> String {
    let location_context = location
        .map(|p| format!("Location coordinates: {}. ", p))
        .unwrap_or_default();

    format!(
        "{}This is an emergency situation image. Analyze this image in detail and provide:\n\
         1. Description of what you can see\n\
         2. Any potential safety concerns or hazards\n\
         3. Context that might be relevant for emergency responders\n\
         4. Suggestions for immediate actions if any\n\
         Please be concise but thorough in your analysis.",
        location_context
    )
}

/// Build the prompt that turns an analysis into an alert for contacts
pub fn summary_prompt(
    analysis: &str,
    location: GeoPoint,
    person: Option<&PersonContext>,
    time: &str,
) -> String {
    let person_line = person
        .map(|p| format!("Person in need: {}\n", p.describe()))
        .unwrap_or_default();

    format!(
        "Create a concise emergency summary based on the following information:\n\
         Location: {}\n\
         {}Image Analysis: {}\n\
         Current Time: {}\n\n\
         Please format this as a clear, urgent emergency alert that can be sent to emergency \
         contacts. Include key details and location coordinates.",
        location, person_line, analysis, time
    )
}

/// Gemini generateContent body with an inline JPEG part
pub fn gemini_image_request(photo_base64: &str, prompt: &str) -> serde_json::Value {
    json!({
        "contents": [{
            "parts": [
                {
                    "inline_data": {
                        "mime_type": "image/jpeg",
                        "data": photo_base64
                    }
                },
                { "text": prompt }
            ]
        }]
    })
}

/// Gemini generateContent body for a text-only prompt
pub fn gemini_text_request(prompt: &str) -> serde_json::Value {
    json!({
        "contents": [{
            "parts": [{ "text": prompt }]
        }]
    })
}

/// Pull the concatenated text parts out of a generateContent response
pub fn gemini_response_text(response: &serde_json::Value) -> Option<String> {
    let parts = response
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
        .collect();

    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

pub fn mock_image_analysis(location: Option<GeoPoint>) -> String {
    let place = location
        .map(|p| p.to_string())
        .unwrap_or_else(|| "unknown location".to_string());
    format!(
        "MOCK ANALYSIS: Emergency situation detected at location {}. Image analysis would be \
         performed here with Gemini AI. Please set GEMINI_API_KEY to enable real analysis.",
        place
    )
}

pub fn mock_summary(
    analysis: &str,
    location: GeoPoint,
    person: Option<&PersonContext>,
    time: &str,
) -> String {
    let person_line = person
        .map(|p| match &p.phone {
            Some(phone) => format!("Person: {} ({})", p.name, phone),
            None => format!("Person: {}", p.name),
        })
        .unwrap_or_else(|| "Identity unknown".to_string());

    format!(
        "EMERGENCY ALERT - MOCK ANALYSIS\n\
         Location: {}\n\
         {}\n\
         Situation: {}\n\
         Time: {}\n\
         This is a mock emergency summary. Real AI analysis requires GEMINI_API_KEY.",
        location, person_line, analysis, time
    )
}
