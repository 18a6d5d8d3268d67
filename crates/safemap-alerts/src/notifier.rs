use crate::AlertError;
use async_trait::async_trait;
use futures_util::future::join_all;
use safemap_core::types::GeoPoint;
use serde::Serialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(500);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(8);
const DEFAULT_ATTEMPTS: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipient {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
}

/// One alert addressed to one emergency contact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertMessage {
    pub sos_id: String,
    pub recipient: Recipient,
    pub text: String,
    pub location: GeoPoint,
}

impl AlertMessage {
    /// Google Maps link appended to outgoing texts.
    pub fn maps_link(&self) -> String {
        format!(
            "https://maps.google.com/?q={},{}",
            self.location.lat, self.location.lng
        )
    }
}

#[async_trait]
pub trait AlertNotifier: Send + Sync {
    async fn notify(&self, message: &AlertMessage) -> Result<(), AlertError>;
}

/// Deliver every message concurrently; returns how many succeeded.
pub async fn notify_all(notifier: &dyn AlertNotifier, messages: &[AlertMessage]) -> usize {
    let results = join_all(messages.iter().map(|m| notifier.notify(m))).await;

    results
        .into_iter()
        .zip(messages)
        .filter(|(result, message)| match result {
            Ok(()) => true,
            Err(e) => {
                error!(
                    "Alert for SOS {} to {} failed: {}",
                    message.sos_id, message.recipient.name, e
                );
                false
            }
        })
        .count()
}

/// Writes alerts to the log instead of sending them anywhere.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl AlertNotifier for LogNotifier {
    async fn notify(&self, message: &AlertMessage) -> Result<(), AlertError> {
        info!(
            sos_id = %message.sos_id,
            recipient = %message.recipient.name,
            phone = %message.recipient.phone,
            "ALERT: {}",
            message.text
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookBody<'a> {
    text: String,
    sos_id: &'a str,
    recipient: &'a Recipient,
    location: GeoPoint,
}

/// POSTs each alert as JSON to a relay (SMS gateway, chat hook, ...).
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
    attempts: u32,
    initial_delay: Duration,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            url,
            client,
            attempts: DEFAULT_ATTEMPTS,
            initial_delay: INITIAL_RETRY_DELAY,
        }
    }

    pub fn with_retry(mut self, attempts: u32, initial_delay: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.initial_delay = initial_delay;
        self
    }

    async fn post_once(&self, message: &AlertMessage) -> Result<(), AlertError> {
        let body = WebhookBody {
            text: format!("{}\n{}", message.text, message.maps_link()),
            sos_id: &message.sos_id,
            recipient: &message.recipient,
            location: message.location,
        };
        let response = self.client.post(&self.url).json(&body).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(AlertError::Status {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl AlertNotifier for WebhookNotifier {
    async fn notify(&self, message: &AlertMessage) -> Result<(), AlertError> {
        let mut delay = self.initial_delay;
        let mut attempt = 1;

        loop {
            match self.post_once(message).await {
                Ok(()) => {
                    debug!("Delivered alert to {} (attempt {})", message.recipient.name, attempt);
                    return Ok(());
                }
                Err(e) if attempt >= self.attempts => return Err(e),
                Err(e) => {
                    warn!(
                        "Alert delivery to {} failed: {}; retrying in {:?} (attempt {})",
                        message.recipient.name, e, delay, attempt
                    );
                }
            }

            sleep(delay).await;
            delay = (delay * 2).min(MAX_RETRY_DELAY);
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn message(name: &str) -> AlertMessage {
        AlertMessage {
            sos_id: "sos-1".to_string(),
            recipient: Recipient {
                name: name.to_string(),
                phone: "+91 90000 00000".to_string(),
                email: None,
            },
            text: "Help needed".to_string(),
            location: GeoPoint::new(26.85, 80.95),
        }
    }

    /// Records deliveries and fails for recipients named "unreachable".
    #[derive(Default)]
    struct RecordingNotifier {
        delivered: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AlertNotifier for RecordingNotifier {
        async fn notify(&self, message: &AlertMessage) -> Result<(), AlertError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if message.recipient.name == "unreachable" {
                return Err(AlertError::EmptyResponse);
            }
            self.delivered
                .lock()
                .unwrap()
                .push(message.recipient.name.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_notify_all_counts_successes() {
        let notifier = RecordingNotifier::default();
        let messages = vec![message("amma"), message("unreachable"), message("ravi")];

        let sent = notify_all(&notifier, &messages).await;
        assert_eq!(sent, 2);
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 3);

        let mut delivered = notifier.delivered.lock().unwrap().clone();
        delivered.sort();
        assert_eq!(delivered, vec!["amma", "ravi"]);
    }

    #[tokio::test]
    async fn test_notify_all_empty() {
        assert_eq!(notify_all(&LogNotifier, &[]).await, 0);
    }

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        assert!(LogNotifier.notify(&message("amma")).await.is_ok());
    }

    #[tokio::test]
    async fn test_webhook_gives_up_after_retries() {
        let notifier = WebhookNotifier::new("http://127.0.0.1:9/alerts".to_string())
            .with_retry(2, Duration::from_millis(1));
        let result = notifier.notify(&message("amma")).await;
        assert!(matches!(result, Err(AlertError::Http(_))));
    }

    #[test]
    fn test_maps_link() {
        assert_eq!(
            message("amma").maps_link(),
            "https://maps.google.com/?q=26.85,80.95"
        );
    }
}
