//! ntfy push notifications.
//!
//! Messages are POSTed as plain text to `{server}/{topic}` with the title,
//! priority and tags carried in headers. When a password is configured the
//! request uses basic auth with an empty user name.

use crate::domain::alerts::{NotificationMessage, NotificationSettings};
use crate::domain::errors::NotificationError;
use crate::domain::ports::Notifier;
use crate::infrastructure::core::HttpClientFactory;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::RwLock;
use std::time::Duration;
use tracing::debug;

const SEND_TIMEOUT: Duration = Duration::from_secs(5);

pub struct NtfyNotifier {
    client: Client,
    settings: RwLock<NotificationSettings>,
}

impl NtfyNotifier {
    pub fn new(settings: NotificationSettings) -> Self {
        Self {
            client: HttpClientFactory::create_plain_client(SEND_TIMEOUT),
            settings: RwLock::new(settings),
        }
    }

    fn topic_url(settings: &NotificationSettings) -> Result<String, NotificationError> {
        let server = settings.server.trim().trim_end_matches('/');
        let topic = settings.topic.trim().trim_matches('/');
        if server.is_empty() {
            return Err(NotificationError::NotConfigured("ntfy server is empty".to_string()));
        }
        if topic.is_empty() {
            return Err(NotificationError::NotConfigured("ntfy topic is empty".to_string()));
        }
        Ok(format!("{}/{}", server, topic))
    }
}

#[async_trait]
impl Notifier for NtfyNotifier {
    async fn send(&self, message: &NotificationMessage) -> Result<(), NotificationError> {
        let settings = self.settings();
        let url = Self::topic_url(&settings)?;

        let mut request = self
            .client
            .post(&url)
            .header("Title", message.title.as_str())
            .header("Priority", message.priority.as_str())
            .body(message.body.clone());
        if !message.tags.is_empty() {
            request = request.header("Tags", message.tags.join(","));
        }
        if !settings.password.is_empty() {
            request = request.basic_auth("", Some(&settings.password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!("NtfyNotifier: Delivered '{}' to {}", message.title, url);
        Ok(())
    }

    fn settings(&self) -> NotificationSettings {
        match self.settings.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn update_settings(&self, settings: NotificationSettings) {
        match self.settings.write() {
            Ok(mut guard) => *guard = settings,
            Err(poisoned) => *poisoned.into_inner() = settings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(server: &str, topic: &str) -> NotificationSettings {
        NotificationSettings {
            server: server.to_string(),
            topic: topic.to_string(),
            password: String::new(),
        }
    }

    #[test]
    fn test_topic_url() {
        assert_eq!(
            NtfyNotifier::topic_url(&settings("https://ntfy.sh/", "crypto_alerts")).unwrap(),
            "https://ntfy.sh/crypto_alerts"
        );
        assert!(matches!(
            NtfyNotifier::topic_url(&settings("https://ntfy.sh", " ")),
            Err(NotificationError::NotConfigured(_))
        ));
    }

    #[tokio::test]
    async fn test_unconfigured_target_fails_without_network() {
        let notifier = NtfyNotifier::new(settings("", "alerts"));
        let message = NotificationMessage::test_message(chrono::Utc::now());
        let result = notifier.send(&message).await;
        assert!(matches!(result, Err(NotificationError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn test_settings_can_be_swapped() {
        let notifier = NtfyNotifier::new(NotificationSettings::default());
        notifier.update_settings(settings("https://ntfy.example.com", "desk"));
        assert_eq!(notifier.settings().topic, "desk");
    }
}
