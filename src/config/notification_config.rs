//! ntfy notification settings from environment variables.
//!
//! These are the defaults used when the trading config file carries no
//! notification section.

use crate::domain::alerts::NotificationSettings;
use std::env;

#[derive(Debug, Clone)]
pub struct NotificationEnvConfig {
    pub server: String,
    pub topic: String,
    pub password: String,
}

impl Default for NotificationEnvConfig {
    fn default() -> Self {
        let settings = NotificationSettings::default();
        Self {
            server: settings.server,
            topic: settings.topic,
            password: settings.password,
        }
    }
}

impl NotificationEnvConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server: env::var("NTFY_SERVER").unwrap_or(defaults.server),
            topic: env::var("NTFY_TOPIC").unwrap_or(defaults.topic),
            password: env::var("NTFY_PASSWORD").unwrap_or_default(),
        }
    }

    pub fn settings(&self) -> NotificationSettings {
        NotificationSettings {
            server: self.server.trim_end_matches('/').to_string(),
            topic: self.topic.clone(),
            password: self.password.clone(),
        }
    }
}
