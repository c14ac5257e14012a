use super::kinds::{FiredAlert, MoveDirection};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NotificationPriority {
    Low,
    Default,
    High,
    Urgent,
}

impl NotificationPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationPriority::Low => "low",
            NotificationPriority::Default => "default",
            NotificationPriority::High => "high",
            NotificationPriority::Urgent => "urgent",
        }
    }
}

/// A formatted message handed to the notification collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationMessage {
    pub title: String,
    pub body: String,
    pub priority: NotificationPriority,
    pub tags: Vec<String>,
}

impl NotificationMessage {
    pub fn from_alert(alert: &FiredAlert) -> Self {
        match alert {
            FiredAlert::UpperBreach {
                symbol,
                price,
                threshold,
            } => Self {
                title: format!("Price Alert - {}", symbol),
                body: format!(
                    "{}: price ${:.2} is above upper threshold ${:.2}",
                    symbol, price, threshold
                ),
                priority: NotificationPriority::High,
                tags: tags(&["rocket", "up", "alert"]),
            },
            FiredAlert::LowerBreach {
                symbol,
                price,
                threshold,
            } => Self {
                title: format!("Price Alert - {}", symbol),
                body: format!(
                    "{}: price ${:.2} is below lower threshold ${:.2}",
                    symbol, price, threshold
                ),
                priority: NotificationPriority::High,
                tags: tags(&["chart-decreasing", "down", "alert"]),
            },
            FiredAlert::PercentMove {
                symbol,
                from,
                to,
                change,
                direction,
            } => {
                let pct = (change.abs() * Decimal::ONE_HUNDRED).round_dp(2);
                let (verb, tag_list) = match direction {
                    MoveDirection::Up => ("up", ["chart-increasing", "up", "trending"]),
                    MoveDirection::Down => ("down", ["chart-decreasing", "down", "trending"]),
                };
                Self {
                    title: format!("Price Change Alert - {}", symbol),
                    body: format!(
                        "{}: price {} {:.2}% from ${:.2} to ${:.2}",
                        symbol, verb, pct, from, to
                    ),
                    priority: NotificationPriority::High,
                    tags: tags(&tag_list),
                }
            }
        }
    }

    pub fn test_message(sent_at: DateTime<Utc>) -> Self {
        Self {
            title: "Price Monitor Test".to_string(),
            body: format!(
                "Test notification from the price monitor\nTime: {}",
                sent_at.format("%Y-%m-%d %H:%M:%S")
            ),
            priority: NotificationPriority::Default,
            tags: tags(&["test"]),
        }
    }
}

impl std::fmt::Display for NotificationMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.title, self.body)
    }
}

fn tags(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| t.to_string()).collect()
}

/// Push-notification endpoint settings (ntfy server, topic, optional password).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub server: String,
    pub topic: String,
    #[serde(default, skip_serializing)]
    pub password: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            server: "https://ntfy.sh".to_string(),
            topic: "crypto_alerts".to_string(),
            password: String::new(),
        }
    }
}
