use crate::domain::errors::FeedError;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Client for exchange price polling.
    ///
    /// Price requests are repeated every tick anyway, so a single quick retry
    /// is enough; the per-request timeout keeps a stalled exchange from
    /// holding a tick.
    pub fn create_feed_client(timeout: Duration) -> ClientWithMiddleware {
        Self::create_client(timeout, 1)
    }

    pub fn create_client(timeout: Duration, max_retries: u32) -> ClientWithMiddleware {
        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_millis(50), timeout.max(Duration::from_millis(100)))
            .build_with_max_retries(max_retries);

        let client = Client::builder()
            .pool_max_idle_per_host(5)
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build()
    }

    /// Plain client without retries, for one-shot deliveries such as push
    /// notifications.
    pub fn create_plain_client(timeout: Duration) -> Client {
        Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new())
    }
}

/// Builds a URL with percent-encoded query parameters.
///
/// `ClientWithMiddleware`'s request builder does not expose `.query()`, so
/// the query string is assembled here.
pub fn build_url_with_query<K, V>(base_url: &str, params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    if params.is_empty() {
        return base_url.to_string();
    }

    let query_string: String = params
        .iter()
        .map(|(k, v)| format!("{}={}", encode(k.as_ref()), encode(v.as_ref())))
        .collect::<Vec<_>>()
        .join("&");

    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", base_url, separator, query_string)
}

fn encode(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

/// Maps a failed send into the feed error vocabulary. Always transient.
pub fn feed_transport_error(err: reqwest_middleware::Error, timeout: Duration) -> FeedError {
    match err {
        reqwest_middleware::Error::Reqwest(e) if e.is_timeout() => FeedError::Timeout {
            duration_ms: timeout.as_millis() as u64,
        },
        other => FeedError::Transport(other.to_string()),
    }
}
