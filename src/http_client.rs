//! Shared HTTP client construction for upstream APIs

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};

use crate::Result;

/// Build a client with a request timeout and transient-failure retries
pub fn build_client(timeout_seconds: u32, max_retries: u32) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds.into()))
        .user_agent(concat!("MapQuery/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

static SECRET_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([?&](?:access_token|key)=)[^&\s)]*").expect("valid regex")
});

/// Replace the value of secret query parameters so keys never reach the logs.
/// Works on bare URLs and on messages that embed one.
#[must_use]
pub fn redact_url(text: &str) -> String {
    SECRET_PARAM.replace_all(text, "${1}***").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_url() {
        assert_eq!(
            redact_url("https://api.mapbox.com/x.json?access_token=pk.secret&limit=1"),
            "https://api.mapbox.com/x.json?access_token=***&limit=1"
        );
        assert_eq!(
            redact_url("https://example.com/models/m:generateContent?key=abc"),
            "https://example.com/models/m:generateContent?key=***"
        );
        assert_eq!(redact_url("https://example.com/plain"), "https://example.com/plain");
        assert_eq!(
            redact_url("error sending request for url (http://h/x.json?limit=1&access_token=sk.abc)"),
            "error sending request for url (http://h/x.json?limit=1&access_token=***)"
        );
    }

    #[test]
    fn test_build_client() {
        assert!(build_client(5, 1).is_ok());
    }
}
