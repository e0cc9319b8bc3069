//! reqwest-backed [`DataApi`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, COOKIE};
use reqwest::Url;

use crate::api::DataApi;
use crate::error::{AuthzError, Result};

/// Default per-request timeout.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Data API client against a host origin.
///
/// Credentials are carried the way the host page carries them: a session
/// cookie, or a bearer token for API keys.
#[derive(Debug, Clone)]
pub struct HttpDataApi {
    client: reqwest::Client,
    base: Url,
}

impl HttpDataApi {
    /// Client for `base_url` with no credentials.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_headers(base_url, HeaderMap::new(), DEFAULT_REQUEST_TIMEOUT)
    }

    /// Client that sends `cookie` on every request.
    pub fn with_cookie(base_url: &str, cookie: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, sensitive(cookie)?);
        Self::with_headers(base_url, headers, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Client that authenticates with a bearer token.
    pub fn with_bearer_token(base_url: &str, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, sensitive(&format!("Bearer {token}"))?);
        Self::with_headers(base_url, headers, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Client with explicit default headers and request timeout.
    pub fn with_headers(base_url: &str, headers: HeaderMap, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| AuthzError::Client(e.to_string()))?;
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| AuthzError::Client(e.to_string()))?;
        Ok(Self { client, base })
    }

    /// Absolute URL for an API path.
    pub fn url_for(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| AuthzError::Client(format!("invalid path {path}: {e}")))
    }
}

fn sensitive(value: &str) -> Result<HeaderValue> {
    let mut header =
        HeaderValue::from_str(value).map_err(|e| AuthzError::Client(e.to_string()))?;
    header.set_sensitive(true);
    Ok(header)
}

#[async_trait]
impl DataApi for HttpDataApi {
    async fn get_json(&self, path: &str) -> Result<serde_json::Value> {
        let url = self.url_for(path)?;
        tracing::debug!(%url, "GET");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                AuthzError::Timeout {
                    path: path.to_string(),
                }
            } else {
                AuthzError::Request {
                    path: path.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthzError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| AuthzError::Malformed(format!("{path}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_joins_absolute_paths() {
        let api = HttpDataApi::new("https://sheets.example.com/some/prefix/").unwrap();
        assert_eq!(
            api.url_for("/api/profile/user").unwrap().as_str(),
            "https://sheets.example.com/api/profile/user"
        );
    }

    #[test]
    fn test_rejects_invalid_base() {
        assert!(matches!(HttpDataApi::new("not a url"), Err(AuthzError::Client(_))));
    }

    #[test]
    fn test_rejects_header_injection() {
        assert!(HttpDataApi::with_cookie("https://x.example", "a=b\r\nX-Evil: 1").is_err());
        assert!(HttpDataApi::with_bearer_token("https://x.example", "tok").is_ok());
    }

    #[tokio::test]
    async fn test_connection_failure_is_request_error() {
        // Port 9 (discard) on loopback is closed in test environments.
        let api = HttpDataApi::with_headers(
            "http://127.0.0.1:9",
            HeaderMap::new(),
            Duration::from_secs(2),
        )
        .unwrap();
        let err = api.get_json("/api/profile/user").await.unwrap_err();
        assert!(matches!(
            err,
            AuthzError::Request { .. } | AuthzError::Timeout { .. }
        ));
    }
}
