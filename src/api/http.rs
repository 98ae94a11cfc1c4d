//! HTTP utilities for PidginHost REST API calls

use super::error::ApiError;
use reqwest::{Client, Method};
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Strips non-printable characters, then truncates long responses.
/// Stripping first leaves pure ASCII, so the byte-index truncation can
/// never land inside a multibyte character.
fn sanitize_for_log(body: &str) -> String {
    let printable: String = body
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .collect();

    if printable.len() > MAX_LOG_BODY_LENGTH {
        format!(
            "{}... [truncated, {} bytes total]",
            &printable[..MAX_LOG_BODY_LENGTH],
            body.len()
        )
    } else {
        printable
    }
}

/// HTTP client wrapper for provider API calls
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("phcloud/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Make a GET request
    pub async fn get(&self, url: &str, auth_header: &str) -> Result<Value, ApiError> {
        self.request(Method::GET, url, auth_header, None).await
    }

    /// Make a POST request with an optional JSON body
    pub async fn post(
        &self,
        url: &str,
        auth_header: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        self.request(Method::POST, url, auth_header, body).await
    }

    /// Make a PATCH request with a JSON body
    pub async fn patch(
        &self,
        url: &str,
        auth_header: &str,
        body: &Value,
    ) -> Result<Value, ApiError> {
        self.request(Method::PATCH, url, auth_header, Some(body))
            .await
    }

    /// Make a DELETE request
    pub async fn delete(&self, url: &str, auth_header: &str) -> Result<Value, ApiError> {
        self.request(Method::DELETE, url, auth_header, None).await
    }

    async fn request(
        &self,
        method: Method,
        url: &str,
        auth_header: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        tracing::debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method, url)
            .header(reqwest::header::AUTHORIZATION, auth_header)
            .header(reqwest::header::ACCEPT, "application/json");

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            // Only log a sanitized/truncated error body to avoid leaking
            // account details into log files.
            let sanitized = sanitize_for_log(&text);
            tracing::error!("API error: {} - {}", status, sanitized);
            return Err(ApiError::from_status(status.as_u16(), &sanitized, url));
        }

        // 204 and friends come back empty
        if text.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text)
            .map_err(|e| ApiError::Transport(format!("failed to parse response JSON: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let out = sanitize_for_log(&body);
        assert!(out.contains("truncated"));
        assert!(out.len() < body.len());
    }

    #[test]
    fn sanitize_strips_control_characters() {
        let out = sanitize_for_log("line1\nline2\tend");
        assert_eq!(out, "line1line2end");
    }

    #[test]
    fn sanitize_survives_multibyte_at_the_truncation_boundary() {
        // A two-byte character straddling the byte limit must not panic
        // the error path.
        let body = format!("{}é{}", "a".repeat(MAX_LOG_BODY_LENGTH - 1), "b".repeat(50));
        let out = sanitize_for_log(&body);
        assert!(out.is_ascii());
        assert!(out.contains("truncated"));
    }
}
