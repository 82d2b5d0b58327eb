//! REST client for the clinic backend.

use crate::config::{AuthConfig, TuiConfig};
use async_trait::async_trait;
use clinic_core::{Endpoint, FetchError, Payload, Record, RecordId, Transport};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Failure to construct the client. Request failures are [`FetchError`].
#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Config error: {0}")]
    Config(String),
}

/// Error body shapes the backend is known to send.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

const MAX_ERROR_TEXT: usize = 200;

#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
    auth_header: HeaderMap,
}

impl RestClient {
    pub fn new(config: &TuiConfig) -> Result<Self, ApiClientError> {
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        let auth_header = build_auth_headers(&config.auth)?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            auth_header,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(
        &self,
        method: Method,
        path: String,
        body: Option<&Payload>,
    ) -> Result<Vec<u8>, FetchError> {
        let label = method_label(&method);
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(method = label, %path, "Sending request");

        let mut request = self
            .client
            .request(method, url)
            .headers(self.auth_header.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(method = label, %path, error = %e, "Request failed");
            FetchError::Transport {
                method: label,
                path: path.clone(),
                reason: e.to_string(),
            }
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| FetchError::Transport {
            method: label,
            path: path.clone(),
            reason: e.to_string(),
        })?;

        if !status.is_success() {
            let message = error_message(&bytes);
            tracing::warn!(
                method = label,
                %path,
                status = status.as_u16(),
                %message,
                "Request rejected"
            );
            return Err(FetchError::Status {
                method: label,
                path,
                status: status.as_u16(),
                message,
            });
        }

        Ok(bytes.to_vec())
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: String,
        body: Option<&Payload>,
    ) -> Result<T, FetchError> {
        let label = method_label(&method);
        let bytes = self.send(method, path.clone(), body).await?;
        serde_json::from_slice::<T>(&bytes).map_err(|e| {
            tracing::warn!(method = label, %path, error = %e, "Response did not decode");
            FetchError::Decode {
                method: label,
                path,
                reason: e.to_string(),
            }
        })
    }
}

#[async_trait]
impl Transport for RestClient {
    async fn list(&self, entity: &str) -> Result<Vec<Record>, FetchError> {
        let path = Endpoint::List { entity }.path();
        self.fetch_json(Method::GET, path, None).await
    }

    async fn get(&self, entity: &str, id: &RecordId) -> Result<Record, FetchError> {
        let path = Endpoint::Item { entity, id }.path();
        self.fetch_json(Method::GET, path, None).await
    }

    async fn create(&self, entity: &str, body: &Payload) -> Result<Record, FetchError> {
        let path = Endpoint::List { entity }.path();
        self.fetch_json(Method::POST, path, Some(body)).await
    }

    async fn update(
        &self,
        entity: &str,
        id: &RecordId,
        body: &Payload,
    ) -> Result<Record, FetchError> {
        let path = Endpoint::Item { entity, id }.path();
        self.fetch_json(Method::PUT, path, Some(body)).await
    }

    async fn delete(&self, entity: &str, id: &RecordId) -> Result<(), FetchError> {
        // Any 2xx is success; the acknowledgement body is not inspected.
        let path = Endpoint::Item { entity, id }.path();
        self.send(Method::DELETE, path, None).await.map(|_| ())
    }

    async fn list_nested(
        &self,
        parent: &str,
        id: &RecordId,
        child: &str,
    ) -> Result<Vec<Record>, FetchError> {
        let path = Endpoint::Nested { parent, id, child }.path();
        self.fetch_json(Method::GET, path, None).await
    }
}

fn method_label(method: &Method) -> &'static str {
    match *method {
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::DELETE => "DELETE",
        _ => "GET",
    }
}

/// Pull a human readable message out of an error response.
fn error_message(bytes: &[u8]) -> String {
    if let Ok(body) = serde_json::from_slice::<ErrorBody>(bytes) {
        if let Some(message) = body.error.or(body.message) {
            return message;
        }
    }
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    if text.chars().count() > MAX_ERROR_TEXT {
        let truncated: String = text.chars().take(MAX_ERROR_TEXT).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}

fn build_auth_headers(auth: &AuthConfig) -> Result<HeaderMap, ApiClientError> {
    let mut headers = HeaderMap::new();
    if let Some(api_key) = &auth.api_key {
        headers.insert(
            HeaderName::from_static("x-api-key"),
            HeaderValue::from_str(api_key).map_err(|e| ApiClientError::Config(e.to_string()))?,
        );
    }
    if let Some(token) = &auth.bearer_token {
        let value = format!("Bearer {}", token);
        headers.insert(
            HeaderName::from_static("authorization"),
            HeaderValue::from_str(&value).map_err(|e| ApiClientError::Config(e.to_string()))?,
        );
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_error_key() {
        assert_eq!(error_message(br#"{"error": "Owner not found"}"#), "Owner not found");
        assert_eq!(error_message(br#"{"message": "bad date"}"#), "bad date");
    }

    #[test]
    fn test_error_message_falls_back_to_text() {
        assert_eq!(error_message(b"  Internal Server Error \n"), "Internal Server Error");
        let long = "x".repeat(500);
        let message = error_message(long.as_bytes());
        assert!(message.ends_with("..."));
        assert_eq!(message.chars().count(), MAX_ERROR_TEXT + 3);
    }

    #[test]
    fn test_auth_headers() {
        let headers = build_auth_headers(&AuthConfig {
            api_key: Some("k".to_string()),
            bearer_token: Some("t".to_string()),
        })
        .unwrap();
        assert_eq!(headers.get("x-api-key").unwrap(), "k");
        assert_eq!(headers.get("authorization").unwrap(), "Bearer t");

        let empty = build_auth_headers(&AuthConfig::default()).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_rejects_invalid_header_value() {
        let err = build_auth_headers(&AuthConfig {
            api_key: Some("bad\nkey".to_string()),
            bearer_token: None,
        })
        .unwrap_err();
        assert!(matches!(err, ApiClientError::Config(_)));
    }
}
