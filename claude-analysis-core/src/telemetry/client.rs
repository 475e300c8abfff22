//! HTTP client for the telemetry upload endpoint.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::{json, Map, Value};

use crate::config::TelemetryConfig;
use crate::error::{Error, Result};
use crate::types::AnalysisPayload;

/// Response document returned by a successful submission.
pub type SubmitResponse = Map<String, Value>;

/// HTTP client for the telemetry endpoint
pub struct TelemetryClient {
    config: TelemetryConfig,
    http_client: reqwest::Client,
}

impl TelemetryClient {
    /// Create a new telemetry client for `user`.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: TelemetryConfig, user: &str) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-user-id",
            HeaderValue::from_str(user)
                .map_err(|e| Error::Config(format!("invalid user name: {}", e)))?,
        );

        if config.accept_invalid_certs {
            tracing::warn!("TLS certificate verification disabled for telemetry endpoint");
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Endpoint the payload is posted to
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Submit a payload once.
    ///
    /// A 2xx response whose body is a JSON object is returned as is; any other
    /// 2xx body is wrapped in a success envelope.
    pub async fn submit_once(&self, payload: &AnalysisPayload) -> Result<SubmitResponse> {
        let response = self
            .http_client
            .post(&self.config.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| Error::Telemetry(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Telemetry(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Error::Telemetry(format!(
                "API returned error status {}: {}",
                status.as_u16(),
                body
            )));
        }

        match serde_json::from_str::<Value>(&body) {
            Ok(Value::Object(map)) => Ok(map),
            _ => Ok(success_envelope(status.as_u16(), body)),
        }
    }

    /// Submit with retry logic
    ///
    /// Retries transient failures (5xx, connection errors, timeouts) with
    /// exponential backoff.
    pub async fn submit(&self, payload: &AnalysisPayload) -> Result<SubmitResponse> {
        let mut last_error = None;
        let mut delay = Duration::from_millis(500);

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::debug!(
                    "Retrying submit (attempt {}/{}), waiting {:?}",
                    attempt + 1,
                    self.config.max_retries + 1,
                    delay
                );
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, Duration::from_secs(30));
            }

            match self.submit_once(payload).await {
                Ok(response) => {
                    tracing::info!(
                        endpoint = %self.config.endpoint,
                        records = payload.records.len(),
                        "Submitted analysis payload"
                    );
                    return Ok(response);
                }
                Err(e) if is_retryable_error(&e) => {
                    tracing::warn!("Transient error submitting payload: {}", e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Telemetry("max retries exceeded".to_string())))
    }
}

fn success_envelope(status: u16, body: String) -> SubmitResponse {
    let envelope = json!({
        "status": "success",
        "statusCode": status,
        "message": "request completed successfully",
        "response": body,
    });
    match envelope {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Check if an error is retryable (transient)
fn is_retryable_error(error: &Error) -> bool {
    match error {
        Error::Telemetry(msg) => {
            msg.starts_with("API returned error status 5") || msg.starts_with("HTTP request failed")
        }
        _ => false,
    }
}

/// Synchronous wrapper for TelemetryClient
///
/// Provides blocking methods for use in synchronous code.
pub struct SyncTelemetryClient {
    inner: TelemetryClient,
    runtime: tokio::runtime::Runtime,
}

impl SyncTelemetryClient {
    pub fn new(config: TelemetryConfig, user: &str) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Telemetry(format!("failed to create runtime: {}", e)))?;

        Ok(Self {
            inner: TelemetryClient::new(config, user)?,
            runtime,
        })
    }

    /// Submit with retries (blocking)
    pub fn submit(&self, payload: &AnalysisPayload) -> Result<SubmitResponse> {
        self.runtime.block_on(self.inner.submit(payload))
    }

    pub fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{serve, unreachable_url, Canned};
    use crate::types::AnalysisRecord;

    fn config(endpoint: String, max_retries: usize) -> TelemetryConfig {
        TelemetryConfig {
            endpoint,
            timeout_secs: 5,
            max_retries,
            ..Default::default()
        }
    }

    fn payload() -> AnalysisPayload {
        AnalysisPayload {
            user: "alice".to_string(),
            records: vec![AnalysisRecord::default()],
            extension_name: "Claude-Code".to_string(),
            machine_id: "m-1".to_string(),
            insights_version: "1.2.3".to_string(),
        }
    }

    #[test]
    fn test_client_requires_valid_config() {
        assert!(TelemetryClient::new(config(String::new(), 0), "alice").is_err());
        assert!(TelemetryClient::new(config("ftp://host".to_string(), 0), "alice").is_err());
        assert!(TelemetryClient::new(TelemetryConfig::default(), "alice").is_ok());
    }

    #[test]
    fn test_client_rejects_unencodable_user() {
        let result = TelemetryClient::new(TelemetryConfig::default(), "bad\nuser");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_json_object_response_is_returned() {
        let (url, requests) = serve(vec![Canned::new(200, r#"{"status":"ok","id":7}"#)]);
        let client = SyncTelemetryClient::new(config(url, 0), "alice").unwrap();

        let response = client.submit(&payload()).unwrap();
        assert_eq!(response["status"], "ok");
        assert_eq!(response["id"], 7);

        let request = requests.recv().unwrap();
        let lowered = request.to_ascii_lowercase();
        assert!(request.starts_with("POST / HTTP/1.1"));
        assert!(lowered.contains("content-type: application/json"));
        assert!(lowered.contains("x-user-id: alice"));
        assert!(request.contains(r#""user":"alice""#));
        assert!(request.contains(r#""insightsVersion":"1.2.3""#));
    }

    #[test]
    fn test_non_object_response_is_wrapped() {
        let (url, _requests) = serve(vec![Canned::new(201, "accepted")]);
        let client = SyncTelemetryClient::new(config(url, 0), "alice").unwrap();

        let response = client.submit(&payload()).unwrap();
        assert_eq!(response["status"], "success");
        assert_eq!(response["statusCode"], 201);
        assert_eq!(response["message"], "request completed successfully");
        assert_eq!(response["response"], "accepted");
    }

    #[test]
    fn test_error_status_is_reported() {
        let (url, _requests) = serve(vec![Canned::new(400, "bad payload")]);
        let client = SyncTelemetryClient::new(config(url, 3), "alice").unwrap();

        let err = client.submit(&payload()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "telemetry error: API returned error status 400: bad payload"
        );
    }

    #[test]
    fn test_server_error_is_retried() {
        let (url, requests) = serve(vec![
            Canned::new(503, "busy"),
            Canned::new(200, r#"{"status":"ok"}"#),
        ]);
        let client = SyncTelemetryClient::new(config(url, 1), "alice").unwrap();

        let response = client.submit(&payload()).unwrap();
        assert_eq!(response["status"], "ok");
        assert_eq!(requests.try_iter().count(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_fails() {
        let client = TelemetryClient::new(config(unreachable_url(), 0), "alice").unwrap();
        let err = client.submit(&payload()).await.unwrap_err();
        assert!(err.to_string().contains("HTTP request failed"));
    }

    #[test]
    fn test_is_retryable_error() {
        assert!(is_retryable_error(&Error::Telemetry(
            "API returned error status 500: internal error".to_string()
        )));
        assert!(is_retryable_error(&Error::Telemetry(
            "HTTP request failed: operation timed out".to_string()
        )));
        assert!(!is_retryable_error(&Error::Telemetry(
            "API returned error status 404: not found".to_string()
        )));
        assert!(!is_retryable_error(&Error::Config("bad".to_string())));
    }
}
