//! HTTP client for the attendance endpoint.
//!
//! [`AttendanceClient`] holds the base URL, bearer token, and a configured
//! request timeout. One clock submission is one multipart POST; failures are
//! surfaced to the caller, never retried here.

use crate::types::{ApiErrorBody, ClockRequest, ClockResponse};
use reqwest::multipart;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The server answered with a structured error payload.
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },
    /// Transport-level failure (DNS, connect, timeout, TLS).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// 2xx response whose body did not match the expected schema.
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

/// Client for the remote attendance service.
pub struct AttendanceClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl AttendanceClient {
    /// Build a client with a hard per-request timeout.
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: trim_trailing_slash(base_url.into()),
            token,
        })
    }

    /// Submit a clock-in/out: watermarked JPEG plus metadata, multipart.
    ///
    /// The server decides geofence validity and lateness; its result is
    /// returned as-is.
    pub async fn submit_clock(
        &self,
        request: &ClockRequest,
        photo_jpeg: Vec<u8>,
    ) -> Result<ClockResponse, ApiError> {
        let attempt_id = uuid::Uuid::new_v4();
        let url = format!("{}/attendance/clock", self.base_url);

        let photo = multipart::Part::bytes(photo_jpeg)
            .file_name("attendance.jpg")
            .mime_str("image/jpeg")
            .map_err(ApiError::Network)?;

        let form = multipart::Form::new()
            .part("photo", photo)
            .text("action", request.action.as_str())
            .text("latitude", request.latitude.to_string())
            .text("longitude", request.longitude.to_string())
            .text("timestamp", request.timestamp.clone());

        let mut req = self.http.post(&url).multipart(form);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        tracing::info!(%attempt_id, action = %request.action, "submitting clock record");

        let response = req.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // A structured payload (has a message field) is an API error;
            // anything else is reported with the raw status line.
            let message = match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(parsed) => parsed.message,
                Err(_) => format!("HTTP {status}"),
            };
            tracing::warn!(%attempt_id, status = status.as_u16(), %message, "clock submission rejected");
            return Err(ApiError::Api { status: status.as_u16(), message });
        }

        let parsed: ClockResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        tracing::info!(%attempt_id, success = parsed.success, "clock submission accepted");
        Ok(parsed)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn trim_trailing_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalized() {
        let client =
            AttendanceClient::new("http://localhost:3000/api/", None, Duration::from_secs(5))
                .unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000/api");
    }

    #[test]
    fn test_structured_error_body_detected() {
        let body = r#"{"message": "Outside allowed radius"}"#;
        let parsed: ApiErrorBody = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.message, "Outside allowed radius");
    }

    #[test]
    fn test_unstructured_error_body_rejected() {
        assert!(serde_json::from_str::<ApiErrorBody>("Internal Server Error").is_err());
        assert!(serde_json::from_str::<ApiErrorBody>(r#"{"detail": "x"}"#).is_err());
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Api { status: 422, message: "Outside allowed radius".into() };
        assert_eq!(err.to_string(), "api error (422): Outside allowed radius");
    }
}
