//! Wire payloads for the attendance API (camelCase JSON).

use punch_core::ClockAction;
use serde::{Deserialize, Serialize};

/// Metadata accompanying the photo in the multipart clock submission.
#[derive(Debug, Clone, Serialize)]
pub struct ClockRequest {
    pub action: ClockAction,
    pub latitude: f64,
    pub longitude: f64,
    /// RFC 3339 capture timestamp.
    pub timestamp: String,
}

/// Envelope returned by the clock endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<ClockData>,
}

/// Server-computed attendance result. Which fields are present depends on
/// the action: clock-in carries `clockInStatus`/`lateMinutes`, clock-out
/// carries `clockOutStatus`/`workMinutes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockData {
    pub clock_in_status: Option<String>,
    pub clock_out_status: Option<String>,
    pub late_minutes: Option<i64>,
    pub work_minutes: Option<i64>,
    pub location: Option<LocationCheck>,
}

/// Server-side geofence evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCheck {
    /// Distance from the allowed site, in meters.
    pub distance: f64,
    pub is_valid: bool,
}

/// Structured error body some endpoints return on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_in_response_parses() {
        let json = r#"{
            "success": true,
            "message": "Clocked in",
            "data": {
                "clockInStatus": "on-time",
                "lateMinutes": 0,
                "location": { "distance": 12.5, "isValid": true }
            }
        }"#;

        let resp: ClockResponse = serde_json::from_str(json).unwrap();
        assert!(resp.success);
        let data = resp.data.unwrap();
        assert_eq!(data.clock_in_status.as_deref(), Some("on-time"));
        assert_eq!(data.late_minutes, Some(0));
        assert!(data.clock_out_status.is_none());
        let loc = data.location.unwrap();
        assert!(loc.is_valid);
        assert!((loc.distance - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_clock_out_response_parses() {
        let json = r#"{
            "success": true,
            "message": "Clocked out",
            "data": {
                "clockOutStatus": "completed",
                "workMinutes": 485,
                "location": { "distance": 3.0, "isValid": true }
            }
        }"#;

        let resp: ClockResponse = serde_json::from_str(json).unwrap();
        let data = resp.data.unwrap();
        assert_eq!(data.clock_out_status.as_deref(), Some("completed"));
        assert_eq!(data.work_minutes, Some(485));
    }

    #[test]
    fn test_response_without_data_or_message() {
        let resp: ClockResponse = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert!(!resp.success);
        assert!(resp.message.is_empty());
        assert!(resp.data.is_none());
    }

    #[test]
    fn test_request_serializes_kebab_action() {
        let req = ClockRequest {
            action: ClockAction::ClockIn,
            latitude: -6.2,
            longitude: 106.8,
            timestamp: "2026-08-29T08:55:03+07:00".into(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["action"], "clock-in");
    }
}
