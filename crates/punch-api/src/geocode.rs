//! Best-effort reverse geocoding for the watermark's address line.

use serde::Deserialize;
use std::time::Duration;

/// Fixed fallback used whenever the lookup fails for any reason.
pub const ADDRESS_UNAVAILABLE: &str = "address unavailable";

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: String,
}

/// Nominatim-style reverse geocoder.
///
/// The address only decorates the watermark, so every failure mode (network,
/// non-2xx, malformed body) collapses to [`ADDRESS_UNAVAILABLE`] instead of
/// propagating an error into the clock workflow.
pub struct ReverseGeocoder {
    http: reqwest::Client,
    base_url: String,
}

impl ReverseGeocoder {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("punchd/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self { http, base_url })
    }

    /// Resolve a display address for the coordinates, or the fallback string.
    pub async fn lookup(&self, latitude: f64, longitude: f64) -> String {
        match self.try_lookup(latitude, longitude).await {
            Ok(address) => address,
            Err(e) => {
                tracing::warn!(error = %e, latitude, longitude, "reverse geocode failed, using fallback");
                ADDRESS_UNAVAILABLE.to_string()
            }
        }
    }

    async fn try_lookup(&self, latitude: f64, longitude: f64) -> Result<String, reqwest::Error> {
        let url = format!("{}/reverse", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let parsed: ReverseResponse = response.json().await?;
        Ok(parsed.display_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_response_parses() {
        let json = r#"{"display_name": "Jl. Jend. Sudirman, Jakarta Pusat", "place_id": 42}"#;
        let parsed: ReverseResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.display_name, "Jl. Jend. Sudirman, Jakarta Pusat");
    }

    #[tokio::test]
    async fn test_lookup_falls_back_on_unreachable_host() {
        // Reserved TEST-NET address: connection fails fast, no real traffic.
        let geocoder =
            ReverseGeocoder::new("http://192.0.2.1:9", Duration::from_millis(200)).unwrap();
        let address = geocoder.lookup(-6.2, 106.8).await;
        assert_eq!(address, ADDRESS_UNAVAILABLE);
    }
}
