//! punch-api — Remote collaborators of the attendance terminal.
//!
//! The attendance REST client (multipart photo upload) and the best-effort
//! reverse geocoder. Neither owns any business rules: geofence distance and
//! lateness are computed server-side and returned verbatim.

pub mod client;
pub mod geocode;
pub mod types;

pub use client::{ApiError, AttendanceClient};
pub use geocode::{ReverseGeocoder, ADDRESS_UNAVAILABLE};
pub use types::{ClockData, ClockRequest, ClockResponse, LocationCheck};
