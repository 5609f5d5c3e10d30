//! punch-hw — Hardware abstraction for the attendance terminal.
//!
//! Provides V4L2-based camera access, frame pixel conversion, and the
//! location providers (fixed site coordinates or GeoClue2 over D-Bus).

pub mod camera;
pub mod frame;
pub mod location;

pub use camera::{Camera, CameraError, PixelFormat};
pub use frame::Frame;
pub use location::{GeoclueLocation, LocationError, LocationProvider, Position, StaticLocation};
