use serde::{Deserialize, Serialize};

/// Which side of a shift is being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClockAction {
    ClockIn,
    ClockOut,
}

impl ClockAction {
    /// Wire form used by the attendance API ("clock-in" / "clock-out").
    pub fn as_str(&self) -> &'static str {
        match self {
            ClockAction::ClockIn => "clock-in",
            ClockAction::ClockOut => "clock-out",
        }
    }
}

impl std::fmt::Display for ClockAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text fields burned into the captured photo.
///
/// Assembled immediately before compositing from the session identity, the
/// reverse-geocoded address, and the current timestamp. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkInput {
    pub name: String,
    pub date: String,
    pub location: String,
    pub coordinates: String,
    pub notes: Option<String>,
}

impl WatermarkInput {
    /// Overlay lines in top-to-bottom visual order. The name is uppercased
    /// at render time; the stored field keeps the session's casing.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            self.name.to_uppercase(),
            self.date.clone(),
            self.location.clone(),
            self.coordinates.clone(),
        ];
        if let Some(notes) = &self.notes {
            if !notes.is_empty() {
                lines.push(notes.clone());
            }
        }
        lines
    }
}

/// Format coordinates for display and watermarking ("-6.200000, 106.800000").
pub fn format_coordinates(latitude: f64, longitude: f64) -> String {
    format!("{latitude:.6}, {longitude:.6}")
}
