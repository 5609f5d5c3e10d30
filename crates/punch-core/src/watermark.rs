//! Watermark compositor — resize, text overlay, JPEG re-encode.
//!
//! Burns the attendance metadata (name, timestamp, address, coordinates,
//! optional notes) into the captured photo before upload. Layout geometry is
//! deterministic for identical inputs; only the JPEG byte stream may differ
//! between encoder versions.

use ab_glyph::{FontVec, PxScale};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, Rgb};
use imageproc::drawing::draw_text_mut;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Photos wider than this are downscaled proportionally before overlay.
pub const MAX_WIDTH: u32 = 1080;
/// JPEG re-encode quality (matches the original 0.7 upload quality).
pub const JPEG_QUALITY: u8 = 70;
/// Bottom-left anchor padding as a fraction of image width.
pub const PADDING_RATIO: f32 = 0.04;
/// Base font size as a fraction of image width.
pub const FONT_RATIO: f32 = 0.03;
/// Line height as a multiple of the base font size.
pub const LINE_SPACING: f32 = 1.5;

#[derive(Error, Debug)]
pub enum WatermarkError {
    #[error("font file not found or unreadable: {0}")]
    FontUnavailable(String),
    #[error("font data is not a valid font")]
    InvalidFont,
    #[error("input photo has zero width or height")]
    EmptyImage,
    #[error("jpeg encoding failed: {0}")]
    Encoding(#[from] image::ImageError),
    #[error("jpeg encoder produced no data")]
    EmptyOutput,
}

/// Downscale rule: width capped at [`MAX_WIDTH`], aspect ratio preserved.
///
/// `height' = round(height * MAX_WIDTH / width)`. Images at or below the cap
/// keep their dimensions.
pub fn scaled_dimensions(width: u32, height: u32) -> (u32, u32) {
    if width <= MAX_WIDTH {
        return (width, height);
    }
    let scaled_h = (height as f64 * MAX_WIDTH as f64 / width as f64).round() as u32;
    (MAX_WIDTH, scaled_h)
}

/// Text layout derived from the (scaled) image width.
///
/// Lines are anchored bottom-left: the bottom-most line originates at
/// `(padding, height - padding - line_height)` and earlier lines stack
/// upward one `line_height` apart.
#[derive(Debug, Clone, Copy)]
pub struct WatermarkLayout {
    pub padding: f32,
    pub font_size: f32,
    pub line_height: f32,
}

impl WatermarkLayout {
    pub fn for_width(width: u32) -> Self {
        let font_size = width as f32 * FONT_RATIO;
        Self {
            padding: width as f32 * PADDING_RATIO,
            font_size,
            line_height: font_size * LINE_SPACING,
        }
    }

    /// Origin of the line `index_from_bottom` lines above the bottom anchor.
    pub fn line_origin(&self, height: u32, index_from_bottom: usize) -> (f32, f32) {
        let y = height as f32 - self.padding - self.line_height * (index_from_bottom as f32 + 1.0);
        (self.padding, y)
    }
}

/// Composes watermarked attendance photos.
#[derive(Debug)]
pub struct Compositor {
    font: FontVec,
}

impl Compositor {
    /// Build a compositor from raw TTF/OTF bytes.
    pub fn from_font_bytes(bytes: Vec<u8>) -> Result<Self, WatermarkError> {
        let font = FontVec::try_from_vec(bytes).map_err(|_| WatermarkError::InvalidFont)?;
        Ok(Self { font })
    }

    /// Build a compositor from a font file on disk.
    pub fn from_font_file(path: &Path) -> Result<Self, WatermarkError> {
        let bytes = std::fs::read(path)
            .map_err(|e| WatermarkError::FontUnavailable(format!("{}: {e}", path.display())))?;
        Self::from_font_bytes(bytes)
    }

    /// Resize, overlay the watermark text, and re-encode as JPEG.
    pub fn compose(
        &self,
        photo: &DynamicImage,
        input: &crate::types::WatermarkInput,
    ) -> Result<Vec<u8>, WatermarkError> {
        let (width, height) = (photo.width(), photo.height());
        if width == 0 || height == 0 {
            return Err(WatermarkError::EmptyImage);
        }

        let (scaled_w, scaled_h) = scaled_dimensions(width, height);
        let mut canvas = if (scaled_w, scaled_h) != (width, height) {
            photo.resize_exact(scaled_w, scaled_h, FilterType::Triangle).to_rgb8()
        } else {
            photo.to_rgb8()
        };

        let layout = WatermarkLayout::for_width(scaled_w);
        let scale = PxScale::from(layout.font_size);
        let shadow = (layout.font_size / 16.0).max(1.0).round() as i32;

        let lines = input.lines();
        for (i, line) in lines.iter().rev().enumerate() {
            let (x, y) = layout.line_origin(scaled_h, i);
            let (x, y) = (x.round() as i32, y.round() as i32);
            // Dark offset pass first so the white text stays legible on
            // bright backgrounds.
            draw_text_mut(&mut canvas, Rgb([0u8, 0, 0]), x + shadow, y + shadow, scale, &self.font, line);
            draw_text_mut(&mut canvas, Rgb([255u8, 255, 255]), x, y, scale, &self.font, line);
        }

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY).encode_image(&canvas)?;
        if jpeg.is_empty() {
            return Err(WatermarkError::EmptyOutput);
        }

        tracing::debug!(
            width = scaled_w,
            height = scaled_h,
            bytes = jpeg.len(),
            lines = lines.len(),
            "composed watermarked photo"
        );

        Ok(jpeg)
    }
}

/// Locate a usable system font for the overlay.
///
/// Checked in order; deployments with nonstandard font locations set
/// `PUNCH_FONT_PATH` instead.
pub fn find_system_font() -> Option<PathBuf> {
    const CANDIDATES: [&str; 4] = [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    ];
    CANDIDATES.iter().map(PathBuf::from).find(|p| p.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WatermarkInput;
    use image::RgbImage;

    #[test]
    fn test_scaled_dimensions_downscales_wide() {
        assert_eq!(scaled_dimensions(2000, 1500), (1080, 810));
        assert_eq!(scaled_dimensions(1500, 1000), (1080, 720));
    }

    #[test]
    fn test_scaled_dimensions_rounds_height() {
        // 1081 * 1080 / 1921 = 607.65... → 608
        assert_eq!(scaled_dimensions(1921, 1081), (1080, 608));
    }

    #[test]
    fn test_scaled_dimensions_at_cap_unchanged() {
        assert_eq!(scaled_dimensions(1080, 720), (1080, 720));
    }

    #[test]
    fn test_scaled_dimensions_below_cap_unchanged() {
        assert_eq!(scaled_dimensions(640, 480), (640, 480));
    }

    #[test]
    fn test_layout_ratios() {
        let layout = WatermarkLayout::for_width(1080);
        assert!((layout.padding - 43.2).abs() < 1e-3);
        assert!((layout.font_size - 32.4).abs() < 1e-3);
        assert!((layout.line_height - 48.6).abs() < 1e-3);
    }

    #[test]
    fn test_bottom_line_anchor() {
        // 2000x1500 input → 1080x810 canvas; bottom line at
        // (padding, 810 - padding - line_height).
        let (w, h) = scaled_dimensions(2000, 1500);
        let layout = WatermarkLayout::for_width(w);
        let (x, y) = layout.line_origin(h, 0);
        assert!((x - layout.padding).abs() < 1e-3);
        assert!((y - (810.0 - layout.padding - layout.line_height)).abs() < 1e-3);
    }

    #[test]
    fn test_lines_stack_upward() {
        let layout = WatermarkLayout::for_width(1080);
        let (_, y0) = layout.line_origin(810, 0);
        let (_, y1) = layout.line_origin(810, 1);
        assert!((y0 - y1 - layout.line_height).abs() < 1e-3);
    }

    #[test]
    fn test_invalid_font_rejected() {
        let err = Compositor::from_font_bytes(vec![0u8; 16]).unwrap_err();
        assert!(matches!(err, WatermarkError::InvalidFont));
    }

    fn test_compositor() -> Option<Compositor> {
        // Glyph rendering needs a real font; skip on hosts without one.
        let path = find_system_font()?;
        Compositor::from_font_file(&path).ok()
    }

    fn sample_input() -> WatermarkInput {
        WatermarkInput {
            name: "Jane Doe".into(),
            date: "2026-08-29 08:55:03".into(),
            location: "Jl. Sudirman 1, Jakarta".into(),
            coordinates: "-6.200000, 106.800000".into(),
            notes: None,
        }
    }

    #[test]
    fn test_compose_downscales_to_cap() {
        let Some(compositor) = test_compositor() else { return };
        let photo = DynamicImage::ImageRgb8(RgbImage::from_fn(2000, 1500, |x, _| {
            Rgb([(x % 256) as u8, 80, 120])
        }));

        let jpeg = compositor.compose(&photo, &sample_input()).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1080, 810));
    }

    #[test]
    fn test_compose_keeps_small_dimensions() {
        let Some(compositor) = test_compositor() else { return };
        let photo = DynamicImage::ImageRgb8(RgbImage::from_pixel(800, 600, Rgb([90, 90, 90])));

        let jpeg = compositor.compose(&photo, &sample_input()).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (800, 600));
    }

    #[test]
    fn test_compose_rejects_empty_image() {
        let Some(compositor) = test_compositor() else { return };
        let photo = DynamicImage::new_rgb8(0, 0);
        let err = compositor.compose(&photo, &sample_input()).unwrap_err();
        assert!(matches!(err, WatermarkError::EmptyImage));
    }
}
