//! Frame type and pixel conversion — YUYV/GREY to RGB, luma, dark detection.

/// A captured RGB camera frame.
#[derive(Clone)]
pub struct Frame {
    /// Interleaved RGB pixel data (width * height * 3 bytes).
    pub rgb: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: std::time::Instant,
    pub sequence: u32,
    pub is_dark: bool,
}

impl Frame {
    /// Grayscale view of the frame for the face detector (BT.601 weights).
    pub fn luma(&self) -> Vec<u8> {
        rgb_to_luma(&self.rgb)
    }

    /// Average pixel brightness (0.0–255.0).
    pub fn avg_brightness(&self) -> f32 {
        let luma = self.luma();
        if luma.is_empty() {
            return 0.0;
        }
        luma.iter().map(|&b| b as f32).sum::<f32>() / luma.len() as f32
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("invalid buffer length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Convert packed YUYV (4:2:2) to interleaved RGB using BT.601 integer math.
///
/// YUYV packs two pixels per 4 bytes: [Y0, U, Y1, V]; U and V are shared by
/// the pixel pair.
pub fn yuyv_to_rgb(yuyv: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let expected = (width * height * 2) as usize;
    if yuyv.len() < expected {
        return Err(FrameError::InvalidLength { expected, actual: yuyv.len() });
    }

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for chunk in yuyv[..expected].chunks_exact(4) {
        let u = chunk[1] as i32 - 128;
        let v = chunk[3] as i32 - 128;
        for &y in [chunk[0], chunk[2]].iter() {
            let c = 298 * (y as i32 - 16);
            let r = (c + 409 * v + 128) >> 8;
            let g = (c - 100 * u - 208 * v + 128) >> 8;
            let b = (c + 516 * u + 128) >> 8;
            rgb.push(r.clamp(0, 255) as u8);
            rgb.push(g.clamp(0, 255) as u8);
            rgb.push(b.clamp(0, 255) as u8);
        }
    }
    Ok(rgb)
}

/// Extract the Y channel from packed YUYV (every even-indexed byte).
pub fn yuyv_luma(yuyv: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let expected = (width * height * 2) as usize;
    if yuyv.len() < expected {
        return Err(FrameError::InvalidLength { expected, actual: yuyv.len() });
    }
    Ok(yuyv[..expected].iter().step_by(2).copied().collect())
}

/// Replicate an 8-bit grayscale buffer into interleaved RGB.
pub fn gray_to_rgb(gray: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let expected = (width * height) as usize;
    if gray.len() < expected {
        return Err(FrameError::InvalidLength { expected, actual: gray.len() });
    }
    let mut rgb = Vec::with_capacity(expected * 3);
    for &y in &gray[..expected] {
        rgb.extend_from_slice(&[y, y, y]);
    }
    Ok(rgb)
}

/// Reduce interleaved RGB to 8-bit luma (BT.601: 0.299 R + 0.587 G + 0.114 B).
pub fn rgb_to_luma(rgb: &[u8]) -> Vec<u8> {
    rgb.chunks_exact(3)
        .map(|p| {
            let y = 77 * p[0] as u32 + 150 * p[1] as u32 + 29 * p[2] as u32;
            (y >> 8) as u8
        })
        .collect()
}

/// Check if a frame is dark: more than `threshold_pct` of luma pixels fall
/// in the darkest histogram bucket (0–31). Lens-covered or failed exposures
/// are filtered out of capture this way.
pub fn is_dark_frame(luma: &[u8], threshold_pct: f32) -> bool {
    if luma.is_empty() {
        return true;
    }
    let dark_count = luma.iter().filter(|&&p| p < 32).count();
    (dark_count as f32 / luma.len() as f32) > threshold_pct
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuyv_to_rgb_black_and_white() {
        // 2x1: pixel 0 at video black (Y=16), pixel 1 at video white (Y=235).
        let yuyv = vec![16, 128, 235, 128];
        let rgb = yuyv_to_rgb(&yuyv, 2, 1).unwrap();
        assert_eq!(rgb, vec![0, 0, 0, 255, 255, 255]);
    }

    #[test]
    fn test_yuyv_to_rgb_length() {
        let yuyv: Vec<u8> = vec![128; 16]; // 4x2 = 8 pixels
        let rgb = yuyv_to_rgb(&yuyv, 4, 2).unwrap();
        assert_eq!(rgb.len(), 8 * 3);
    }

    #[test]
    fn test_yuyv_to_rgb_invalid_length() {
        assert!(yuyv_to_rgb(&[100, 128], 2, 1).is_err());
    }

    #[test]
    fn test_yuyv_luma() {
        let yuyv = vec![100, 128, 200, 128];
        assert_eq!(yuyv_luma(&yuyv, 2, 1).unwrap(), vec![100, 200]);
    }

    #[test]
    fn test_gray_to_rgb() {
        let rgb = gray_to_rgb(&[7, 200], 2, 1).unwrap();
        assert_eq!(rgb, vec![7, 7, 7, 200, 200, 200]);
    }

    #[test]
    fn test_rgb_to_luma_extremes() {
        let luma = rgb_to_luma(&[255, 255, 255, 0, 0, 0]);
        assert_eq!(luma, vec![255, 0]);
    }

    #[test]
    fn test_rgb_to_luma_green_heaviest() {
        let luma = rgb_to_luma(&[0, 255, 0, 255, 0, 0, 0, 0, 255]);
        assert!(luma[0] > luma[1]);
        assert!(luma[1] > luma[2]);
    }

    #[test]
    fn test_dark_frame_all_black() {
        assert!(is_dark_frame(&vec![0u8; 1000], 0.95));
    }

    #[test]
    fn test_dark_frame_normal() {
        assert!(!is_dark_frame(&vec![128u8; 1000], 0.95));
    }

    #[test]
    fn test_dark_frame_empty() {
        assert!(is_dark_frame(&[], 0.95));
    }

    #[test]
    fn test_dark_frame_borderline() {
        // 96% dark → dark; 94% dark → not dark.
        let mut mostly = vec![10u8; 960];
        mostly.extend(vec![128u8; 40]);
        assert!(is_dark_frame(&mostly, 0.95));

        let mut borderline = vec![10u8; 940];
        borderline.extend(vec![128u8; 60]);
        assert!(!is_dark_frame(&borderline, 0.95));
    }

    #[test]
    fn test_frame_luma_and_brightness() {
        let frame = Frame {
            rgb: vec![128, 128, 128, 128, 128, 128],
            width: 2,
            height: 1,
            timestamp: std::time::Instant::now(),
            sequence: 0,
            is_dark: false,
        };
        let luma = frame.luma();
        assert_eq!(luma.len(), 2);
        assert!((frame.avg_brightness() - luma[0] as f32).abs() < 1.0);
    }
}
