use serde::{Deserialize, Serialize};

/// A 2D point in frame pixel space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Normalized iris position within the eye's bounding box.
///
/// Both axes live in [0,1]; 0.5 is the box center. Values are clamped at
/// computation time, so downstream code may rely on the range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazeRatio {
    /// Horizontal ratio: 0 = box left edge, 1 = right edge.
    pub h: f32,
    /// Vertical ratio: 0 = box top edge, 1 = bottom edge.
    pub v: f32,
}

impl GazeRatio {
    /// Centered gaze, used when the eye box is degenerate or no samples exist.
    pub const CENTER: GazeRatio = GazeRatio { h: 0.5, v: 0.5 };

    pub fn new(h: f32, v: f32) -> Self {
        Self { h, v }
    }

    /// Clamp both axes to [0,1].
    pub fn clamped(self) -> Self {
        Self {
            h: self.h.clamp(0.0, 1.0),
            v: self.v.clamp(0.0, 1.0),
        }
    }
}

/// Per-eye landmark subset for one frame: the iris center and the eye
/// boundary points, both in frame pixel space.
#[derive(Debug, Clone)]
pub struct EyeLandmarks {
    pub iris_center: Point2,
    pub boundary: Vec<Point2>,
}

/// An estimated on-screen position in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: u32,
    pub y: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaze_ratio_clamped_in_range() {
        let r = GazeRatio::new(0.3, 0.7).clamped();
        assert_eq!(r, GazeRatio::new(0.3, 0.7));
    }

    #[test]
    fn test_gaze_ratio_clamped_out_of_range() {
        let r = GazeRatio::new(-0.2, 1.4).clamped();
        assert_eq!(r, GazeRatio::new(0.0, 1.0));
    }

    #[test]
    fn test_center_is_half() {
        assert_eq!(GazeRatio::CENTER.h, 0.5);
        assert_eq!(GazeRatio::CENTER.v, 0.5);
    }
}
