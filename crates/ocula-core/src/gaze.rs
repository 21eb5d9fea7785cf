//! Gaze-ratio computation and screen-position mapping.
//!
//! Pure geometry: the iris center is located within the axis-aligned
//! bounding box of the eye boundary landmarks, producing a normalized
//! ratio per axis. Both eyes are averaged and optionally calibrated
//! before mapping to screen pixels.

use crate::calibration::CalibrationParameters;
use crate::types::{GazeRatio, Point2, ScreenPoint};

/// Compute the normalized iris position within the eye's bounding box.
///
/// The box is the axis-aligned extent of `boundary`. A box with zero width
/// or height (all landmarks collinear) yields the centered ratio rather
/// than a division by zero. Output is clamped to [0,1] per axis, so an
/// iris center slightly outside the box still produces a valid ratio.
pub fn gaze_ratio(iris_center: Point2, boundary: &[Point2]) -> GazeRatio {
    if boundary.is_empty() {
        return GazeRatio::CENTER;
    }

    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;

    for p in boundary {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    let width = max_x - min_x;
    let height = max_y - min_y;

    if width == 0.0 || height == 0.0 {
        return GazeRatio::CENTER;
    }

    GazeRatio::new(
        (iris_center.x - min_x) / width,
        (iris_center.y - min_y) / height,
    )
    .clamped()
}

/// Map left/right eye gaze ratios to a screen pixel position.
///
/// Both eyes are averaged per axis, calibration is applied when present,
/// then the horizontal axis is inverted: looking left displaces the iris
/// to the frame's right, so ratio and gaze direction are mirrored.
pub fn screen_position(
    left: GazeRatio,
    right: GazeRatio,
    calibration: Option<&CalibrationParameters>,
    screen_width: u32,
    screen_height: u32,
) -> ScreenPoint {
    let mut avg = GazeRatio::new((left.h + right.h) / 2.0, (left.v + right.v) / 2.0);

    if let Some(params) = calibration {
        avg = params.apply(avg);
    }

    ScreenPoint {
        x: ((1.0 - avg.h) * screen_width as f32) as u32,
        y: (avg.v * screen_height as f32) as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boundary_box(x0: f32, y0: f32, x1: f32, y1: f32) -> Vec<Point2> {
        vec![
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ]
    }

    #[test]
    fn test_center_of_box_is_half() {
        let boundary = boundary_box(100.0, 50.0, 140.0, 70.0);
        let ratio = gaze_ratio(Point2::new(120.0, 60.0), &boundary);
        assert!((ratio.h - 0.5).abs() < 1e-6);
        assert!((ratio.v - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_iris_inside_box_stays_in_range() {
        let boundary = boundary_box(10.0, 20.0, 50.0, 36.0);
        for &(x, y) in &[(10.0, 20.0), (50.0, 36.0), (12.5, 33.0), (47.0, 21.0)] {
            let ratio = gaze_ratio(Point2::new(x, y), &boundary);
            assert!((0.0..=1.0).contains(&ratio.h), "h out of range: {}", ratio.h);
            assert!((0.0..=1.0).contains(&ratio.v), "v out of range: {}", ratio.v);
        }
    }

    #[test]
    fn test_iris_at_box_min_is_zero() {
        let boundary = boundary_box(10.0, 20.0, 50.0, 40.0);
        let ratio = gaze_ratio(Point2::new(10.0, 20.0), &boundary);
        assert_eq!(ratio, GazeRatio::new(0.0, 0.0));
    }

    #[test]
    fn test_degenerate_box_zero_width() {
        let boundary = vec![Point2::new(30.0, 10.0), Point2::new(30.0, 25.0)];
        assert_eq!(gaze_ratio(Point2::new(30.0, 15.0), &boundary), GazeRatio::CENTER);
    }

    #[test]
    fn test_degenerate_box_zero_height() {
        let boundary = vec![Point2::new(10.0, 40.0), Point2::new(35.0, 40.0)];
        assert_eq!(gaze_ratio(Point2::new(20.0, 40.0), &boundary), GazeRatio::CENTER);
    }

    #[test]
    fn test_empty_boundary() {
        assert_eq!(gaze_ratio(Point2::new(1.0, 2.0), &[]), GazeRatio::CENTER);
    }

    #[test]
    fn test_iris_outside_box_clamps() {
        let boundary = boundary_box(10.0, 10.0, 20.0, 20.0);
        let ratio = gaze_ratio(Point2::new(25.0, 5.0), &boundary);
        assert_eq!(ratio, GazeRatio::new(1.0, 0.0));
    }

    #[test]
    fn test_screen_position_center() {
        let pos = screen_position(GazeRatio::CENTER, GazeRatio::CENTER, None, 1920, 1080);
        assert_eq!(pos, ScreenPoint { x: 960, y: 540 });
    }

    #[test]
    fn test_screen_position_horizontal_inversion() {
        // Iris toward the frame's right (h near 1) means the user looks left.
        let right_of_box = GazeRatio::new(1.0, 0.5);
        let pos = screen_position(right_of_box, right_of_box, None, 1920, 1080);
        assert_eq!(pos.x, 0);

        let left_of_box = GazeRatio::new(0.0, 0.5);
        let pos = screen_position(left_of_box, left_of_box, None, 1920, 1080);
        assert_eq!(pos.x, 1920);
    }

    #[test]
    fn test_screen_position_averages_eyes() {
        let left = GazeRatio::new(0.4, 0.2);
        let right = GazeRatio::new(0.6, 0.4);
        let pos = screen_position(left, right, None, 1000, 1000);
        // avg = (0.5, 0.3) -> x = (1 - 0.5) * 1000, y = 0.3 * 1000
        assert_eq!(pos, ScreenPoint { x: 500, y: 300 });
    }

    #[test]
    fn test_screen_position_vertical_direct() {
        let down = GazeRatio::new(0.5, 1.0);
        let pos = screen_position(down, down, None, 800, 600);
        assert_eq!(pos.y, 600);
    }
}
