//! ocula-core — Gaze estimation geometry and calibration.
//!
//! Computes normalized iris-within-eye-box ratios from face-mesh landmarks,
//! fits and applies an offset+scale calibration, and maps gaze ratios to
//! screen pixel coordinates. Landmark detection itself is delegated to a
//! MediaPipe-style face-mesh model running via ONNX Runtime.

pub mod calibration;
pub mod gaze;
pub mod mesh;
pub mod store;
pub mod types;

pub use calibration::{target_positions, CalibrationParameters, CalibrationPoint};
pub use gaze::{gaze_ratio, screen_position};
pub use mesh::{FaceLandmarks, FaceMesh};
pub use store::CalibrationStore;
pub use types::{EyeLandmarks, GazeRatio, Point2, ScreenPoint};
