//! Face-mesh landmark model via ONNX Runtime.
//!
//! Wraps a MediaPipe-style face-mesh model (468 face landmarks plus 10 iris
//! landmarks). The model does the hard work; this module only handles
//! letterbox preprocessing, the inference call, presence gating, and
//! mapping landmark coordinates back to frame pixel space.

use crate::types::{EyeLandmarks, Point2};
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

const MESH_INPUT_SIZE: usize = 192;
const MESH_NUM_LANDMARKS: usize = 478;
/// Minimum face-presence probability (after sigmoid) for a usable result.
const MESH_PRESENCE_THRESHOLD: f32 = 0.5;

/// Face-mesh landmark indices for the eye boundaries and irises
/// (MediaPipe face-mesh topology with iris refinement).
pub const LEFT_EYE: [usize; 8] = [33, 133, 160, 159, 158, 144, 145, 153];
pub const RIGHT_EYE: [usize; 8] = [362, 263, 387, 386, 385, 373, 374, 380];
pub const LEFT_IRIS: [usize; 5] = [468, 469, 470, 471, 472];
pub const RIGHT_IRIS: [usize; 5] = [473, 474, 475, 476, 477];

#[derive(Error, Debug)]
pub enum MeshError {
    #[error("model file not found: {0} — export the face-mesh model to ONNX and place it there")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// All landmarks detected in one frame, in frame pixel space.
#[derive(Debug, Clone)]
pub struct FaceLandmarks {
    pub points: Vec<Point2>,
    /// Face-presence probability reported by the model.
    pub score: f32,
}

impl FaceLandmarks {
    /// Extract the per-eye landmark subsets used for gaze estimation.
    ///
    /// The iris center is the mean of the five iris landmarks. Returns
    /// `None` when the landmark set is too small for the iris indices.
    pub fn eye_landmarks(&self) -> Option<(EyeLandmarks, EyeLandmarks)> {
        if self.points.len() < MESH_NUM_LANDMARKS {
            return None;
        }
        let left = EyeLandmarks {
            iris_center: centroid(&self.points, &LEFT_IRIS),
            boundary: LEFT_EYE.iter().map(|&i| self.points[i]).collect(),
        };
        let right = EyeLandmarks {
            iris_center: centroid(&self.points, &RIGHT_IRIS),
            boundary: RIGHT_EYE.iter().map(|&i| self.points[i]).collect(),
        };
        Some((left, right))
    }
}

fn centroid(points: &[Point2], indices: &[usize]) -> Point2 {
    let n = indices.len() as f32;
    let (sx, sy) = indices
        .iter()
        .fold((0.0f32, 0.0f32), |(sx, sy), &i| (sx + points[i].x, sy + points[i].y));
    Point2::new(sx / n, sy / n)
}

/// Metadata for coordinate de-mapping after letterbox resize.
struct LetterboxInfo {
    scale: f32,
    pad_x: f32,
    pad_y: f32,
}

/// Face-mesh landmark detector.
pub struct FaceMesh {
    session: Session,
    input_size: usize,
    num_outputs: usize,
}

impl FaceMesh {
    /// Load the face-mesh ONNX model from the given path.
    pub fn load(model_path: &str) -> Result<Self, MeshError> {
        if !Path::new(model_path).exists() {
            return Err(MeshError::ModelNotFound(model_path.to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        let output_names: Vec<String> =
            session.outputs().iter().map(|o| o.name().to_string()).collect();

        tracing::info!(
            path = model_path,
            inputs = ?session.inputs().iter().map(|i| (i.name(), i.dtype())).collect::<Vec<_>>(),
            outputs = ?output_names,
            "loaded face-mesh model"
        );

        if output_names.len() < 2 {
            return Err(MeshError::InferenceFailed(format!(
                "face-mesh model requires 2 outputs (landmarks, presence score), got {}",
                output_names.len()
            )));
        }

        Ok(Self {
            session,
            input_size: MESH_INPUT_SIZE,
            num_outputs: output_names.len(),
        })
    }

    /// Detect face landmarks in an RGB frame.
    ///
    /// Returns `Ok(None)` when no face is present (score below threshold) —
    /// an absent-result condition, not an error. Landmark coordinates are
    /// mapped back from the letterboxed model input to frame pixels.
    pub fn detect(
        &mut self,
        rgb: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Option<FaceLandmarks>, MeshError> {
        let expected = (width * height * 3) as usize;
        if rgb.len() < expected {
            return Err(MeshError::InferenceFailed(format!(
                "RGB buffer too short: expected {expected}, got {}",
                rgb.len()
            )));
        }

        let (input, letterbox) = self.preprocess(rgb, width as usize, height as usize);

        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        // Identify outputs by element count: the landmark tensor carries
        // 478 * 3 values, the presence score is a single value. Export
        // order varies between converters.
        let mut landmarks_raw: Option<&[f32]> = None;
        let mut score_raw: Option<f32> = None;

        for idx in 0..self.num_outputs {
            let (_, data) = outputs[idx].try_extract_tensor::<f32>().map_err(|e| {
                MeshError::InferenceFailed(format!("output {idx} extraction: {e}"))
            })?;
            if data.len() == MESH_NUM_LANDMARKS * 3 {
                landmarks_raw = Some(data);
            } else if data.len() == 1 {
                score_raw = Some(data[0]);
            }
        }

        let landmarks_raw = landmarks_raw.ok_or_else(|| {
            MeshError::InferenceFailed(format!(
                "no output with {} landmark values",
                MESH_NUM_LANDMARKS * 3
            ))
        })?;
        let score_logit = score_raw.ok_or_else(|| {
            MeshError::InferenceFailed("no scalar presence-score output".to_string())
        })?;

        let score = sigmoid(score_logit);
        if score < MESH_PRESENCE_THRESHOLD {
            tracing::debug!(score, "no face present in frame");
            return Ok(None);
        }

        // Landmarks are (x, y, z) triples in model-input pixel units.
        let points = landmarks_raw
            .chunks_exact(3)
            .map(|lm| {
                Point2::new(
                    (lm[0] - letterbox.pad_x) / letterbox.scale,
                    (lm[1] - letterbox.pad_y) / letterbox.scale,
                )
            })
            .collect();

        Ok(Some(FaceLandmarks { points, score }))
    }

    /// Preprocess an RGB frame into a normalized NCHW tensor with letterbox
    /// padding, using bilinear interpolation per channel.
    fn preprocess(&self, rgb: &[u8], width: usize, height: usize) -> (Array4<f32>, LetterboxInfo) {
        let size = self.input_size;
        let scale_w = size as f32 / width as f32;
        let scale_h = size as f32 / height as f32;
        let scale = scale_w.min(scale_h);

        let new_w = (width as f32 * scale).round() as usize;
        let new_h = (height as f32 * scale).round() as usize;
        let pad_x = ((size - new_w) as f32 / 2.0).floor();
        let pad_y = ((size - new_h) as f32 / 2.0).floor();

        let letterbox = LetterboxInfo { scale, pad_x, pad_y };
        let pad_x_start = pad_x as usize;
        let pad_y_start = pad_y as usize;

        let inv_scale = 1.0 / scale;
        let mut tensor = Array4::<f32>::zeros((1, 3, size, size));

        for y in 0..new_h {
            let src_y = (y as f32 + 0.5) * inv_scale - 0.5;
            let y0 = (src_y.floor() as i32).clamp(0, height as i32 - 1) as usize;
            let y1 = (y0 + 1).min(height - 1);
            let fy = (src_y - src_y.floor()).clamp(0.0, 1.0);

            for x in 0..new_w {
                let src_x = (x as f32 + 0.5) * inv_scale - 0.5;
                let x0 = (src_x.floor() as i32).clamp(0, width as i32 - 1) as usize;
                let x1 = (x0 + 1).min(width - 1);
                let fx = (src_x - src_x.floor()).clamp(0.0, 1.0);

                for c in 0..3 {
                    let tl = rgb[(y0 * width + x0) * 3 + c] as f32;
                    let tr = rgb[(y0 * width + x1) * 3 + c] as f32;
                    let bl = rgb[(y1 * width + x0) * 3 + c] as f32;
                    let br = rgb[(y1 * width + x1) * 3 + c] as f32;

                    let val = tl * (1.0 - fx) * (1.0 - fy)
                        + tr * fx * (1.0 - fy)
                        + bl * (1.0 - fx) * fy
                        + br * fx * fy;

                    // Model expects [0,1]; letterbox padding stays 0.
                    tensor[[0, c, y + pad_y_start, x + pad_x_start]] = val / 255.0;
                }
            }
        }

        (tensor, letterbox)
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_landmarks() -> FaceLandmarks {
        // Place every landmark on a grid so eye subsets are predictable.
        let points: Vec<Point2> = (0..MESH_NUM_LANDMARKS)
            .map(|i| Point2::new(i as f32, i as f32 * 2.0))
            .collect();
        FaceLandmarks { points, score: 0.99 }
    }

    #[test]
    fn test_eye_landmarks_subsets() {
        let lm = synthetic_landmarks();
        let (left, right) = lm.eye_landmarks().unwrap();

        assert_eq!(left.boundary.len(), LEFT_EYE.len());
        assert_eq!(right.boundary.len(), RIGHT_EYE.len());
        assert_eq!(left.boundary[0], Point2::new(33.0, 66.0));
        assert_eq!(right.boundary[0], Point2::new(362.0, 724.0));
    }

    #[test]
    fn test_iris_center_is_mean() {
        let lm = synthetic_landmarks();
        let (left, _) = lm.eye_landmarks().unwrap();
        // Mean of indices 468..=472 is 470.
        assert!((left.iris_center.x - 470.0).abs() < 1e-4);
        assert!((left.iris_center.y - 940.0).abs() < 1e-4);
    }

    #[test]
    fn test_eye_landmarks_too_few_points() {
        let lm = FaceLandmarks {
            points: vec![Point2::new(0.0, 0.0); 100],
            score: 0.9,
        };
        assert!(lm.eye_landmarks().is_none());
    }

    #[test]
    fn test_sigmoid_midpoint() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
    }

    #[test]
    fn test_letterbox_coordinate_roundtrip() {
        let width = 640.0f32;
        let height = 480.0f32;
        let size = MESH_INPUT_SIZE as f32;
        let scale = (size / width).min(size / height);
        let new_w = (width * scale).round();
        let new_h = (height * scale).round();
        let pad_x = ((size - new_w) / 2.0).floor();
        let pad_y = ((size - new_h) / 2.0).floor();

        let orig = (320.0f32, 240.0f32);
        let mapped_x = orig.0 * scale + pad_x;
        let mapped_y = orig.1 * scale + pad_y;

        let back_x = (mapped_x - pad_x) / scale;
        let back_y = (mapped_y - pad_y) / scale;
        assert!((back_x - orig.0).abs() < 0.1);
        assert!((back_y - orig.1).abs() < 0.1);
    }
}
