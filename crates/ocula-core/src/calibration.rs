//! Calibration data model and the offset+scale fit.
//!
//! The fit is deliberately first-order: a uniform offset and scale per axis,
//! no cross-axis terms. That is adequate because the fixation targets are
//! laid out symmetrically (3×3 grid or 5-point cross), and it keeps the
//! persisted format to four scalars.

use crate::types::GazeRatio;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// A fixation target paired with the gaze-ratio samples recorded while the
/// user looked at it. Targets are positioned as screen ratios in [0,1].
#[derive(Debug, Clone)]
pub struct CalibrationPoint {
    pub target_h: f32,
    pub target_v: f32,
    samples: Vec<GazeRatio>,
}

impl CalibrationPoint {
    pub fn new(target_h: f32, target_v: f32) -> Self {
        Self {
            target_h,
            target_v,
            samples: Vec::new(),
        }
    }

    /// Record one gaze measurement for this target.
    pub fn add_sample(&mut self, sample: GazeRatio) {
        self.samples.push(sample);
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Mean of all recorded samples; centered gaze when none were recorded.
    pub fn average_gaze(&self) -> GazeRatio {
        if self.samples.is_empty() {
            return GazeRatio::CENTER;
        }
        let n = self.samples.len() as f32;
        let (sum_h, sum_v) = self
            .samples
            .iter()
            .fold((0.0f32, 0.0f32), |(h, v), s| (h + s.h, v + s.v));
        GazeRatio::new(sum_h / n, sum_v / n)
    }
}

/// Fitted calibration constants, persisted as JSON.
///
/// `timestamp` is epoch seconds at fit time; `num_points` records how many
/// fixation targets produced the fit. Loaded parameters are treated as
/// immutable configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationParameters {
    pub h_offset: f32,
    pub v_offset: f32,
    pub h_scale: f32,
    pub v_scale: f32,
    pub num_points: usize,
    pub timestamp: f64,
}

impl CalibrationParameters {
    /// Fit offset and scale from a completed calibration walk.
    ///
    /// Offset is the difference between the gaze centroid and the target
    /// centroid. Scale is the ratio of target spread to gaze spread
    /// (population standard deviation), defaulting to 1.0 on any axis with
    /// zero gaze spread.
    pub fn fit(points: &[CalibrationPoint]) -> Self {
        let averages: Vec<GazeRatio> = points.iter().map(|p| p.average_gaze()).collect();
        let targets: Vec<(f32, f32)> = points.iter().map(|p| (p.target_h, p.target_v)).collect();

        let gaze_center_h = mean(averages.iter().map(|g| g.h));
        let gaze_center_v = mean(averages.iter().map(|g| g.v));
        let target_center_h = mean(targets.iter().map(|t| t.0));
        let target_center_v = mean(targets.iter().map(|t| t.1));

        let gaze_spread_h = std_dev(averages.iter().map(|g| g.h));
        let gaze_spread_v = std_dev(averages.iter().map(|g| g.v));
        let target_spread_h = std_dev(targets.iter().map(|t| t.0));
        let target_spread_v = std_dev(targets.iter().map(|t| t.1));

        let h_scale = if gaze_spread_h > 0.0 {
            target_spread_h / gaze_spread_h
        } else {
            1.0
        };
        let v_scale = if gaze_spread_v > 0.0 {
            target_spread_v / gaze_spread_v
        } else {
            1.0
        };

        let params = Self {
            h_offset: gaze_center_h - target_center_h,
            v_offset: gaze_center_v - target_center_v,
            h_scale,
            v_scale,
            num_points: points.len(),
            timestamp: epoch_seconds(),
        };

        tracing::info!(
            h_offset = params.h_offset,
            v_offset = params.v_offset,
            h_scale = params.h_scale,
            v_scale = params.v_scale,
            num_points = params.num_points,
            "calibration fitted"
        );

        params
    }

    /// Apply the calibration to a raw gaze ratio: subtract the offset,
    /// multiply by the scale, clamp to [0,1]. Lossy at the clamp edges.
    pub fn apply(&self, raw: GazeRatio) -> GazeRatio {
        GazeRatio::new(
            (raw.h - self.h_offset) * self.h_scale,
            (raw.v - self.v_offset) * self.v_scale,
        )
        .clamped()
    }
}

/// Fixation target layout as screen ratios.
///
/// 9 gives the 3×3 grid, 5 gives center + corners. Any other count falls
/// back to the 5-point cross.
pub fn target_positions(count: usize) -> Vec<(f32, f32)> {
    match count {
        9 => vec![
            (0.1, 0.1), (0.5, 0.1), (0.9, 0.1),
            (0.1, 0.5), (0.5, 0.5), (0.9, 0.5),
            (0.1, 0.9), (0.5, 0.9), (0.9, 0.9),
        ],
        _ => vec![
            (0.5, 0.5),
            (0.1, 0.1), (0.9, 0.1),
            (0.1, 0.9), (0.9, 0.9),
        ],
    }
}

fn mean(values: impl Iterator<Item = f32>) -> f32 {
    let (sum, n) = values.fold((0.0f32, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f32
    }
}

/// Population standard deviation.
fn std_dev(values: impl Iterator<Item = f32> + Clone) -> f32 {
    let m = mean(values.clone());
    let (sum_sq, n) = values.fold((0.0f32, 0usize), |(s, n), v| (s + (v - m) * (v - m), n + 1));
    if n == 0 {
        0.0
    } else {
        (sum_sq / n as f32).sqrt()
    }
}

fn epoch_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
