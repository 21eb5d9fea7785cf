//! Per-frame gaze pipeline and the interactive loops.
//!
//! `Tracker` composes the face-mesh wrapper, the calibration store, and the
//! screen geometry; frames flow in, gaze ratios and screen positions flow
//! out. The camera and window are passed to the loop functions rather than
//! owned here, so calibration can borrow the same devices.

use crate::calibrate::run_calibration;
use crate::display::{self, Display, GREEN, RED, WHITE};
use anyhow::{Context, Result};
use minifb::Key;
use ocula_core::{
    gaze_ratio, screen_position, CalibrationParameters, CalibrationStore, FaceMesh, GazeRatio,
    ScreenPoint,
};
use ocula_hw::{Camera, Frame};
use std::io::Write;
use std::time::Instant;

/// Gaze estimator state for one session.
pub struct Tracker {
    mesh: FaceMesh,
    store: CalibrationStore,
    calibration: Option<CalibrationParameters>,
    screen_width: u32,
    screen_height: u32,
}

impl Tracker {
    /// Build a tracker; loads persisted calibration if present (a missing
    /// or corrupt file just means running uncalibrated).
    pub fn new(
        mesh: FaceMesh,
        store: CalibrationStore,
        screen_width: u32,
        screen_height: u32,
    ) -> Self {
        let calibration = store.load();
        if calibration.is_none() {
            tracing::info!("no calibration loaded; tracking uncalibrated");
        }
        Self {
            mesh,
            store,
            calibration,
            screen_width,
            screen_height,
        }
    }

    /// Install freshly fitted parameters for this session and persist them.
    /// A write failure is logged; the in-memory calibration still applies.
    pub fn set_calibration(&mut self, params: CalibrationParameters) {
        if let Err(e) = self.store.save(&params) {
            tracing::warn!(error = %e, "calibration save failed; keeping in-memory parameters");
        }
        self.calibration = Some(params);
    }

    /// Averaged, uncalibrated gaze ratio for one frame, or `None` when no
    /// face (or no usable eye landmarks) is present.
    pub fn raw_gaze(&mut self, frame: &Frame) -> Result<Option<GazeRatio>> {
        let Some(landmarks) = self
            .mesh
            .detect(&frame.data, frame.width, frame.height)
            .context("face-mesh inference failed")?
        else {
            return Ok(None);
        };
        let Some((left, right)) = landmarks.eye_landmarks() else {
            return Ok(None);
        };

        let lg = gaze_ratio(left.iris_center, &left.boundary);
        let rg = gaze_ratio(right.iris_center, &right.boundary);
        Ok(Some(GazeRatio::new((lg.h + rg.h) / 2.0, (lg.v + rg.v) / 2.0)))
    }

    /// Full pipeline for one frame: detect, compute ratios, map to screen,
    /// and draw the overlay onto the frame. `None` when no face was found
    /// (the frame is skipped, not an error).
    pub fn process_frame(&mut self, frame: &mut Frame) -> Result<Option<ScreenPoint>> {
        let Some(landmarks) = self
            .mesh
            .detect(&frame.data, frame.width, frame.height)
            .context("face-mesh inference failed")?
        else {
            return Ok(None);
        };
        let Some((left, right)) = landmarks.eye_landmarks() else {
            return Ok(None);
        };

        let left_gaze = gaze_ratio(left.iris_center, &left.boundary);
        let right_gaze = gaze_ratio(right.iris_center, &right.boundary);
        let position = screen_position(
            left_gaze,
            right_gaze,
            self.calibration.as_ref(),
            self.screen_width,
            self.screen_height,
        );

        let w = frame.width as usize;
        let h = frame.height as usize;
        for eye in [&left, &right] {
            let pts: Vec<(i32, i32)> = eye
                .boundary
                .iter()
                .map(|p| (p.x as i32, p.y as i32))
                .collect();
            display::draw_polyline(&mut frame.data, w, h, &pts, GREEN);
            display::fill_circle(
                &mut frame.data,
                w,
                h,
                eye.iris_center.x as i32,
                eye.iris_center.y as i32,
                3,
                RED,
            );
        }

        // Miniature gaze marker: the estimated screen position scaled into
        // the frame, so the user sees where the estimate lands.
        let marker_x = (position.x as f32 / self.screen_width as f32 * w as f32) as i32;
        let marker_y = (position.y as f32 / self.screen_height as f32 * h as f32) as i32;
        display::draw_circle(&mut frame.data, w, h, marker_x, marker_y, 8, WHITE);

        Ok(Some(position))
    }
}

/// Live tracking loop: Q or closing the window quits, C re-runs the
/// calibration walk and resumes tracking.
pub fn run_track(camera: &Camera, tracker: &mut Tracker, window: &mut Display) -> Result<()> {
    println!("Eye tracker running. Press 'q' to quit, 'c' to calibrate.");

    'session: loop {
        let mut stream = camera.stream().context("failed to start capture stream")?;

        while window.is_open() {
            let mut frame = stream.next_frame().context("frame capture failed")?;

            match tracker.process_frame(&mut frame) {
                Ok(Some(pos)) => {
                    tracing::debug!(x = pos.x, y = pos.y, seq = frame.sequence, "gaze");
                }
                Ok(None) => {
                    tracing::debug!(seq = frame.sequence, "no face in frame");
                }
                Err(e) => return Err(e),
            }

            window.present(&frame.data)?;

            if window.key_pressed(Key::Q) {
                break 'session;
            }
            if window.key_pressed(Key::C) {
                // Release the stream so the calibration walk can capture.
                drop(stream);
                match run_calibration(camera, tracker, window, 9, 30)? {
                    Some(params) => tracker.set_calibration(params),
                    None => println!("Calibration cancelled."),
                }
                continue 'session;
            }
        }
        break;
    }

    Ok(())
}

/// Gaze logging loop: writes one CSV row per frame with a detected face.
/// Header `timestamp,gaze_x,gaze_y`; timestamps are seconds since logging
/// start with millisecond precision.
pub fn run_log(
    camera: &Camera,
    tracker: &mut Tracker,
    window: &mut Display,
    output: &std::path::Path,
) -> Result<()> {
    let mut file = std::fs::File::create(output)
        .with_context(|| format!("failed to create log file {}", output.display()))?;
    writeln!(file, "timestamp,gaze_x,gaze_y")?;

    println!("Logging gaze data to: {}", output.display());
    println!("Press 'q' to quit and save the log.");

    let mut stream = camera.stream().context("failed to start capture stream")?;
    let start = Instant::now();
    let mut rows = 0usize;

    while window.is_open() {
        let mut frame = stream.next_frame().context("frame capture failed")?;

        if let Some(pos) = tracker.process_frame(&mut frame)? {
            let elapsed = start.elapsed().as_secs_f64();
            writeln!(file, "{elapsed:.3},{},{}", pos.x, pos.y)?;
            rows += 1;
        }

        window.present(&frame.data)?;

        if window.key_pressed(Key::Q) {
            break;
        }
    }

    println!("Logged {rows} gaze samples to {}", output.display());
    Ok(())
}
