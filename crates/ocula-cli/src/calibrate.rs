//! Interactive calibration walk.
//!
//! Steps the user through the fixation targets, records gaze-ratio samples
//! per target, and fits the offset+scale parameters. A plain function over
//! its collaborators — the tracking loop calls it directly on keypress and
//! resumes afterwards.

use crate::display::{self, Display, GRAY, GREEN, WHITE};
use crate::tracker::Tracker;
use anyhow::{Context, Result};
use minifb::Key;
use ocula_core::{target_positions, CalibrationParameters, CalibrationPoint};
use std::time::{Duration, Instant};

const COUNTDOWN_SECS: u64 = 3;
const TARGET_RADIUS: i32 = 30;

/// Run the calibration walk.
///
/// Returns `Ok(None)` when the user cancels (ESC or window close);
/// otherwise the fitted parameters. The caller decides whether to persist
/// them.
pub fn run_calibration(
    camera: &ocula_hw::Camera,
    tracker: &mut Tracker,
    window: &mut Display,
    num_points: usize,
    samples_per_point: usize,
) -> Result<Option<CalibrationParameters>> {
    println!("\n=== Eye Tracker Calibration ===");
    println!("Look at each green circle as it appears and keep your gaze steady.");
    println!("Press SPACE to start calibration, ESC to cancel.\n");

    let w = window.width();
    let h = window.height();

    // Wait screen: hollow target in the center until SPACE.
    loop {
        if !window.is_open() || window.key_pressed(Key::Escape) {
            return Ok(None);
        }
        if window.key_pressed(Key::Space) {
            break;
        }
        let mut canvas = display::blank_canvas(w, h);
        display::draw_circle(&mut canvas, w, h, (w / 2) as i32, (h / 2) as i32, TARGET_RADIUS, GRAY);
        window.present(&canvas)?;
    }

    let mut points: Vec<CalibrationPoint> = target_positions(num_points)
        .into_iter()
        .map(|(x, y)| CalibrationPoint::new(x, y))
        .collect();
    let total = points.len();

    let mut stream = camera.stream().context("failed to start capture stream")?;

    for (idx, point) in points.iter_mut().enumerate() {
        println!("Calibration point {}/{}", idx + 1, total);

        let target_x = (point.target_h * w as f32) as i32;
        let target_y = (point.target_v * h as f32) as i32;

        // Countdown: hollow target so the user can settle their gaze.
        let countdown_end = Instant::now() + Duration::from_secs(COUNTDOWN_SECS);
        while Instant::now() < countdown_end {
            if !window.is_open() || window.key_pressed(Key::Escape) {
                return Ok(None);
            }
            let mut canvas = display::blank_canvas(w, h);
            display::draw_circle(&mut canvas, w, h, target_x, target_y, TARGET_RADIUS, GREEN);
            display::fill_circle(&mut canvas, w, h, target_x, target_y, 5, GREEN);
            window.present(&canvas)?;
        }

        // Sampling: filled target plus progress bar. Frames without a
        // detected face are skipped and do not count.
        while point.sample_count() < samples_per_point {
            if !window.is_open() || window.key_pressed(Key::Escape) {
                return Ok(None);
            }

            let frame = stream.next_frame().context("frame capture failed")?;
            if let Some(sample) = tracker.raw_gaze(&frame)? {
                point.add_sample(sample);
            }

            let mut canvas = display::blank_canvas(w, h);
            display::fill_circle(&mut canvas, w, h, target_x, target_y, TARGET_RADIUS, GREEN);
            display::fill_circle(&mut canvas, w, h, target_x, target_y, 5, WHITE);
            draw_progress(&mut canvas, w, h, point.sample_count(), samples_per_point);
            window.present(&canvas)?;
        }

        println!("  Collected {} samples", point.sample_count());
    }
    drop(stream);

    let params = CalibrationParameters::fit(&points);

    println!("\nCalibration parameters:");
    println!(
        "  Horizontal offset: {:.4}, scale: {:.4}",
        params.h_offset, params.h_scale
    );
    println!(
        "  Vertical offset: {:.4}, scale: {:.4}",
        params.v_offset, params.v_scale
    );

    // Completion screen: full-width bar for a couple of seconds.
    let done_end = Instant::now() + Duration::from_secs(2);
    while Instant::now() < done_end && window.is_open() {
        let mut canvas = display::blank_canvas(w, h);
        draw_progress(&mut canvas, w, h, 1, 1);
        display::draw_circle(&mut canvas, w, h, (w / 2) as i32, (h / 2) as i32, TARGET_RADIUS, GREEN);
        window.present(&canvas)?;
    }
    println!("Calibration complete.");

    Ok(Some(params))
}

/// Horizontal progress bar near the bottom of the canvas.
fn draw_progress(canvas: &mut [u8], w: usize, h: usize, done: usize, total: usize) {
    let bar_width = 300.min(w as i32 - 40);
    let bar_x = (w as i32 - bar_width) / 2;
    let bar_y = h as i32 - 100;
    let progress = if total == 0 {
        0.0
    } else {
        done as f32 / total as f32
    };

    display::draw_rect(canvas, w, h, bar_x, bar_y, bar_width, 30, GRAY);
    display::fill_rect(
        canvas,
        w,
        h,
        bar_x,
        bar_y,
        (bar_width as f32 * progress) as i32,
        30,
        GREEN,
    );
}
