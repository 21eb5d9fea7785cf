use anyhow::Result;
use clap::{Parser, Subcommand};
use ocula_core::{CalibrationStore, FaceMesh};
use ocula_hw::Camera;
use std::path::PathBuf;

mod calibrate;
mod display;
mod tracker;

use display::Display;
use tracker::Tracker;

#[derive(Parser)]
#[command(name = "ocula", about = "Webcam eye-gaze estimation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct SessionArgs {
    /// Camera device index (/dev/video{N})
    #[arg(long, default_value_t = 0)]
    camera: u32,

    /// Path to the face-mesh ONNX model
    #[arg(long, default_value = "models/face_mesh.onnx")]
    model: String,

    /// Calibration file path
    #[arg(long, default_value = "calibration_data/calibration.json")]
    calibration_file: PathBuf,

    /// Target screen width in pixels
    #[arg(long, default_value_t = 1920)]
    screen_width: u32,

    /// Target screen height in pixels
    #[arg(long, default_value_t = 1080)]
    screen_height: u32,
}

#[derive(Subcommand)]
enum Commands {
    /// Live gaze tracking with overlay ('q' quits, 'c' recalibrates)
    Track {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Run the calibration walk and save the fitted parameters
    Calibrate {
        #[command(flatten)]
        session: SessionArgs,

        /// Number of fixation targets (9 = grid, 5 = cross)
        #[arg(long, default_value_t = 9)]
        points: usize,

        /// Gaze samples collected per target
        #[arg(long, default_value_t = 30)]
        samples: usize,
    },
    /// Log gaze positions to CSV ('q' quits)
    Log {
        #[command(flatten)]
        session: SessionArgs,

        /// Output CSV path (default: gaze_log_{timestamp}.csv)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List available camera devices
    Devices,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Track { session } => {
            let (camera, mut tracker, mut window) = open_session(&session)?;
            tracker::run_track(&camera, &mut tracker, &mut window)?;
        }
        Commands::Calibrate {
            session,
            points,
            samples,
        } => {
            let (camera, mut tracker, mut window) = open_session(&session)?;
            match calibrate::run_calibration(&camera, &mut tracker, &mut window, points, samples)? {
                Some(params) => tracker.set_calibration(params),
                None => println!("Calibration cancelled."),
            }
        }
        Commands::Log { session, output } => {
            let output = output.unwrap_or_else(|| {
                let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
                PathBuf::from(format!("gaze_log_{stamp}.csv"))
            });
            let (camera, mut tracker, mut window) = open_session(&session)?;
            tracker::run_log(&camera, &mut tracker, &mut window, &output)?;
        }
        Commands::Devices => {
            let devices = Camera::list_devices();
            if devices.is_empty() {
                println!("No capture devices found.");
            } else {
                println!("{:<6} | {:<12} | {:<30} | {}", "Index", "Path", "Name", "Driver");
                println!("{}", "-".repeat(70));
                for d in devices {
                    println!("{:<6} | {:<12} | {:<30} | {}", d.index, d.path, d.name, d.driver);
                }
            }
        }
    }

    Ok(())
}

/// Open the camera, load the model, and build the tracker and window.
/// Camera failure here aborts the session — the one fatal condition.
fn open_session(args: &SessionArgs) -> Result<(Camera, Tracker, Display)> {
    let camera = Camera::open(args.camera)?;
    let mesh = FaceMesh::load(&args.model)?;
    let store = CalibrationStore::new(&args.calibration_file);
    let tracker = Tracker::new(mesh, store, args.screen_width, args.screen_height);
    let window = Display::new("Ocula", camera.width as usize, camera.height as usize)?;
    Ok((camera, tracker, window))
}
