//! ocula-hw — Hardware abstraction for webcam capture.
//!
//! Provides V4L2-based camera access by integer device index and
//! YUYV-to-RGB frame conversion.

pub mod camera;
pub mod frame;

pub use camera::{Camera, CameraError, CameraStream, DeviceInfo};
pub use frame::Frame;
