//! Camera Bubble - a circular always-on-top webcam overlay
//!
//! Captures webcam frames, runs them through a CPU pipeline (mirror, biased
//! square crop, optional skin smoothing, circular alpha mask) and presents
//! the result in a small frameless window that floats above everything else.

pub mod app;
pub mod camera;
pub mod frame;
pub mod pipeline;
pub mod ticker;

pub use app::App;
