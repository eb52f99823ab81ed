//! Shared domain types for the fbrec screen recorder.

pub mod colormap;
pub mod config;
pub mod frame;
pub mod geometry;
pub mod pixel;
pub mod sink;
pub mod telemetry;

mod errors;

pub use errors::{FbrecError, Result};
