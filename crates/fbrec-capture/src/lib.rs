//! Framebuffer capture layer: device access, pixel conversion, frame sources.

pub mod convert;
pub mod device;
pub mod source;

pub use device::{FramebufferDevice, MappedRegion};
pub use source::{FrameSource, FramebufferSource, SyntheticSource};

use fbrec_types::FbrecError;

/// Generate an error aligned with capture semantics.
pub fn capture_error(message: impl Into<String>) -> FbrecError {
    FbrecError::Capture(message.into())
}
