//! H.264 encoding pipeline over libavcodec (`ffmpeg-next`).

pub mod session;
pub mod writer;

pub use session::{EncoderSession, EncoderSettings};
pub use writer::BitstreamWriter;

pub use fbrec_types::sink::FrameSink;

use fbrec_types::FbrecError;

/// Generate an error aligned with encode semantics.
pub fn encode_error(message: impl Into<String>) -> FbrecError {
    FbrecError::Encode(message.into())
}
