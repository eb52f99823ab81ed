use thiserror::Error;

pub type Result<T, E = FbrecError> = std::result::Result<T, E>;

/// Unified error type covering the recorder's failure taxonomy. Every
/// startup-phase variant is terminal: there is no retry policy anywhere.
#[derive(Debug, Error)]
pub enum FbrecError {
    #[error("argument error: {0}")]
    Argument(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("cannot open output file: {0}")]
    FileOpen(String),
    #[error("cannot open framebuffer device: {0}")]
    DeviceOpen(String),
    #[error("cannot query framebuffer device: {0}")]
    DeviceQuery(String),
    #[error("buffer allocation failed: {0}")]
    Allocation(String),
    #[error("h264 codec unavailable: {0}")]
    CodecUnavailable(String),
    #[error("cannot open h264 codec: {0}")]
    CodecOpen(String),
    #[error("capture error: {0}")]
    Capture(String),
    #[error("encode error: {0}")]
    Encode(String),
    #[error("signal setup error: {0}")]
    SignalSetup(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
