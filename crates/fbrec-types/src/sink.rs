use crate::{frame::RgbFrame, Result};

/// Consumes one RGB frame per tick and appends the resulting compressed
/// packets to the output in emission order.
pub trait FrameSink {
    fn submit(&mut self, frame: &RgbFrame) -> Result<()>;

    /// Drain the codec and terminate the stream. Called exactly once after
    /// the sampling loop exits.
    fn finish(&mut self) -> Result<()>;
}
