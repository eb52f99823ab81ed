//! The recording control loop: pacing, sampling, encoding, clean shutdown.

pub mod ops;
pub mod pacing;
pub mod shutdown;

use std::time::Instant;

use chrono::Utc;
use fbrec_capture::FrameSource;
use fbrec_types::{
    frame::RgbFrame,
    sink::FrameSink,
    telemetry::{RecordingStats, TickSample},
    Result,
};
use tokio::time::sleep;
use tracing::{info, warn};

pub use pacing::Pacer;
pub use shutdown::{install_signal_handlers, ShutdownFlag};

/// Single-threaded capture and encode loop. Owns the one reused RGB frame and
/// drives the source and sink in lockstep, one sample per tick.
pub struct Recorder<S, K>
where
    S: FrameSource,
    K: FrameSink,
{
    source: S,
    sink: K,
    pacer: Pacer,
    flag: ShutdownFlag,
    frame: RgbFrame,
}

impl<S, K> Recorder<S, K>
where
    S: FrameSource,
    K: FrameSink,
{
    pub fn new(source: S, sink: K, pacer: Pacer, flag: ShutdownFlag) -> Result<Self> {
        let frame = RgbFrame::new(&source.geometry())?;
        Ok(Self {
            source,
            sink,
            pacer,
            flag,
            frame,
        })
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Run until a stop is requested. The flag is read once per iteration,
    /// immediately before the next tick, so a stop always lands at a tick
    /// boundary; the sink is drained and terminated before returning. Any
    /// sampling or encoding failure ends the run; there is no retry.
    pub async fn run(&mut self) -> Result<RecordingStats> {
        let mut stats = RecordingStats::default();
        let run_start = Instant::now();
        info!("recording at {:?} per tick", self.pacer.period());

        while self.flag.is_running() {
            let tick_start = Instant::now();
            self.source.sample_into(&mut self.frame).await?;
            let sampled = tick_start.elapsed();
            self.sink.submit(&self.frame)?;
            let total = tick_start.elapsed();

            stats.frames += 1;
            stats.last_tick = Some(TickSample {
                sample_ms: sampled.as_millis() as u64,
                encode_ms: total.saturating_sub(sampled).as_millis() as u64,
                total_ms: total.as_millis() as u64,
                captured_at: Utc::now(),
            });

            match self.pacer.remaining(total) {
                Some(rest) => sleep(rest).await,
                None => {
                    stats.overruns += 1;
                    warn!(
                        "tick {} took {total:?}, over the {:?} period",
                        stats.frames,
                        self.pacer.period()
                    );
                }
            }
        }

        self.sink.finish()?;
        stats.duration_ms = run_start.elapsed().as_millis() as u64;
        info!(
            "recording done: {} frames in {} ms, {} overruns",
            stats.frames, stats.duration_ms, stats.overruns
        );
        Ok(stats)
    }
}
