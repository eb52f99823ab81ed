use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wall-clock timing of a single sampling tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickSample {
    pub sample_ms: u64,
    pub encode_ms: u64,
    pub total_ms: u64,
    pub captured_at: DateTime<Utc>,
}

/// Summary of one recording run, logged when the loop exits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordingStats {
    pub frames: u64,
    /// Ticks whose work exceeded the nominal period (sleep clamped to zero).
    pub overruns: u64,
    pub duration_ms: u64,
    pub last_tick: Option<TickSample>,
}
