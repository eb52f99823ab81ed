use std::time::Duration;

/// Fixed-period pacing for the sampling loop.
///
/// Each iteration measures its wall time and sleeps whatever is left of the
/// nominal period. A tick that runs long yields no sleep at all (best-effort
/// rate, no catch-up, no frame dropping): the negative remainder case is
/// clamped explicitly rather than left to sleep-primitive behavior.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    period: Duration,
}

impl Pacer {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Sleep budget left after a tick that took `elapsed`; `None` marks an
    /// overrun.
    pub fn remaining(&self, elapsed: Duration) -> Option<Duration> {
        self.period.checked_sub(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remainder_is_clamped_at_the_period_boundary() {
        let pacer = Pacer::new(Duration::from_millis(40));
        assert_eq!(
            pacer.remaining(Duration::from_millis(15)),
            Some(Duration::from_millis(25))
        );
        assert_eq!(
            pacer.remaining(Duration::from_millis(40)),
            Some(Duration::ZERO)
        );
        assert_eq!(pacer.remaining(Duration::from_millis(41)), None);
    }
}
