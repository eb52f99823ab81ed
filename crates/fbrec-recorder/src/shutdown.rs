use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use fbrec_types::{FbrecError, Result};
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

/// Cooperative stop flag: written by the signal watchers, polled once per
/// loop iteration at the tick boundary. The watchers touch nothing else:
/// no device, no encoder, no output file.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        !self.0.load(Ordering::Relaxed)
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Install SIGINT and SIGTERM watchers that flip `flag` and nothing more.
/// Registration failure is fatal at startup: without the watchers there is
/// no clean way to drain the encoder and terminate the bitstream.
pub fn install_signal_handlers(flag: &ShutdownFlag) -> Result<()> {
    let mut interrupt = signal(SignalKind::interrupt())
        .map_err(|err| FbrecError::SignalSetup(format!("SIGINT handler: {err}")))?;
    let mut terminate = signal(SignalKind::terminate())
        .map_err(|err| FbrecError::SignalSetup(format!("SIGTERM handler: {err}")))?;

    let interrupt_flag = flag.clone();
    tokio::spawn(async move {
        if interrupt.recv().await.is_some() {
            info!("interrupt received; stopping after the current tick");
            interrupt_flag.request_stop();
        }
    });
    let terminate_flag = flag.clone();
    tokio::spawn(async move {
        if terminate.recv().await.is_some() {
            info!("termination requested; stopping after the current tick");
            terminate_flag.request_stop();
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_starts_running_and_latches_the_stop() {
        let flag = ShutdownFlag::new();
        assert!(flag.is_running());
        let watcher_side = flag.clone();
        watcher_side.request_stop();
        assert!(!flag.is_running());
        watcher_side.request_stop();
        assert!(!flag.is_running());
    }

    #[tokio::test]
    async fn handlers_install_on_a_live_runtime() {
        let flag = ShutdownFlag::new();
        install_signal_handlers(&flag).expect("install handlers");
        assert!(flag.is_running());
    }
}
