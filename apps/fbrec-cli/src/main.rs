use std::{env, path::Path};

use anyhow::Result;
use fbrec_capture::{FrameSource, FramebufferSource};
use fbrec_encoder::{BitstreamWriter, EncoderSession, EncoderSettings};
use fbrec_recorder::{install_signal_handlers, ops::init_tracing, Pacer, Recorder, ShutdownFlag};
use fbrec_types::{config::RecorderConfig, FbrecError};
use tracing::info;

const DEFAULT_CONFIG_PATH: &str = "configs/fbrec.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config();
    config.validate()?;
    init_tracing(&config.ops)?;

    let program = env::args().next().unwrap_or_else(|| "fbrec".into());
    let mut args = env::args().skip(1);
    let output_path = match (args.next(), args.next()) {
        (Some(path), None) => path,
        _ => return Err(FbrecError::Argument(format!("usage: {program} <output-file>")).into()),
    };

    // Output file first, device second, codec last: a failure at any step
    // drops everything acquired so far in reverse order.
    let writer = BitstreamWriter::create(&output_path)?;
    let device_path = config.device_path();
    let source = FramebufferSource::open(&device_path, config.device.channel_map)?;
    let settings = EncoderSettings::new(&config.video, &source.geometry());
    let session = EncoderSession::open(&settings, writer)?;

    let flag = ShutdownFlag::new();
    install_signal_handlers(&flag)?;

    let pacer = Pacer::new(config.video.tick_period());
    let mut recorder = Recorder::new(source, session, pacer, flag)?;
    info!(
        "recording {} to {} (Ctrl+C to stop)",
        device_path, output_path
    );
    let stats = recorder.run().await?;
    info!(
        "have a nice day: {} frames captured in {} ms",
        stats.frames, stats.duration_ms
    );
    Ok(())
}

fn load_config() -> RecorderConfig {
    let from_env = env::var("FBREC_CONFIG").ok().filter(|path| !path.is_empty());
    let explicit = from_env.is_some();
    let path = from_env.unwrap_or_else(|| DEFAULT_CONFIG_PATH.into());
    if !explicit && !Path::new(&path).exists() {
        return RecorderConfig::default();
    }
    match RecorderConfig::from_file(&path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!(
                "Failed to load config from '{path}': {err}. Falling back to internal defaults."
            );
            RecorderConfig::default()
        }
    }
}
