//! Stateful H.264 encoder session.

use ffmpeg_next as ffmpeg;

use ffmpeg::{
    codec, encoder, format::Pixel, software::scaling, util::error::EAGAIN, util::frame,
    Dictionary, Packet, Rational,
};
use fbrec_types::{
    config::VideoConfig, frame::RgbFrame, geometry::DisplayGeometry, FbrecError, Result,
};
use tracing::info;

use crate::{encode_error, writer::BitstreamWriter, FrameSink};

/// Everything the codec context is configured with, resolved from the
/// recorder config and the probed geometry before the session opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub bitrate_bps: u32,
    pub gop_size: u32,
    pub max_b_frames: u32,
    pub preset: String,
}

impl EncoderSettings {
    pub fn new(video: &VideoConfig, geometry: &DisplayGeometry) -> Self {
        Self {
            width: geometry.width,
            height: geometry.height,
            fps: video.fps,
            bitrate_bps: video.bitrate_bps,
            gop_size: video.gop_size,
            max_b_frames: video.max_b_frames,
            preset: video.preset.clone(),
        }
    }
}

/// Owns the libavcodec session, the RGB to YUV420P conversion, and the output
/// writer, for the whole process lifetime. Codec state (reference frames,
/// rate control) stays opaque behind the `ffmpeg-next` handles.
pub struct EncoderSession {
    encoder: encoder::Video,
    scaler: scaling::Context,
    rgb: frame::Video,
    yuv: frame::Video,
    writer: BitstreamWriter,
    next_pts: i64,
}

impl EncoderSession {
    pub fn open(settings: &EncoderSettings, writer: BitstreamWriter) -> Result<Self> {
        ffmpeg::init()
            .map_err(|err| FbrecError::CodecUnavailable(format!("libav init failed: {err}")))?;
        let h264 = encoder::find(codec::Id::H264).ok_or_else(|| {
            FbrecError::CodecUnavailable("no H.264 encoder in this libavcodec build".into())
        })?;

        let mut video = codec::context::Context::new_with_codec(h264)
            .encoder()
            .video()
            .map_err(|err| FbrecError::CodecOpen(format!("not a video encoder: {err}")))?;
        video.set_width(settings.width);
        video.set_height(settings.height);
        video.set_format(Pixel::YUV420P);
        video.set_time_base(Rational(1, settings.fps as i32));
        video.set_frame_rate(Some(Rational(settings.fps as i32, 1)));
        video.set_bit_rate(settings.bitrate_bps as usize);
        video.set_gop(settings.gop_size);
        video.set_max_b_frames(settings.max_b_frames as usize);

        let mut options = Dictionary::new();
        options.set("preset", &settings.preset);
        let encoder = video
            .open_with(options)
            .map_err(|err| FbrecError::CodecOpen(format!("cannot open h264 encoder: {err}")))?;

        let scaler = scaling::Context::get(
            Pixel::RGB24,
            settings.width,
            settings.height,
            Pixel::YUV420P,
            settings.width,
            settings.height,
            scaling::Flags::BILINEAR,
        )
        .map_err(|err| FbrecError::CodecOpen(format!("cannot build rgb to yuv scaler: {err}")))?;

        info!(
            "h264 encoder ready: {}x{} @ {} fps, {} bps, gop {}, max b-frames {}, preset {}",
            settings.width,
            settings.height,
            settings.fps,
            settings.bitrate_bps,
            settings.gop_size,
            settings.max_b_frames,
            settings.preset
        );
        Ok(Self {
            encoder,
            scaler,
            rgb: frame::Video::new(Pixel::RGB24, settings.width, settings.height),
            yuv: frame::Video::new(Pixel::YUV420P, settings.width, settings.height),
            writer,
            next_pts: 0,
        })
    }

    /// Copy packed RGB rows into the staging frame, respecting the libav
    /// plane stride.
    fn stage(&mut self, frame: &RgbFrame) {
        let stride = self.rgb.stride(0);
        let row_bytes = frame.width() as usize * 3;
        let data = self.rgb.data_mut(0);
        for (y, row) in frame.rows().enumerate() {
            data[y * stride..y * stride + row_bytes].copy_from_slice(row);
        }
    }

    /// Pull every pending packet out of the codec. The codec asking for more
    /// input (EAGAIN) or reporting end of stream ends the drain; any other
    /// error is a codec failure and aborts the run, since packets lost here
    /// would leave a corrupt bitstream behind.
    fn drain_packets(&mut self) -> Result<()> {
        let mut packet = Packet::empty();
        loop {
            match self.encoder.receive_packet(&mut packet) {
                Ok(()) => {
                    if let Some(data) = packet.data() {
                        self.writer.append_packet(data)?;
                    }
                }
                Err(err) if drain_done(&err) => return Ok(()),
                Err(err) => return Err(encode_error(format!("packet drain failed: {err}"))),
            }
        }
    }
}

fn drain_done(err: &ffmpeg::Error) -> bool {
    matches!(err, ffmpeg::Error::Eof | ffmpeg::Error::Other { errno: EAGAIN })
}

impl FrameSink for EncoderSession {
    fn submit(&mut self, frame: &RgbFrame) -> Result<()> {
        self.stage(frame);
        self.scaler
            .run(&self.rgb, &mut self.yuv)
            .map_err(|err| encode_error(format!("rgb to yuv conversion failed: {err}")))?;
        self.yuv.set_pts(Some(self.next_pts));
        self.next_pts += 1;
        self.encoder
            .send_frame(&self.yuv)
            .map_err(|err| encode_error(format!("frame {} rejected: {err}", self.next_pts - 1)))?;
        self.drain_packets()
    }

    fn finish(&mut self) -> Result<()> {
        self.encoder
            .send_eof()
            .map_err(|err| encode_error(format!("cannot drain encoder: {err}")))?;
        self.drain_packets()?;
        let total = self.writer.finish()?;
        info!(
            "bitstream {} closed at {total} bytes after {} frames",
            self.writer.path().display(),
            self.next_pts
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_come_from_config_and_probed_geometry() {
        let video = VideoConfig {
            fps: 25,
            bitrate_bps: 400_000,
            gop_size: 10,
            max_b_frames: 1,
            preset: "slow".into(),
        };
        let geometry = DisplayGeometry {
            width: 540,
            height: 960,
            line_length: 2176,
            x_offset: 0,
            y_offset: 0,
        };
        let settings = EncoderSettings::new(&video, &geometry);
        assert_eq!(settings.width, 540);
        assert_eq!(settings.height, 960);
        assert_eq!(settings.fps, 25);
        assert_eq!(settings.bitrate_bps, 400_000);
        assert_eq!(settings.gop_size, 10);
        assert_eq!(settings.max_b_frames, 1);
        assert_eq!(settings.preset, "slow");
    }

    #[test]
    fn only_eof_and_eagain_end_a_packet_drain() {
        assert!(drain_done(&ffmpeg::Error::Eof));
        assert!(drain_done(&ffmpeg::Error::Other { errno: EAGAIN }));
        assert!(!drain_done(&ffmpeg::Error::InvalidData));
        assert!(!drain_done(&ffmpeg::Error::Other {
            errno: libc::EIO
        }));
    }
}
