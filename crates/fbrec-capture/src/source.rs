//! Frame sources: the live framebuffer and a deterministic synthetic one.

use std::path::Path;

use async_trait::async_trait;
use fbrec_types::{
    colormap::ColorMap,
    frame::RgbFrame,
    geometry::DisplayGeometry,
    pixel::{ChannelMap, PixelFormat},
    Result,
};
use tracing::trace;

use crate::{convert::convert_region, device::FramebufferDevice};

/// Produces one RGB frame per pacing tick into a caller-owned buffer.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Validated geometry the produced frames are dimensioned to.
    fn geometry(&self) -> DisplayGeometry;

    /// Sample the source once, overwriting `frame` in place.
    async fn sample_into(&mut self, frame: &mut RgbFrame) -> Result<()>;
}

/// Live source. Maps the device's pixel memory for the duration of each tick,
/// converts the visible pixels, and unmaps on the way out.
pub struct FramebufferSource {
    device: FramebufferDevice,
    geometry: DisplayGeometry,
    format: PixelFormat,
    colormap: ColorMap,
    channel_map: ChannelMap,
}

impl FramebufferSource {
    pub fn open<P: AsRef<Path>>(path: P, channel_map: ChannelMap) -> Result<Self> {
        let device = FramebufferDevice::open(path)?;
        let (geometry, format) = device.probe()?;
        let colormap = ColorMap::build(&format);
        Ok(Self {
            device,
            geometry,
            format,
            colormap,
            channel_map,
        })
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.format
    }
}

#[async_trait]
impl FrameSource for FramebufferSource {
    fn geometry(&self) -> DisplayGeometry {
        self.geometry
    }

    async fn sample_into(&mut self, frame: &mut RgbFrame) -> Result<()> {
        let region = self.device.map(self.geometry.mapped_length())?;
        trace!("mapped {} framebuffer bytes", region.len());
        convert_region(
            region.as_bytes(),
            &self.geometry,
            &self.format,
            &self.colormap,
            &self.channel_map,
            frame,
        )
        // The mapping is released when `region` drops, failed ticks included.
    }
}

/// Deterministic source for tests and bring-up: a solid raw pixel value run
/// through the real conversion path.
pub struct SyntheticSource {
    geometry: DisplayGeometry,
    format: PixelFormat,
    colormap: ColorMap,
    channel_map: ChannelMap,
    region: Vec<u8>,
    samples: u64,
}

impl SyntheticSource {
    pub fn solid(
        geometry: DisplayGeometry,
        format: PixelFormat,
        channel_map: ChannelMap,
        raw_pixel: u32,
    ) -> Result<Self> {
        geometry.validate()?;
        format.validate()?;
        let rows = geometry.height as usize + geometry.y_offset as usize;
        let length = rows * geometry.row_stride();
        let mut region = Vec::with_capacity(length + 4);
        while region.len() < length {
            region.extend_from_slice(&raw_pixel.to_le_bytes());
        }
        region.truncate(length);
        Ok(Self {
            geometry,
            format,
            colormap: ColorMap::build(&format),
            channel_map,
            region,
            samples: 0,
        })
    }

    /// Number of completed sampling calls.
    pub fn samples(&self) -> u64 {
        self.samples
    }
}

#[async_trait]
impl FrameSource for SyntheticSource {
    fn geometry(&self) -> DisplayGeometry {
        self.geometry
    }

    async fn sample_into(&mut self, frame: &mut RgbFrame) -> Result<()> {
        convert_region(
            &self.region,
            &self.geometry,
            &self.format,
            &self.colormap,
            &self.channel_map,
            frame,
        )?;
        self.samples += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fbrec_types::pixel::ChannelField;

    #[tokio::test]
    async fn synthetic_source_fills_every_sample() {
        let geometry = DisplayGeometry {
            width: 8,
            height: 4,
            line_length: 32,
            x_offset: 0,
            y_offset: 0,
        };
        let format = PixelFormat {
            red: ChannelField::new(16, 8),
            green: ChannelField::new(8, 8),
            blue: ChannelField::new(0, 8),
            transp: ChannelField::new(24, 8),
        };
        let mut source =
            SyntheticSource::solid(geometry, format, ChannelMap::default(), 0x00ff_7f01)
                .expect("build source");
        let mut frame = RgbFrame::new(&geometry).expect("allocate frame");
        source.sample_into(&mut frame).await.expect("sample");
        source.sample_into(&mut frame).await.expect("sample again");
        assert_eq!(source.samples(), 2);
        assert!(frame
            .as_bytes()
            .chunks_exact(3)
            .all(|rgb| rgb == [0xff, 0x7f, 0x01]));
    }
}
