use serde::{Deserialize, Serialize};

use crate::{FbrecError, Result};

/// Widest channel the colormap can normalize.
pub const MAX_CHANNEL_BITS: u32 = 16;

/// Location of one color channel inside a 32-bit pixel word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelField {
    /// Bit offset of the field's least significant bit.
    pub offset: u32,
    /// Field width in bits; zero for formats lacking the channel.
    pub length: u32,
}

impl ChannelField {
    pub fn new(offset: u32, length: u32) -> Self {
        Self { offset, length }
    }

    /// Extract the raw field value from a host-order pixel word.
    #[inline]
    pub fn extract(&self, pixel: u32) -> u32 {
        if self.length == 0 {
            return 0;
        }
        let mask = ((1u64 << self.length) - 1) as u32;
        (pixel >> self.offset) & mask
    }
}

/// Per-channel bit layout of the device's pixel word, straight from the
/// variable screen info. Immutable once probed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelFormat {
    pub red: ChannelField,
    pub green: ChannelField,
    pub blue: ChannelField,
    pub transp: ChannelField,
}

impl PixelFormat {
    pub fn field(&self, source: ChannelSource) -> ChannelField {
        match source {
            ChannelSource::Red => self.red,
            ChannelSource::Green => self.green,
            ChannelSource::Blue => self.blue,
            ChannelSource::Transparency => self.transp,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for source in ChannelSource::ALL {
            let field = self.field(source);
            if field.length > MAX_CHANNEL_BITS {
                return Err(FbrecError::DeviceQuery(format!(
                    "{source:?} channel is {} bits wide, beyond the {MAX_CHANNEL_BITS}-bit colormap limit",
                    field.length
                )));
            }
            if field.offset >= 32 || field.offset + field.length > 32 {
                return Err(FbrecError::DeviceQuery(format!(
                    "{source:?} channel at bit {}..{} does not fit a 32-bit pixel",
                    field.offset,
                    field.offset + field.length
                )));
            }
        }
        Ok(())
    }
}

/// One of the four bit-fields a device pixel carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelSource {
    Red,
    Green,
    Blue,
    Transparency,
}

impl ChannelSource {
    pub const ALL: [ChannelSource; 4] = [
        ChannelSource::Red,
        ChannelSource::Green,
        ChannelSource::Blue,
        ChannelSource::Transparency,
    ];
}

/// Wiring from device bit-fields to the three output channels.
///
/// Which field feeds which output channel is format-specific and has to be
/// verified against real hardware; a wrong wiring silently swaps colors
/// rather than erroring. Some panels (the original Jolla target among them)
/// need `red = "transparency"`, `green = "blue"`, `blue = "green"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelMap {
    pub red: ChannelSource,
    pub green: ChannelSource,
    pub blue: ChannelSource,
}

impl ChannelMap {
    /// Source fields in output order (R, G, B).
    pub fn outputs(&self) -> [ChannelSource; 3] {
        [self.red, self.green, self.blue]
    }
}

impl Default for ChannelMap {
    fn default() -> Self {
        Self {
            red: ChannelSource::Red,
            green: ChannelSource::Green,
            blue: ChannelSource::Blue,
        }
    }
}
