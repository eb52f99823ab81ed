//! Lookup tables normalizing raw channel values to 8-bit intensities.

use crate::pixel::{ChannelSource, PixelFormat};

/// One linear table per device bit-field, built once from the probed pixel
/// format and read-only afterwards.
///
/// Entries are 16-bit with the sample in the top byte; extraction reads the
/// top byte back, keeping full fidelity for channels wider than 8 bits.
#[derive(Debug, Clone)]
pub struct ColorMap {
    red: Vec<u16>,
    green: Vec<u16>,
    blue: Vec<u16>,
    transp: Vec<u16>,
}

impl ColorMap {
    pub fn build(format: &PixelFormat) -> Self {
        Self {
            red: channel_table(format.red.length),
            green: channel_table(format.green.length),
            blue: channel_table(format.blue.length),
            transp: channel_table(format.transp.length),
        }
    }

    pub fn table(&self, source: ChannelSource) -> &[u16] {
        match source {
            ChannelSource::Red => &self.red,
            ChannelSource::Green => &self.green,
            ChannelSource::Blue => &self.blue,
            ChannelSource::Transparency => &self.transp,
        }
    }

    /// Resolve a raw field value to its normalized 8-bit sample.
    #[inline]
    pub fn sample(&self, source: ChannelSource, raw: u32) -> u8 {
        let table = self.table(source);
        let index = (raw as usize).min(table.len() - 1);
        (table[index] >> 8) as u8
    }
}

/// Linear table for a channel `length` bits wide: `2^length` entries scaling
/// the raw range onto `[0, 0xffff]`. A zero-length channel collapses to a
/// single zero entry, avoiding the `2^0 - 1` zero denominator.
pub fn channel_table(length: u32) -> Vec<u16> {
    if length == 0 {
        return vec![0];
    }
    let max = (1u32 << length) - 1;
    (0..=max)
        .map(|value| ((value as u64 * 0xffff) / max as u64) as u16)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::ChannelField;

    #[test]
    fn tables_are_monotone_with_pinned_endpoints() {
        for length in 1..=16u32 {
            let table = channel_table(length);
            assert_eq!(table.len(), 1 << length, "length {length}");
            assert_eq!(table[0] >> 8, 0);
            assert_eq!(*table.last().expect("nonempty") >> 8, 255);
            assert!(
                table.windows(2).all(|pair| pair[0] <= pair[1]),
                "length {length} not monotone"
            );
        }
    }

    #[test]
    fn zero_length_channel_has_one_fixed_entry() {
        assert_eq!(channel_table(0), vec![0]);
    }

    #[test]
    fn five_bit_channel_scales_linearly() {
        let table = channel_table(5);
        assert_eq!(table[15] >> 8, 15 * 255 / 31);
        assert_eq!(table[31] >> 8, 255);
    }

    #[test]
    fn sample_reads_the_top_byte_and_clamps_out_of_range_values() {
        let format = PixelFormat {
            red: ChannelField::new(16, 8),
            green: ChannelField::new(8, 8),
            blue: ChannelField::new(0, 8),
            transp: ChannelField::new(24, 0),
        };
        let map = ColorMap::build(&format);
        assert_eq!(map.sample(ChannelSource::Red, 0x80), 0x80);
        assert_eq!(map.sample(ChannelSource::Transparency, 7), 0);
        // Raw values beyond the table (possible with a misreported length)
        // clamp to the brightest entry instead of indexing out of bounds.
        assert_eq!(map.sample(ChannelSource::Blue, 0x1ff), 255);
    }
}
