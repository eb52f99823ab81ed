//! Raw mapped bytes to RGB conversion.

use fbrec_types::{
    colormap::ColorMap,
    frame::RgbFrame,
    geometry::{DisplayGeometry, BYTES_PER_PIXEL},
    pixel::{ChannelMap, PixelFormat},
    Result,
};

use crate::capture_error;

/// Convert every visible pixel of a mapped region into `frame`.
///
/// Pixel words are little-endian on the device. Row addressing follows the
/// probed geometry, pan offsets included: the word for output pixel (x, y)
/// sits at `(y + y_offset) * row_stride + x * 4`. The region length is
/// checked up front so the per-pixel walk cannot read past the mapping.
pub fn convert_region(
    region: &[u8],
    geometry: &DisplayGeometry,
    format: &PixelFormat,
    colormap: &ColorMap,
    channel_map: &ChannelMap,
    frame: &mut RgbFrame,
) -> Result<()> {
    if frame.width() != geometry.width || frame.height() != geometry.height {
        return Err(capture_error(format!(
            "frame is {}x{}, geometry is {}x{}",
            frame.width(),
            frame.height(),
            geometry.width,
            geometry.height
        )));
    }
    let stride = geometry.row_stride();
    let pixel_bytes = BYTES_PER_PIXEL as usize;
    let last_row = geometry.height as usize - 1 + geometry.y_offset as usize;
    let required = last_row * stride + geometry.width as usize * pixel_bytes;
    if region.len() < required {
        return Err(capture_error(format!(
            "mapped region is {} bytes, geometry needs {required}",
            region.len()
        )));
    }

    let sources = channel_map.outputs();
    let fields = sources.map(|source| format.field(source));
    for y in 0..geometry.height {
        let row_base = (y as usize + geometry.y_offset as usize) * stride;
        for x in 0..geometry.width {
            let at = row_base + x as usize * pixel_bytes;
            let word = u32::from_le_bytes([
                region[at],
                region[at + 1],
                region[at + 2],
                region[at + 3],
            ]);
            frame.put(
                x,
                y,
                [
                    colormap.sample(sources[0], fields[0].extract(word)),
                    colormap.sample(sources[1], fields[1].extract(word)),
                    colormap.sample(sources[2], fields[2].extract(word)),
                ],
            );
        }
    }
    Ok(())
}
