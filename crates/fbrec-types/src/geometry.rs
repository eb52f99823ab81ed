use serde::{Deserialize, Serialize};

use crate::{FbrecError, Result};

/// The sampler walks the framebuffer in packed 32-bit words; probing rejects
/// devices with any other pixel size.
pub const BYTES_PER_PIXEL: u32 = 4;

/// Cap on either screen axis. Device-reported numbers size the frame buffer,
/// so they are bounded before any allocation happens.
pub const MAX_DIMENSION: u32 = 16_384;

/// Screen layout as reported by the device. Read once at startup and
/// immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayGeometry {
    pub width: u32,
    pub height: u32,
    /// Physical bytes per row, which may exceed `width * 4`.
    pub line_length: u32,
    /// Horizontal pan offset of the visible area, in pixels.
    pub x_offset: u32,
    /// Vertical pan offset of the visible area, in rows.
    pub y_offset: u32,
}

impl DisplayGeometry {
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FbrecError::DeviceQuery(format!(
                "degenerate resolution {}x{}",
                self.width, self.height
            )));
        }
        if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            return Err(FbrecError::Allocation(format!(
                "resolution {}x{} exceeds the {} pixel per-axis cap",
                self.width, self.height, MAX_DIMENSION
            )));
        }
        if self.line_length < self.width * BYTES_PER_PIXEL {
            return Err(FbrecError::DeviceQuery(format!(
                "line length {} is shorter than one row of {} pixels",
                self.line_length, self.width
            )));
        }
        Ok(())
    }

    /// Bytes of device memory the sampler maps for one tick. Covers both the
    /// panned rows and the last word the pixel walk reads: with a horizontal
    /// pan the stride exceeds `line_length`, so the walk can reach past the
    /// row-count bound.
    pub fn mapped_length(&self) -> usize {
        let rows = self.line_length as usize * (self.height as usize + self.y_offset as usize);
        let last_row = (self.height as usize + self.y_offset as usize).saturating_sub(1);
        let walk = last_row * self.row_stride() + self.width as usize * BYTES_PER_PIXEL as usize;
        rows.max(walk)
    }

    /// Byte distance between the starts of consecutive sampled rows. The
    /// horizontal pan offset is folded into the stride, scaled to bytes.
    pub fn row_stride(&self) -> usize {
        self.line_length as usize + self.x_offset as usize * BYTES_PER_PIXEL as usize
    }

    /// Number of 8-bit samples in one RGB frame of this geometry.
    pub fn frame_samples(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(width: u32, height: u32, line_length: u32) -> DisplayGeometry {
        DisplayGeometry {
            width,
            height,
            line_length,
            x_offset: 0,
            y_offset: 0,
        }
    }

    #[test]
    fn validate_rejects_degenerate_and_oversized_screens() {
        assert!(geometry(0, 960, 0).validate().is_err());
        assert!(geometry(540, 0, 2176).validate().is_err());
        assert!(geometry(MAX_DIMENSION + 1, 960, (MAX_DIMENSION + 1) * 4)
            .validate()
            .is_err());
        assert!(geometry(540, 960, 2048).validate().is_err());
        assert!(geometry(540, 960, 2176).validate().is_ok());
    }

    #[test]
    fn derived_sizes_account_for_padding_and_offsets() {
        let mut geo = geometry(540, 960, 2176);
        geo.y_offset = 8;
        assert_eq!(geo.mapped_length(), 2176 * (960 + 8));
        assert_eq!(geo.row_stride(), 2176);
        assert_eq!(geo.frame_samples(), 540 * 960 * 3);
    }

    #[test]
    fn mapped_length_covers_the_walk_of_a_horizontally_panned_screen() {
        let mut geo = geometry(2, 2, 8);
        geo.x_offset = 1;
        // Stride is 12, so the second row's pixels end at byte 20, past the
        // 16 bytes the row count alone would map.
        assert_eq!(geo.row_stride(), 12);
        assert_eq!(geo.mapped_length(), 20);

        let mut wide = geometry(540, 960, 2176);
        wide.x_offset = 2;
        wide.y_offset = 8;
        let last_row = 960 + 8 - 1;
        assert_eq!(
            wide.mapped_length(),
            last_row * wide.row_stride() + 540 * BYTES_PER_PIXEL as usize
        );
    }
}
