use crate::{geometry::DisplayGeometry, FbrecError, Result};

/// Single-buffered RGB destination, allocated once from the validated
/// geometry and overwritten in place every sampling tick.
///
/// Samples live row-major (`[y][x][rgb]`) so whole rows can be handed to the
/// encoder without reshuffling; `put`/`get` keep the per-pixel view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RgbFrame {
    pub fn new(geometry: &DisplayGeometry) -> Result<Self> {
        geometry.validate()?;
        let samples = geometry.frame_samples();
        let mut data = Vec::new();
        data.try_reserve_exact(samples).map_err(|err| {
            FbrecError::Allocation(format!("cannot allocate {samples}-byte frame buffer: {err}"))
        })?;
        data.resize(samples, 0);
        Ok(Self {
            width: geometry.width,
            height: geometry.height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        (y as usize * self.width as usize + x as usize) * 3
    }

    #[inline]
    pub fn put(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let at = self.index(x, y);
        self.data[at..at + 3].copy_from_slice(&rgb);
    }

    pub fn get(&self, x: u32, y: u32) -> [u8; 3] {
        let at = self.index(x, y);
        [self.data[at], self.data[at + 1], self.data[at + 2]]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Rows of `width * 3` packed RGB bytes, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(self.width as usize * 3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_geometry() -> DisplayGeometry {
        DisplayGeometry {
            width: 4,
            height: 3,
            line_length: 16,
            x_offset: 0,
            y_offset: 0,
        }
    }

    #[test]
    fn frame_is_sized_exactly_to_the_geometry() {
        let frame = RgbFrame::new(&small_geometry()).expect("allocate frame");
        assert_eq!(frame.as_bytes().len(), 4 * 3 * 3);
        assert_eq!(frame.rows().count(), 3);
        assert!(frame.rows().all(|row| row.len() == 4 * 3));
    }

    #[test]
    fn put_and_get_agree_on_pixel_addressing() {
        let mut frame = RgbFrame::new(&small_geometry()).expect("allocate frame");
        frame.put(3, 2, [1, 2, 3]);
        frame.put(0, 0, [9, 8, 7]);
        assert_eq!(frame.get(3, 2), [1, 2, 3]);
        assert_eq!(frame.get(0, 0), [9, 8, 7]);
        let last_row: Vec<u8> = frame.rows().last().expect("rows").to_vec();
        assert_eq!(&last_row[9..12], &[1, 2, 3]);
    }

    #[test]
    fn oversized_geometry_is_refused_before_allocation() {
        let geo = DisplayGeometry {
            width: crate::geometry::MAX_DIMENSION + 1,
            height: 8,
            line_length: (crate::geometry::MAX_DIMENSION + 1) * 4,
            x_offset: 0,
            y_offset: 0,
        };
        assert!(matches!(
            RgbFrame::new(&geo),
            Err(FbrecError::Allocation(_))
        ));
    }
}
