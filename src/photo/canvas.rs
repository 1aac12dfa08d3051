//! Pixel buffers and the cell arithmetic used to build reveal frames.

use thiserror::Error;

/// Error raised when a pixel buffer does not match its declared shape.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("pixel buffer holds {actual} bytes, expected {expected} for {height}x{width}x{channels}")]
pub struct ShapeError {
    height: usize,
    width: usize,
    channels: usize,
    expected: usize,
    actual: usize,
}

/// Row-major, interleaved 8-bit pixel grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    height: usize,
    width: usize,
    channels: usize,
    data: Vec<u8>,
}

impl PixelGrid {
    /// Wrap raw bytes, checking they match `height * width * channels`.
    pub fn new(
        height: usize,
        width: usize,
        channels: usize,
        data: Vec<u8>,
    ) -> Result<Self, ShapeError> {
        // saturates for shapes no buffer could hold
        let expected = height
            .checked_mul(width)
            .and_then(|cells| cells.checked_mul(channels))
            .unwrap_or(usize::MAX);
        if data.len() != expected {
            return Err(ShapeError {
                height,
                width,
                channels,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            height,
            width,
            channels,
            data,
        })
    }

    /// All-zero grid with the same shape as `other`.
    pub fn blank_like(other: &PixelGrid) -> Self {
        Self {
            height: other.height,
            width: other.width,
            channels: other.channels,
            data: vec![0; other.data.len()],
        }
    }

    /// Number of pixel rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of pixel columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Bytes per pixel.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Raw interleaved bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Channel values of the pixel at (`row`, `col`).
    pub fn pixel(&self, row: usize, col: usize) -> &[u8] {
        let start = (row * self.width + col) * self.channels;
        &self.data[start..start + self.channels]
    }

    /// Copy the pixels covered by `rect` from `source`, which must share this grid's shape.
    fn copy_rect_from(&mut self, source: &PixelGrid, rect: CellRect) {
        let row_bytes = rect.width * self.channels;
        for row in rect.top..rect.top + rect.height {
            let start = (row * self.width + rect.left) * self.channels;
            self.data[start..start + row_bytes]
                .copy_from_slice(&source.data[start..start + row_bytes]);
        }
    }

    /// Encode as a binary Netpbm image (`P5` for one channel, `P6` otherwise).
    ///
    /// Grids with more than three channels keep their first three; two-channel
    /// grids are written as greyscale from their first channel.
    pub fn to_netpbm(&self) -> Vec<u8> {
        let grey = self.channels < 3;
        let magic = if grey { "P5" } else { "P6" };
        let mut out = format!("{magic}\n{} {}\n255\n", self.width, self.height).into_bytes();
        for pixel in self.data.chunks_exact(self.channels.max(1)) {
            if grey {
                out.push(pixel[0]);
            } else {
                out.extend_from_slice(&pixel[..3]);
            }
        }
        out
    }
}

/// Pixel rectangle covered by one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    /// Grid row of the cell.
    pub row: usize,
    /// Grid column of the cell.
    pub col: usize,
    /// First pixel row.
    pub top: usize,
    /// First pixel column.
    pub left: usize,
    /// Cell height in pixels.
    pub height: usize,
    /// Cell width in pixels.
    pub width: usize,
}

/// Locate `index` in a `grid_size` × `grid_size` grid laid over a
/// `height` × `width` image.
///
/// Cells measure `floor(height / grid_size)` by `floor(width / grid_size)`;
/// leftover rows and columns at the bottom and right edge belong to no cell.
/// Returns `None` for an empty grid or an index outside it.
pub fn cell_rect(index: usize, grid_size: usize, height: usize, width: usize) -> Option<CellRect> {
    if grid_size == 0 || index >= grid_size * grid_size {
        return None;
    }
    let (row, col) = (index / grid_size, index % grid_size);
    let (cell_h, cell_w) = (height / grid_size, width / grid_size);
    Some(CellRect {
        row,
        col,
        top: row * cell_h,
        left: col * cell_w,
        height: cell_h,
        width: cell_w,
    })
}

/// Build a frame showing only the `revealed` cells of `source`; everything
/// else stays blank (all zero).
pub fn composite(source: &PixelGrid, grid_size: usize, revealed: &[usize]) -> PixelGrid {
    let mut frame = PixelGrid::blank_like(source);
    for &cell in revealed {
        if let Some(rect) = cell_rect(cell, grid_size, source.height, source.width) {
            frame.copy_rect_from(source, rect);
        }
    }
    frame
}

/// Per-channel linear blend `(1 - alpha) * background + alpha * source`,
/// with `alpha` clamped to `[0, 1]`.
pub fn blend(source: &PixelGrid, background: u8, alpha: f32) -> PixelGrid {
    let alpha = alpha.clamp(0.0, 1.0);
    let base = (1.0 - alpha) * f32::from(background);
    let data = source
        .data
        .iter()
        .map(|&value| (base + alpha * f32::from(value)).min(255.0) as u8)
        .collect();
    PixelGrid {
        height: source.height,
        width: source.width,
        channels: source.channels,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Single-channel image whose pixels count up from 1 in row-major order.
    fn numbered(height: usize, width: usize) -> PixelGrid {
        let data = (1..=height * width).map(|v| v as u8).collect();
        PixelGrid::new(height, width, 1, data).unwrap()
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let err = PixelGrid::new(2, 2, 3, vec![0; 11]).unwrap_err();
        assert_eq!(err.to_string(), "pixel buffer holds 11 bytes, expected 12 for 2x2x3");
    }

    #[test]
    fn oversized_shape_is_rejected_without_overflow() {
        let err = PixelGrid::new(usize::MAX, 2, 3, vec![0; 6]).unwrap_err();
        assert_eq!(err.expected, usize::MAX);
        assert_eq!(err.actual, 6);
    }

    #[test]
    fn cell_rect_uses_divmod_over_grid() {
        let rect = cell_rect(5, 3, 9, 12).unwrap();
        assert_eq!((rect.row, rect.col), (1, 2));
        assert_eq!((rect.top, rect.left, rect.height, rect.width), (3, 8, 3, 4));
        assert_eq!(cell_rect(9, 3, 9, 12), None);
        assert_eq!(cell_rect(0, 0, 9, 12), None);
    }

    #[test]
    fn three_of_four_cells_revealed() {
        let source = numbered(4, 4);
        let frame = composite(&source, 2, &[2, 0, 3]);

        // cell 0 (top-left), cell 2 (bottom-left), cell 3 (bottom-right)
        assert_eq!(frame.pixel(0, 0), source.pixel(0, 0));
        assert_eq!(frame.pixel(1, 1), source.pixel(1, 1));
        assert_eq!(frame.pixel(2, 0), source.pixel(2, 0));
        assert_eq!(frame.pixel(3, 3), source.pixel(3, 3));
        // cell 1 (top-right) is still blank
        for (row, col) in [(0, 2), (0, 3), (1, 2), (1, 3)] {
            assert_eq!(frame.pixel(row, col), &[0]);
        }
    }

    #[test]
    fn remainder_pixels_stay_blank_even_when_fully_revealed() {
        let source = numbered(5, 5);
        let frame = composite(&source, 2, &[0, 1, 2, 3]);

        for i in 0..5 {
            assert_eq!(frame.pixel(4, i), &[0]);
            assert_eq!(frame.pixel(i, 4), &[0]);
        }
        assert_eq!(frame.pixel(3, 3), source.pixel(3, 3));
    }

    #[test]
    fn blend_interpolates_between_background_and_source() {
        let source = PixelGrid::new(1, 2, 1, vec![0, 200]).unwrap();

        assert_eq!(blend(&source, 255, 0.0).data(), &[255, 255]);
        assert_eq!(blend(&source, 255, 1.0).data(), &[0, 200]);
        assert_eq!(blend(&source, 0, 0.5).data(), &[0, 100]);
        assert_eq!(blend(&source, 0, 3.0).data(), &[0, 200]);
    }

    #[test]
    fn netpbm_header_matches_shape() {
        let rgb = PixelGrid::new(1, 2, 3, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let encoded = rgb.to_netpbm();
        assert!(encoded.starts_with(b"P6\n2 1\n255\n"));
        assert_eq!(&encoded[encoded.len() - 6..], &[1, 2, 3, 4, 5, 6]);

        let grey = PixelGrid::new(1, 1, 1, vec![9]).unwrap();
        assert_eq!(grey.to_netpbm(), b"P5\n1 1\n255\n\x09".to_vec());
    }
}
