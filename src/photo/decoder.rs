//! Image decoding boundary. Real deployments can plug any decoder behind
//! [`ImageDecoder`]; the bundled one understands binary Netpbm files.

use thiserror::Error;

use crate::photo::canvas::{PixelGrid, ShapeError};

/// Failures raised while turning raw bytes into a [`PixelGrid`].
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload does not start with a supported magic number.
    #[error("unsupported image format")]
    UnsupportedFormat,
    /// A header field is missing or not a number.
    #[error("malformed header: {0}")]
    MalformedHeader(&'static str),
    /// Only 8-bit samples are supported.
    #[error("unsupported maximum sample value {0}")]
    UnsupportedDepth(u32),
    /// Pixel data is shorter than the header announces.
    #[error("truncated pixel data")]
    Truncated(#[source] ShapeError),
}

/// Decodes uploaded photo bytes into pixels.
pub trait ImageDecoder: Send + Sync {
    /// Decode a complete image file.
    fn decode(&self, bytes: &[u8]) -> Result<PixelGrid, DecodeError>;
}

/// Decoder for binary greyscale (`P5`) and RGB (`P6`) Netpbm images with
/// 8-bit samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetpbmDecoder;

impl ImageDecoder for NetpbmDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<PixelGrid, DecodeError> {
        let channels = match bytes.get(..2) {
            Some(b"P5") => 1,
            Some(b"P6") => 3,
            _ => return Err(DecodeError::UnsupportedFormat),
        };

        let mut header = HeaderReader { bytes, pos: 2 };
        let width = header.number().ok_or(DecodeError::MalformedHeader("width"))?;
        let height = header.number().ok_or(DecodeError::MalformedHeader("height"))?;
        let max_value = header
            .number()
            .ok_or(DecodeError::MalformedHeader("maximum value"))?;
        if max_value == 0 || max_value > 255 {
            return Err(DecodeError::UnsupportedDepth(max_value));
        }
        // exactly one whitespace byte separates the header from the samples
        let start = header.pos + 1;

        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|cells| cells.checked_mul(channels))
            .ok_or(DecodeError::MalformedHeader("dimensions"))?;
        let data = bytes
            .get(start..)
            .unwrap_or_default()
            .iter()
            .take(expected)
            .copied()
            .collect();

        PixelGrid::new(height as usize, width as usize, channels, data)
            .map_err(DecodeError::Truncated)
    }
}

struct HeaderReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl HeaderReader<'_> {
    /// Skip whitespace and `#` comments, then read one ASCII decimal.
    fn number(&mut self) -> Option<u32> {
        loop {
            match self.bytes.get(self.pos)? {
                b'#' => {
                    while *self.bytes.get(self.pos)? != b'\n' {
                        self.pos += 1;
                    }
                }
                byte if byte.is_ascii_whitespace() => self.pos += 1,
                _ => break,
            }
        }

        let digits_start = self.pos;
        while self.bytes.get(self.pos).is_some_and(u8::is_ascii_digit) {
            self.pos += 1;
        }
        std::str::from_utf8(&self.bytes[digits_start..self.pos])
            .ok()?
            .parse()
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_rgb_with_comment() {
        let mut bytes = b"P6\n# shot on a phone\n2 1\n255\n".to_vec();
        bytes.extend_from_slice(&[10, 20, 30, 40, 50, 60]);

        let grid = NetpbmDecoder.decode(&bytes).unwrap();
        assert_eq!((grid.height(), grid.width(), grid.channels()), (1, 2, 3));
        assert_eq!(grid.pixel(0, 1), &[40, 50, 60]);
    }

    #[test]
    fn decodes_greyscale() {
        let bytes = b"P5 2 2 255 \x01\x02\x03\x04".to_vec();
        let grid = NetpbmDecoder.decode(&bytes).unwrap();
        assert_eq!(grid.data(), &[1, 2, 3, 4]);
    }

    #[test]
    fn decoding_own_encoding_yields_same_pixels() {
        let grid = PixelGrid::new(2, 2, 3, (0..12).collect()).unwrap();
        assert_eq!(NetpbmDecoder.decode(&grid.to_netpbm()).unwrap(), grid);
    }

    #[test]
    fn rejects_unknown_and_broken_inputs() {
        assert!(matches!(
            NetpbmDecoder.decode(b"\x89PNG"),
            Err(DecodeError::UnsupportedFormat)
        ));
        assert!(matches!(
            NetpbmDecoder.decode(b"P6\nabc"),
            Err(DecodeError::MalformedHeader("width"))
        ));
        assert!(matches!(
            NetpbmDecoder.decode(b"P6 1 1 65535 \x00\x00"),
            Err(DecodeError::UnsupportedDepth(65535))
        ));
        assert!(matches!(
            NetpbmDecoder.decode(b"P6 2 2 255 \x00\x00\x00"),
            Err(DecodeError::Truncated(_))
        ));
    }

    #[test]
    fn huge_dimensions_are_an_error() {
        let result = NetpbmDecoder.decode(b"P6 4294967295 4294967295 255 ");
        assert!(matches!(
            result,
            Err(DecodeError::MalformedHeader("dimensions")) | Err(DecodeError::Truncated(_))
        ));
    }
}
