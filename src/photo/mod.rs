//! Photo handling: decoding, the host's deck and frame composition.

pub mod canvas;
pub mod decoder;
pub mod deck;

pub use self::canvas::PixelGrid;
pub use self::decoder::{DecodeError, ImageDecoder, NetpbmDecoder};
pub use self::deck::{Photo, PhotoDeck};
