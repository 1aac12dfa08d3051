//! Ordered collection of photos the host cycles through.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::fs;
use tracing::{debug, info, warn};

use crate::photo::{canvas::PixelGrid, decoder::ImageDecoder};

const PHOTO_EXTENSIONS: [&str; 2] = ["ppm", "pgm"];

/// One decoded photo.
#[derive(Debug, Clone)]
pub struct Photo {
    name: String,
    pixels: Arc<PixelGrid>,
}

impl Photo {
    /// Wrap decoded pixels under a display name.
    pub fn new(name: impl Into<String>, pixels: PixelGrid) -> Self {
        Self {
            name: name.into(),
            pixels: Arc::new(pixels),
        }
    }

    /// File name the photo was loaded from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared handle to the decoded pixels.
    pub fn pixels(&self) -> Arc<PixelGrid> {
        self.pixels.clone()
    }
}

/// Photos sorted by file name.
#[derive(Debug, Clone, Default)]
pub struct PhotoDeck {
    photos: Vec<Photo>,
}

impl PhotoDeck {
    /// Build a deck from already decoded photos, keeping their order.
    pub fn from_photos(photos: Vec<Photo>) -> Self {
        Self { photos }
    }

    /// Decode every `.ppm`/`.pgm` file of `dir`.
    ///
    /// A missing directory yields an empty deck. Files that fail to decode are
    /// skipped with a warning.
    pub async fn load_dir(dir: &Path, decoder: &dyn ImageDecoder) -> std::io::Result<Self> {
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(dir = %dir.display(), "photo directory not found; deck is empty");
                return Ok(Self::default());
            }
            Err(err) => return Err(err),
        };

        let mut paths: Vec<PathBuf> = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if is_photo(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut photos = Vec::with_capacity(paths.len());
        for path in paths {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let bytes = fs::read(&path).await?;
            match decoder.decode(&bytes) {
                Ok(pixels) => {
                    debug!(
                        photo = %name,
                        height = pixels.height(),
                        width = pixels.width(),
                        "decoded photo"
                    );
                    photos.push(Photo::new(name, pixels));
                }
                Err(err) => warn!(photo = %name, error = %err, "skipping undecodable photo"),
            }
        }

        info!(dir = %dir.display(), count = photos.len(), "loaded photo deck");
        Ok(Self { photos })
    }

    /// Number of photos.
    pub fn len(&self) -> usize {
        self.photos.len()
    }

    /// Whether the deck holds no photo.
    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    /// Photo at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Photo> {
        self.photos.get(index)
    }

    /// Photo names in deck order.
    pub fn names(&self) -> Vec<String> {
        self.photos.iter().map(|photo| photo.name.clone()).collect()
    }
}

fn is_photo(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            PHOTO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photo::decoder::NetpbmDecoder;

    fn write_photo(dir: &Path, name: &str, value: u8) {
        let grid = PixelGrid::new(2, 2, 1, vec![value; 4]).unwrap();
        std::fs::write(dir.join(name), grid.to_netpbm()).unwrap();
    }

    #[tokio::test]
    async fn loads_sorted_and_skips_other_files() {
        let dir = tempfile::tempdir().unwrap();
        write_photo(dir.path(), "b.pgm", 2);
        write_photo(dir.path(), "a.PGM", 1);
        std::fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
        std::fs::write(dir.path().join("broken.ppm"), b"P6 garbage").unwrap();
        std::fs::write(dir.path().join("huge.ppm"), b"P6 4294967295 4294967295 255 ").unwrap();

        let deck = PhotoDeck::load_dir(dir.path(), &NetpbmDecoder).await.unwrap();

        assert_eq!(deck.names(), ["a.PGM", "b.pgm"]);
        assert_eq!(deck.get(1).unwrap().pixels().data(), &[2, 2, 2, 2]);
    }

    #[tokio::test]
    async fn missing_directory_is_an_empty_deck() {
        let dir = tempfile::tempdir().unwrap();
        let deck = PhotoDeck::load_dir(&dir.path().join("absent"), &NetpbmDecoder)
            .await
            .unwrap();
        assert!(deck.is_empty());
    }
}
