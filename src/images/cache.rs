//! Hashes of the images already present in an ad directory

use crate::images::hash::{ImageHash, MAX_DISTANCE};
use crate::Result;
use std::path::Path;

/// File extensions recognised as previously downloaded images
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Perceptual hashes of the images on disk for one ad
#[derive(Debug, Clone, Default)]
pub struct ImageHashCache {
    hashes: Vec<ImageHash>,
}

impl ImageHashCache {
    /// A cache that matches nothing, used when forcing downloads
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a cache from already known hashes
    pub fn from_hashes(hashes: Vec<ImageHash>) -> Self {
        Self { hashes }
    }

    /// Hashes every image file in `dir`
    ///
    /// A missing directory gives an empty cache. Files that cannot be decoded
    /// are logged and left out.
    pub fn scan(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Ok(Self::empty());
        }

        let mut hashes = Vec::new();

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() || !has_image_extension(&path) {
                continue;
            }

            match image::open(&path) {
                Ok(img) => {
                    let hash = ImageHash::difference(&img);
                    tracing::debug!(image = %path.display(), hash = %hash, "caching image from file system");
                    hashes.push(hash);
                }
                Err(e) => {
                    tracing::warn!(image = %path.display(), error = %e, "skipping unreadable image");
                }
            }
        }

        Ok(Self { hashes })
    }

    /// Returns true if any cached hash is close enough to `hash`
    pub fn contains_similar(&self, hash: &ImageHash) -> bool {
        self.hashes.iter().any(|known| {
            let similar = known.similar(hash, MAX_DISTANCE);
            if similar {
                tracing::debug!(
                    image_a = %hash,
                    image_b = %known,
                    distance = hash.distance(known),
                    "found similar image"
                );
            }
            similar
        })
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

/// Returns true if the file extension is one of [`IMAGE_EXTENSIONS`]
pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
