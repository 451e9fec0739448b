//! Difference hash (dHash) of an image
//!
//! The image is reduced to a 9x8 grayscale thumbnail and every pixel is
//! compared with its right neighbour, giving 64 bits. Re-encoding or
//! recompressing an image flips few of them, so the bit distance between two
//! hashes tells whether they show the same picture.

use image::imageops::FilterType;
use image::DynamicImage;
use std::fmt;

/// Hashes closer than this many bits are considered the same image
pub const MAX_DISTANCE: u32 = 3;

const HASH_WIDTH: u32 = 8;
const HASH_HEIGHT: u32 = 8;

/// A 64-bit difference hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHash(pub u64);

impl ImageHash {
    /// Computes the difference hash of a decoded image
    pub fn difference(image: &DynamicImage) -> Self {
        let thumb = image::imageops::resize(
            &image.to_luma8(),
            HASH_WIDTH + 1,
            HASH_HEIGHT,
            FilterType::Triangle,
        );

        let mut bits = 0u64;
        let mut idx = 0;
        for y in 0..HASH_HEIGHT {
            for x in 0..HASH_WIDTH {
                let left = thumb.get_pixel(x, y)[0];
                let right = thumb.get_pixel(x + 1, y)[0];
                if left < right {
                    bits |= 1 << (63 - idx);
                }
                idx += 1;
            }
        }

        Self(bits)
    }

    /// Number of differing bits between two hashes
    pub fn distance(&self, other: &ImageHash) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    /// Returns true if both hashes are within `threshold` (exclusive)
    pub fn similar(&self, other: &ImageHash, threshold: u32) -> bool {
        self.distance(other) < threshold
    }
}

impl fmt::Display for ImageHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d:{}", hex::encode(self.0.to_be_bytes()))
    }
}
