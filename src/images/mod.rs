//! Image module: perceptual hashing and the per-ad download pipeline
//!
//! # Components
//!
//! - `ImageHash`: 64-bit difference hash with bit-distance comparison
//! - `ImageHashCache`: hashes of the images already on disk for one ad
//! - `ImagePipeline`: concurrent download, dedup and write of an ad's images

mod cache;
mod hash;
mod pipeline;

pub use cache::{has_image_extension, ImageHashCache, IMAGE_EXTENSIONS};
pub use hash::{ImageHash, MAX_DISTANCE};
pub use pipeline::{
    extension, throttle_delay, ImageOutcome, ImagePipeline, ImageRecord, ImageReport,
};
