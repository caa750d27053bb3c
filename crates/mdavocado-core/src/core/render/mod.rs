//! Rasterisation of angle samples.
//!
//! - [`density`]: fixed-size 2D density images (Ramachandran/Janin maps).
//! - [`series`]: per-residue angle traces with change-point markers.

pub mod density;
pub mod series;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to write image '{path}': {source}", path = path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Failed to draw plot '{path}': {message}", path = path.display())]
    Plot { path: PathBuf, message: String },
}
