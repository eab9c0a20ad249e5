//! Vision errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("frame capture failed: {0}")]
    Capture(String),

    #[error("no foreground contour in silhouette source")]
    EmptySilhouette,
}
