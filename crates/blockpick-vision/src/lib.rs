//! # Blockpick Vision
//!
//! Shape-based object localization for the blockpick execution engine.
//!
//! The pipeline stages are:
//!
//! 1. **Smooth** – edge-preserving bilateral filtering of the captured frame.
//! 2. **Binarize** – automatic Otsu thresholding with inverted polarity
//!    (objects are darker than the work surface).
//! 3. **Contours** – external contour extraction, dominant candidate by area.
//! 4. **Gate** – candidate area compared against the reference silhouette
//!    area before any shape computation.
//! 5. **Match** – log-signed Hu-moment distance between the padded candidate
//!    silhouette and the reference silhouette.
//! 6. **Locate** – centroid and major-axis angle from the candidate's image
//!    moments, for the geometry correction downstream.

pub mod error;
pub mod frame;
pub mod matcher;
pub mod moments;
pub mod silhouette;

pub use error::VisionError;
pub use frame::{CaptureOptions, FrameSource, StaticFrameSource};
pub use matcher::{match_silhouette, MatchData, MatchDecision, MatcherConfig};
pub use moments::{hu_shape_distance, polygon_area, Moments};
pub use silhouette::{extract_silhouette, Silhouette};
