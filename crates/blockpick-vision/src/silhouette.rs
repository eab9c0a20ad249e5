//! Reference silhouettes.
//!
//! A silhouette is the filled binary outline of an object seen from the
//! calibration height, cropped to its bounding box with a constant border.
//! Library object records store silhouettes as PNG; the matcher compares
//! against the decoded mask.

use image::GrayImage;

use crate::error::VisionError;
use crate::matcher::{binarize, crop_and_pad, dominant_contour, fill_contour, MatcherConfig};
use crate::moments::{polygon_area, Moments};

/// A decoded reference silhouette with its precomputed descriptors.
#[derive(Debug, Clone)]
pub struct Silhouette {
    pub mask: GrayImage,
    /// Area enclosed by the silhouette contour, px².
    pub contour_area: f64,
    hu: [f64; 7],
}

impl Silhouette {
    /// Build from an already-binary mask (white foreground on black).
    pub fn from_mask(mask: GrayImage) -> Result<Self, VisionError> {
        let contour = dominant_contour(&mask).ok_or(VisionError::EmptySilhouette)?;
        let contour_area = polygon_area(&contour);
        let hu = Moments::of_mask(&mask).hu();
        Ok(Self {
            mask,
            contour_area,
            hu,
        })
    }

    /// Decode from PNG bytes as stored in a library object record.
    pub fn from_png(bytes: &[u8]) -> Result<Self, VisionError> {
        let mask = image::load_from_memory(bytes)?.to_luma8();
        Self::from_mask(mask)
    }

    /// Encode the mask as PNG bytes for a library object record.
    pub fn to_png(&self) -> Result<Vec<u8>, VisionError> {
        let mut bytes = Vec::new();
        image::DynamicImage::ImageLuma8(self.mask.clone())
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)?;
        Ok(bytes)
    }

    /// Precomputed Hu invariants of the mask.
    pub fn hu(&self) -> &[f64; 7] {
        &self.hu
    }
}

/// Extract the dominant foreground silhouette from a captured frame.
///
/// This is how library object shapes are produced at registration time:
/// smooth, binarize, take the largest external contour, fill it, crop to its
/// bounding box, and pad with a constant border.
pub fn extract_silhouette(
    frame: &GrayImage,
    config: &MatcherConfig,
) -> Result<Silhouette, VisionError> {
    let binary = binarize(frame, config);
    let contour = dominant_contour(&binary).ok_or(VisionError::EmptySilhouette)?;
    let mask = fill_contour(frame.width(), frame.height(), &contour);
    let roi = crop_and_pad(&mask, &contour, config.pad);
    Silhouette::from_mask(roi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::tests::{frame_with_rect, test_config};

    #[test]
    fn extracted_silhouette_is_cropped_and_padded() {
        let silhouette = extract_silhouette(&frame_with_rect(50, 60, 40, 30), &test_config())
            .expect("silhouette");
        let pad = test_config().pad;
        // Bounding box of the contour plus the border on each side.
        assert_eq!(silhouette.mask.width(), 40 + 2 * pad);
        assert_eq!(silhouette.mask.height(), 30 + 2 * pad);
        assert!(silhouette.contour_area > 0.0);
    }

    #[test]
    fn png_round_trip_preserves_descriptors() {
        let silhouette =
            extract_silhouette(&frame_with_rect(50, 60, 40, 30), &test_config()).unwrap();
        let bytes = silhouette.to_png().unwrap();
        let decoded = Silhouette::from_png(&bytes).unwrap();
        assert_eq!(decoded.contour_area, silhouette.contour_area);
        assert_eq!(decoded.hu(), silhouette.hu());
    }

    #[test]
    fn silhouette_of_own_source_frame_matches_itself() {
        let frame = frame_with_rect(80, 40, 36, 52);
        let silhouette = extract_silhouette(&frame, &test_config()).unwrap();
        let decision =
            crate::matcher::match_silhouette(&frame, &silhouette, &test_config());
        assert!(decision.is_match());
    }
}
