//! Silhouette matcher.
//!
//! Decides whether the dominant foreground of a captured frame is the
//! reference object, and where it sits. The area gate runs before any shape
//! computation: a candidate whose area is far from the reference area means
//! "no object here", not a bad match.

use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::drawing::draw_polygon_mut;
use imageproc::filter::bilateral_filter;
use imageproc::point::Point;
use serde::{Deserialize, Serialize};

use crate::moments::{hu_shape_distance, polygon_area, Moments};
use crate::silhouette::Silhouette;

/// Matcher tuning. Defaults match the calibrated workcell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Maximum |candidate − reference| contour area, px².
    pub area_tolerance: f64,
    /// Maximum accepted shape distance.
    pub shape_tolerance: f64,
    /// Constant border around the cropped candidate silhouette, px.
    pub pad: u32,
    /// Bilateral smoothing window, px.
    pub smooth_window: u32,
    /// Bilateral intensity sigma.
    pub smooth_sigma_color: f32,
    /// Bilateral spatial sigma.
    pub smooth_sigma_spatial: f32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            area_tolerance: 40_000.0,
            shape_tolerance: 0.075,
            pad: 15,
            smooth_window: 15,
            smooth_sigma_color: 71.0,
            smooth_sigma_spatial: 51.0,
        }
    }
}

/// Location of a matched object in the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchData {
    /// Centroid of the candidate silhouette, image coordinates.
    pub centroid: (f64, f64),
    /// Major-axis angle of the candidate silhouette, degrees `[0, 180)`.
    pub ellipse_angle: f64,
}

/// Outcome of matching one frame against one reference silhouette.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchDecision {
    /// No foreground contour at all.
    NoCandidate,
    /// Dominant contour rejected by the area gate; shape distance was never
    /// computed.
    AreaRejected { area_diff: f64 },
    /// Area plausible but the silhouette shape does not match.
    ShapeRejected { distance: f64 },
    Matched(MatchData),
}

impl MatchDecision {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchDecision::Matched(_))
    }

    pub fn data(&self) -> Option<&MatchData> {
        match self {
            MatchDecision::Matched(data) => Some(data),
            _ => None,
        }
    }
}

/// Match a captured frame against a reference silhouette.
pub fn match_silhouette(
    frame: &GrayImage,
    reference: &Silhouette,
    config: &MatcherConfig,
) -> MatchDecision {
    let binary = binarize(frame, config);
    let Some(contour) = dominant_contour(&binary) else {
        return MatchDecision::NoCandidate;
    };

    let candidate_area = polygon_area(&contour);
    let area_diff = (candidate_area - reference.contour_area).abs();
    if area_diff > config.area_tolerance {
        tracing::debug!(candidate_area, area_diff, "candidate rejected by area gate");
        return MatchDecision::AreaRejected { area_diff };
    }

    let mask = fill_contour(frame.width(), frame.height(), &contour);
    let roi = crop_and_pad(&mask, &contour, config.pad);
    let distance = hu_shape_distance(&Moments::of_mask(&roi).hu(), reference.hu());
    if distance.abs() >= config.shape_tolerance {
        tracing::debug!(distance, "candidate rejected by shape distance");
        return MatchDecision::ShapeRejected { distance };
    }

    let moments = Moments::of_mask(&mask);
    let Some(centroid) = moments.centroid() else {
        return MatchDecision::NoCandidate;
    };
    MatchDecision::Matched(MatchData {
        centroid,
        ellipse_angle: moments.orientation_deg(),
    })
}

/// Smooth and binarize a frame with inverted polarity: objects are darker
/// than the work surface, so the foreground comes out white.
pub(crate) fn binarize(frame: &GrayImage, config: &MatcherConfig) -> GrayImage {
    let smoothed = bilateral_filter(
        frame,
        config.smooth_window,
        config.smooth_sigma_color,
        config.smooth_sigma_spatial,
    );
    let level = otsu_level(&smoothed);
    threshold(&smoothed, level, ThresholdType::BinaryInverted)
}

/// The external contour with the largest enclosed area.
pub(crate) fn dominant_contour(binary: &GrayImage) -> Option<Vec<Point<i32>>> {
    find_contours::<i32>(binary)
        .into_iter()
        .filter(|contour| contour.border_type == BorderType::Outer)
        .map(|contour| contour.points)
        .max_by(|a, b| polygon_area(a).total_cmp(&polygon_area(b)))
        .filter(|points| points.len() >= 3)
}

/// Rasterize a contour as a filled full-frame mask.
pub(crate) fn fill_contour(width: u32, height: u32, contour: &[Point<i32>]) -> GrayImage {
    let mut canvas = GrayImage::new(width, height);
    let mut polygon = contour.to_vec();
    if polygon.len() > 1 && polygon.first() == polygon.last() {
        polygon.pop();
    }
    if polygon.len() >= 3 {
        draw_polygon_mut(&mut canvas, &polygon, Luma([255u8]));
    }
    canvas
}

/// Crop the mask to the contour's bounding box and add a constant border.
pub(crate) fn crop_and_pad(mask: &GrayImage, contour: &[Point<i32>], pad: u32) -> GrayImage {
    let min_x = contour.iter().map(|p| p.x).min().unwrap_or(0).max(0) as u32;
    let min_y = contour.iter().map(|p| p.y).min().unwrap_or(0).max(0) as u32;
    let max_x = contour.iter().map(|p| p.x).max().unwrap_or(0).max(0) as u32;
    let max_y = contour.iter().map(|p| p.y).max().unwrap_or(0).max(0) as u32;
    let width = (max_x - min_x + 1).min(mask.width() - min_x);
    let height = (max_y - min_y + 1).min(mask.height() - min_y);

    let roi = image::imageops::crop_imm(mask, min_x, min_y, width, height).to_image();
    let mut padded = GrayImage::new(width + 2 * pad, height + 2 * pad);
    image::imageops::replace(&mut padded, &roi, i64::from(pad), i64::from(pad));
    padded
}
