//! Image moments over binary masks.
//!
//! The matcher compares silhouettes through Hu moment invariants and locates
//! matched objects through first- and second-order moments of the candidate
//! mask. Pixels with any nonzero intensity count as foreground.

use image::GrayImage;
use imageproc::point::Point;

/// Hu terms smaller than this are treated as numerically empty and skipped
/// by the distance sum.
const HU_EPSILON: f64 = 1e-5;

/// Raw spatial moments up to third order.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
    pub m20: f64,
    pub m11: f64,
    pub m02: f64,
    pub m30: f64,
    pub m21: f64,
    pub m12: f64,
    pub m03: f64,
}

impl Moments {
    /// Accumulate moments over the foreground of a binary mask.
    pub fn of_mask(mask: &GrayImage) -> Self {
        let mut m = Moments::default();
        for (x, y, pixel) in mask.enumerate_pixels() {
            if pixel.0[0] == 0 {
                continue;
            }
            let x = f64::from(x);
            let y = f64::from(y);
            m.m00 += 1.0;
            m.m10 += x;
            m.m01 += y;
            m.m20 += x * x;
            m.m11 += x * y;
            m.m02 += y * y;
            m.m30 += x * x * x;
            m.m21 += x * x * y;
            m.m12 += x * y * y;
            m.m03 += y * y * y;
        }
        m
    }

    /// Foreground area in pixels.
    pub fn area(&self) -> f64 {
        self.m00
    }

    /// Centroid in image coordinates, `None` for an empty mask.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.m00 == 0.0 {
            None
        } else {
            Some((self.m10 / self.m00, self.m01 / self.m00))
        }
    }

    /// Central moments (mu20, mu11, mu02, mu30, mu21, mu12, mu03).
    fn central(&self) -> [f64; 7] {
        let cx = self.m10 / self.m00;
        let cy = self.m01 / self.m00;
        let mu20 = self.m20 - cx * self.m10;
        let mu11 = self.m11 - cx * self.m01;
        let mu02 = self.m02 - cy * self.m01;
        let mu30 = self.m30 - 3.0 * cx * self.m20 + 2.0 * cx * cx * self.m10;
        let mu21 = self.m21 - 2.0 * cx * self.m11 - cy * self.m20 + 2.0 * cx * cx * self.m01;
        let mu12 = self.m12 - 2.0 * cy * self.m11 - cx * self.m02 + 2.0 * cy * cy * self.m10;
        let mu03 = self.m03 - 3.0 * cy * self.m02 + 2.0 * cy * cy * self.m01;
        [mu20, mu11, mu02, mu30, mu21, mu12, mu03]
    }

    /// Major-axis orientation of the foreground, degrees in `[0, 180)`.
    ///
    /// Derived from the second-order central moments; the moments-based
    /// equivalent of a fitted-ellipse angle.
    pub fn orientation_deg(&self) -> f64 {
        let [mu20, mu11, mu02, ..] = self.central();
        let mut angle = 0.5 * (2.0 * mu11).atan2(mu20 - mu02).to_degrees();
        if angle < 0.0 {
            angle += 180.0;
        }
        angle
    }

    /// The seven Hu moment invariants.
    pub fn hu(&self) -> [f64; 7] {
        let [mu20, mu11, mu02, mu30, mu21, mu12, mu03] = self.central();
        let norm2 = self.m00 * self.m00;
        let norm3 = self.m00.powf(2.5);
        let n20 = mu20 / norm2;
        let n11 = mu11 / norm2;
        let n02 = mu02 / norm2;
        let n30 = mu30 / norm3;
        let n21 = mu21 / norm3;
        let n12 = mu12 / norm3;
        let n03 = mu03 / norm3;

        let s1 = n30 + n12;
        let s2 = n21 + n03;
        let d1 = n30 - 3.0 * n12;
        let d2 = 3.0 * n21 - n03;

        [
            n20 + n02,
            (n20 - n02).powi(2) + 4.0 * n11 * n11,
            d1 * d1 + d2 * d2,
            s1 * s1 + s2 * s2,
            d1 * s1 * (s1 * s1 - 3.0 * s2 * s2) + d2 * s2 * (3.0 * s1 * s1 - s2 * s2),
            (n20 - n02) * (s1 * s1 - s2 * s2) + 4.0 * n11 * s1 * s2,
            d2 * s1 * (s1 * s1 - 3.0 * s2 * s2) - d1 * s2 * (3.0 * s1 * s1 - s2 * s2),
        ]
    }
}

/// Log-signed Hu distance between two silhouettes; lower means more similar.
///
/// Terms where either invariant is numerically empty are skipped, so the
/// metric degrades gracefully for near-symmetric shapes.
pub fn hu_shape_distance(a: &[f64; 7], b: &[f64; 7]) -> f64 {
    let mut distance = 0.0;
    for (ha, hb) in a.iter().zip(b.iter()) {
        if ha.abs() > HU_EPSILON && hb.abs() > HU_EPSILON {
            let ma = ha.signum() * ha.abs().log10();
            let mb = hb.signum() * hb.abs().log10();
            distance += (ma - mb).abs();
        }
    }
    distance
}

/// Shoelace area of a closed pixel contour.
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut doubled = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        doubled += i64::from(p.x) * i64::from(q.y) - i64::from(q.x) * i64::from(p.y);
    }
    doubled.abs() as f64 / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn rect_mask(width: u32, height: u32, x0: u32, y0: u32, w: u32, h: u32) -> GrayImage {
        let mut mask = GrayImage::new(width, height);
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                mask.put_pixel(x, y, Luma([255u8]));
            }
        }
        mask
    }

    #[test]
    fn centroid_of_rectangle_is_its_center() {
        let mask = rect_mask(100, 100, 20, 30, 40, 20);
        let m = Moments::of_mask(&mask);
        let (cx, cy) = m.centroid().unwrap();
        assert!((cx - 39.5).abs() < 1e-9);
        assert!((cy - 39.5).abs() < 1e-9);
        assert_eq!(m.area(), 800.0);
    }

    #[test]
    fn empty_mask_has_no_centroid() {
        let mask = GrayImage::new(10, 10);
        assert!(Moments::of_mask(&mask).centroid().is_none());
    }

    #[test]
    fn orientation_follows_the_major_axis() {
        let wide = Moments::of_mask(&rect_mask(120, 120, 10, 50, 80, 10));
        assert!(wide.orientation_deg() < 1.0 || wide.orientation_deg() > 179.0);

        let tall = Moments::of_mask(&rect_mask(120, 120, 50, 10, 10, 80));
        assert!((tall.orientation_deg() - 90.0).abs() < 1.0);
    }

    #[test]
    fn hu_distance_is_zero_for_identical_masks() {
        let m = Moments::of_mask(&rect_mask(100, 100, 20, 20, 30, 30));
        assert_eq!(hu_shape_distance(&m.hu(), &m.hu()), 0.0);
    }

    #[test]
    fn hu_distance_is_translation_invariant() {
        let a = Moments::of_mask(&rect_mask(200, 200, 10, 10, 40, 25)).hu();
        let b = Moments::of_mask(&rect_mask(200, 200, 120, 140, 40, 25)).hu();
        assert!(hu_shape_distance(&a, &b) < 1e-9);
    }

    #[test]
    fn hu_distance_separates_dissimilar_shapes() {
        let square = Moments::of_mask(&rect_mask(200, 200, 50, 50, 60, 60)).hu();
        let sliver = Moments::of_mask(&rect_mask(200, 200, 20, 90, 160, 12)).hu();
        assert!(hu_shape_distance(&square, &sliver) > 0.075);
    }

    #[test]
    fn shoelace_area_of_a_square() {
        let points = [
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        assert_eq!(polygon_area(&points), 100.0);
        assert_eq!(polygon_area(&points[..2]), 0.0);
    }
}
