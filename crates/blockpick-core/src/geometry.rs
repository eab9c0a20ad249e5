//! Camera-to-gripper geometry.
//!
//! The overhead camera is mounted at a fixed offset from the gripper axis.
//! These functions convert a pixel centroid seen by the camera into a polar
//! offset around the gripper and then into robot-frame coordinates, and
//! compute the wrist yaw correction that aligns the gripper with an
//! elongated object.
//!
//! All calibration values travel in an explicit [`Calibration`] struct so
//! tests can substitute fixtures; nothing here reads process-wide state.

use serde::{Deserialize, Serialize};

/// Fixed camera/workcell calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Pixels per millimetre at the calibration height.
    pub pix_mm_ratio: f64,
    /// Distance from the camera's optical axis to the gripper axis, mm.
    pub camera_offset_mm: f64,
    /// Captured frame width in pixels.
    pub frame_width: u32,
    /// Captured frame height in pixels.
    pub frame_height: u32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            pix_mm_ratio: 9.222,
            camera_offset_mm: 52.385_709_259_836_08,
            frame_width: 1920,
            frame_height: 1080,
        }
    }
}

impl Calibration {
    /// Recenter image coordinates onto the optical axis.
    ///
    /// Image rows grow downward; the cartesian Y axis grows upward, so the
    /// row axis is flipped.
    pub fn pixel_to_cartesian(&self, img_x: f64, img_y: f64) -> (f64, f64) {
        let x = img_x - f64::from(self.frame_width) / 2.0;
        let y = -img_y + f64::from(self.frame_height) / 2.0;
        (x, y)
    }

    /// Polar offset of a pixel centroid around the gripper axis.
    ///
    /// `robot_angle` is the current base-joint angle in degrees (already
    /// sign-corrected by the caller). Returns `(radius_mm, angle_deg)`.
    ///
    /// Away from the vertical axis this solves the triangle between the
    /// camera-to-gripper offset and the pixel vector with the law of
    /// cosines. The enclosed angle and the composition of the correction
    /// onto `robot_angle` differ per sign quadrant of `(x, y)` — the
    /// triangle's orientation flips — so the four cases stay separate.
    /// Within one pixel-to-mm unit of the axis the offset degenerates to a
    /// radial shift along the calibrated offset direction.
    pub fn polar_from_pixel(&self, robot_angle: f64, img_x: f64, img_y: f64) -> (f64, f64) {
        let (x, y) = self.pixel_to_cartesian(img_x, img_y);
        let offset = self.camera_offset_mm;

        if x.abs() <= self.pix_mm_ratio.ceil() {
            return (offset + y / self.pix_mm_ratio, robot_angle);
        }

        let pixel_radius = (x * x + y * y).sqrt() / self.pix_mm_ratio;
        let pixel_angle = y.atan2(x).to_degrees();

        let (enclosed, widdershins) = if x > 0.0 && y < 0.0 {
            (90.0 - pixel_angle.abs(), false)
        } else if x > 0.0 {
            (90.0 + pixel_angle, false)
        } else if y >= 0.0 {
            (360.0 - (pixel_angle.abs() + 90.0), true)
        } else {
            ((pixel_angle + 90.0).abs(), true)
        };

        let radius = (offset * offset + pixel_radius * pixel_radius
            - 2.0 * pixel_radius * offset * enclosed.to_radians().cos())
        .sqrt();
        let correction = ((pixel_radius / radius) * enclosed.to_radians().sin())
            .asin()
            .to_degrees();

        let angle = if widdershins {
            robot_angle - correction
        } else {
            robot_angle + correction
        };
        (radius, angle)
    }
}

/// Add a polar offset to the current gripper origin.
///
/// The robot Y axis opposes the polar convention used by
/// [`Calibration::polar_from_pixel`], hence the negated sine.
pub fn robot_frame_from_polar(angle: f64, origin_x: f64, origin_y: f64, radius: f64) -> (f64, f64) {
    let offset_x = radius * angle.to_radians().cos();
    let offset_y = -radius * angle.to_radians().sin();
    (origin_x + offset_x, origin_y + offset_y)
}

/// Wrist yaw correction aligning the gripper with a matched object.
///
/// `ellipse_angle` is the object's fitted-ellipse angle in `[0°, 180°)`;
/// `joint_angle` the current sign-corrected base-joint angle. The branch
/// structure keeps the rotation on the shortest arc; the formulas are
/// empirically calibrated and reproduced verbatim.
pub fn corrected_orientation(ellipse_angle: f64, joint_angle: f64) -> f64 {
    if ellipse_angle <= 90.0 {
        if joint_angle <= 0.0 {
            joint_angle + ellipse_angle
        } else if ellipse_angle >= 50.0 {
            let beta = 90.0 - ellipse_angle;
            let gamma = 90.0 - joint_angle;
            -(gamma + beta)
        } else {
            joint_angle + ellipse_angle
        }
    } else if joint_angle > 0.0 {
        let beta = 180.0 - ellipse_angle;
        joint_angle - beta
    } else if ellipse_angle <= 160.0 {
        joint_angle + ellipse_angle
    } else {
        let beta = 180.0 - ellipse_angle;
        joint_angle - beta
    }
}
