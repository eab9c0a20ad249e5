//! Object search procedure.
//!
//! The workspace is scanned from a ring of six fixed calibration poses with
//! overlapping camera views, indexed 0..5 with the home pose at index 0. A
//! search starts at the quadrant of the last success (temporal locality:
//! the next object is usually near the previous one) and walks the ring at
//! most once. On a match the robot pose is corrected from the matched
//! centroid and the gripper closes on the object.

use blockpick_config::GripperConfig;
use blockpick_core::{corrected_orientation, robot_frame_from_polar, Calibration, ObjectSpec, Pose, Speed};
use blockpick_driver::{PrimaryChannel, RobotSession, SecondaryChannel};
use blockpick_vision::{match_silhouette, CaptureOptions, FrameSource, MatcherConfig, Silhouette};

use crate::error::ExecError;

/// Number of poses in the scan ring.
pub const RING_SIZE: usize = 6;

/// Index of the last successful quadrant, carried across searches within
/// one program execution. Discarded at the end of the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchCursor(pub usize);

/// Borrowed configuration for one search.
pub struct SearchContext<'a> {
    pub calibration: &'a Calibration,
    pub ring: &'a [Pose; RING_SIZE],
    pub matcher: &'a MatcherConfig,
    pub gripper: &'a GripperConfig,
}

/// Result of one ring scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOutcome {
    pub found: bool,
    /// Quadrant of the match when found; the incoming cursor otherwise.
    pub cursor: SearchCursor,
}

/// Scan the ring for the object and grip it on a match.
///
/// Per quadrant: move there, read the Cartesian pose and the base joint
/// angle (sign-inverted), capture a white-balanced frame, and run the
/// matcher. On a match the corrections apply in order: wrist yaw first,
/// then X/Y at full speed, then descend to the object height at half
/// speed, then the bundled gripper close with the scaled grip force.
pub async fn search_object<P, S, F>(
    session: &mut RobotSession<P, S>,
    frames: &mut F,
    ctx: &SearchContext<'_>,
    object: &ObjectSpec,
    cursor: SearchCursor,
) -> Result<SearchOutcome, ExecError>
where
    P: PrimaryChannel,
    S: SecondaryChannel,
    F: FrameSource + ?Sized,
{
    let reference = Silhouette::from_png(&object.shape_png)?;
    let mut quadrant = cursor.0 % RING_SIZE;

    for _attempt in 0..RING_SIZE {
        session.move_pose(&ctx.ring[quadrant], Speed::Full).await?;
        let pose = session.current_pose().await?;
        let joints = session.current_joints().await?;
        let robot_angle = -joints.base();

        let frame = frames.capture(&CaptureOptions::with_white_balance()).await?;
        let decision = match_silhouette(&frame, &reference, ctx.matcher);
        let Some(data) = decision.data().copied() else {
            tracing::debug!(object = %object.reference.name, quadrant, ?decision, "no match in quadrant");
            quadrant = (quadrant + 1) % RING_SIZE;
            continue;
        };

        tracing::info!(object = %object.reference.name, quadrant, "object matched");

        let (radius, polar_angle) =
            ctx.calibration
                .polar_from_pixel(robot_angle, data.centroid.0, data.centroid.1);
        let corrected = corrected_orientation(data.ellipse_angle, robot_angle);

        // Yaw correction first: the wrist follows the object's major axis
        // while X/Y still point at the quadrant pose.
        let current = session.current_joints().await?;
        let target = current.with_yaw(corrected + current.base());
        session.move_joints(&target).await?;

        let (x, y) = robot_frame_from_polar(polar_angle, pose.x, pose.y, radius);
        session.update_xy(x, y, Speed::Full).await?;
        session.update_z(object.height_mm, Speed::Half).await?;
        session
            .close_gripper(object.grip_force * ctx.gripper.force_scale)
            .await?;

        return Ok(SearchOutcome {
            found: true,
            cursor: SearchCursor(quadrant),
        });
    }

    tracing::info!(object = %object.reference.name, "ring scan exhausted without a match");
    Ok(SearchOutcome {
        found: false,
        cursor,
    })
}
