//! Robot session state machine.
//!
//! One session per execution request. The session is created in the primary
//! protocol with the arm taken and the motor enabled, and every exit path
//! must end in [`RobotSession::disconnect`] so the arm is never left held.
//!
//! Protocol discipline: the only legal transitions are the give-arm /
//! take-arm / motor switch sequences, and the secondary surface is reachable
//! solely through the bundled gripper units, which always restore the
//! primary protocol before returning.

use blockpick_core::{JointAngles, Pose, Speed};

use crate::channel::{ChannelProvider, Endpoint, Interpolation, PrimaryChannel, SecondaryChannel};
use crate::error::DriverError;

/// Which control surface currently holds the arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActiveProtocol {
    Primary,
    Secondary,
}

/// A live controller session.
pub struct RobotSession<P: PrimaryChannel, S: SecondaryChannel> {
    primary: P,
    secondary: S,
    protocol: ActiveProtocol,
    authority: String,
}

impl<P: PrimaryChannel, S: SecondaryChannel> RobotSession<P, S> {
    /// Probe, open both channels, and run the connect handshake.
    ///
    /// Result: live session in the primary protocol, arm taken, motor on.
    pub async fn connect<C>(provider: &C, endpoint: &Endpoint) -> Result<Self, DriverError>
    where
        C: ChannelProvider<Primary = P, Secondary = S>,
    {
        provider.probe(endpoint).await?;
        let (mut primary, secondary) = provider.open(endpoint).await?;

        primary.start_service().await?;
        primary.connect_controller().await?;
        primary.take_arm().await?;
        primary.set_motor(true).await?;

        tracing::info!(authority = %endpoint.authority(), "robot session connected");
        Ok(Self {
            primary,
            secondary,
            protocol: ActiveProtocol::Primary,
            authority: endpoint.authority(),
        })
    }

    /// Run the disconnect handshake: motor off, arm released, controller
    /// connection closed, service stopped.
    ///
    /// Must be called on every exit path, including failures earlier in the
    /// sequence.
    pub async fn disconnect(mut self) -> Result<(), DriverError> {
        if self.protocol == ActiveProtocol::Secondary {
            // A failed gripper unit can leave the secondary surface holding
            // the arm; restore the primary protocol before release.
            if let Err(err) = self.switch_to_primary().await {
                tracing::warn!(error = %err, "could not restore primary protocol on disconnect");
            }
        }
        self.primary.set_motor(false).await?;
        self.primary.give_arm().await?;
        self.primary.disconnect_controller().await?;
        self.primary.stop_service().await?;
        tracing::info!(authority = %self.authority, "robot session disconnected");
        Ok(())
    }

    /// Joint-interpolated move to an absolute pose.
    pub async fn move_pose(&mut self, pose: &Pose, speed: Speed) -> Result<(), DriverError> {
        self.ensure_primary("move_pose")?;
        self.primary
            .move_pose(Interpolation::PointToPoint, pose, speed)
            .await
    }

    /// Move that updates only X/Y, preserving height and orientation.
    pub async fn update_xy(&mut self, x: f64, y: f64, speed: Speed) -> Result<(), DriverError> {
        self.ensure_primary("update_xy")?;
        let target = self.primary.current_pose().await?.with_xy(x, y);
        self.primary
            .move_pose(Interpolation::Linear, &target, speed)
            .await
    }

    /// Move that updates only Z, preserving X/Y and orientation.
    pub async fn update_z(&mut self, z: f64, speed: Speed) -> Result<(), DriverError> {
        self.ensure_primary("update_z")?;
        let target = self.primary.current_pose().await?.with_z(z);
        self.primary
            .move_pose(Interpolation::Linear, &target, speed)
            .await
    }

    /// Joint move at the controller's default speed.
    pub async fn move_joints(&mut self, joints: &JointAngles) -> Result<(), DriverError> {
        self.ensure_primary("move_joints")?;
        self.primary.move_joints(joints).await
    }

    pub async fn current_pose(&mut self) -> Result<Pose, DriverError> {
        self.ensure_primary("current_pose")?;
        self.primary.current_pose().await
    }

    pub async fn current_joints(&mut self) -> Result<JointAngles, DriverError> {
        self.ensure_primary("current_joints")?;
        self.primary.current_joints().await
    }

    pub async fn hand_position(&mut self) -> Result<f64, DriverError> {
        self.ensure_primary("hand_position")?;
        self.primary.hand_position().await
    }

    /// Bundled gripper open: switch to secondary, open the hand to the
    /// given aperture, switch back to primary.
    pub async fn open_gripper(&mut self, width_mm: f64, speed: f64) -> Result<(), DriverError> {
        self.ensure_primary("open_gripper")?;
        self.switch_to_secondary().await?;
        let result = self.secondary.open_hand(width_mm, speed).await;
        self.switch_to_primary().await?;
        result
    }

    /// Bundled gripper close: switch to secondary, close the hand with the
    /// given force, switch back to primary.
    pub async fn close_gripper(&mut self, force: f64) -> Result<(), DriverError> {
        self.ensure_primary("close_gripper")?;
        self.switch_to_secondary().await?;
        let result = self.secondary.close_hand(force).await;
        self.switch_to_primary().await?;
        result
    }

    async fn switch_to_secondary(&mut self) -> Result<(), DriverError> {
        self.primary.give_arm().await?;
        self.secondary.take_arm().await?;
        self.secondary.set_motor(true).await?;
        self.protocol = ActiveProtocol::Secondary;
        tracing::debug!("switched to secondary protocol");
        Ok(())
    }

    async fn switch_to_primary(&mut self) -> Result<(), DriverError> {
        self.secondary.give_arm().await?;
        self.primary.take_arm().await?;
        self.primary.set_motor(true).await?;
        self.protocol = ActiveProtocol::Primary;
        tracing::debug!("switched to primary protocol");
        Ok(())
    }

    fn ensure_primary(&self, command: &str) -> Result<(), DriverError> {
        if self.protocol == ActiveProtocol::Primary {
            Ok(())
        } else {
            Err(DriverError::Protocol(format!(
                "{command} requires the primary protocol"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{ChannelSide, SimProvider};
    use std::time::Duration;

    fn endpoint() -> Endpoint {
        Endpoint::new("10.0.0.10", 5007, Duration::from_secs(5))
    }

    #[test]
    fn connect_leaves_primary_with_motor_on() {
        tokio_test::block_on(async {
            let provider = SimProvider::new();
            let session = RobotSession::connect(&provider, &endpoint()).await.unwrap();

            let state = provider.world().snapshot();
            assert!(state.service_running);
            assert!(state.controller_connected);
            assert!(state.motor_on);
            assert_eq!(state.arm_owner, Some(ChannelSide::Primary));
            assert_eq!(state.connects, 1);

            session.disconnect().await.unwrap();
            let state = provider.world().snapshot();
            assert!(!state.service_running);
            assert!(!state.motor_on);
            assert_eq!(state.arm_owner, None);
            assert_eq!(state.disconnects, 1);
        });
    }

    #[test]
    fn gripper_units_restore_primary_protocol() {
        tokio_test::block_on(async {
            let provider = SimProvider::new();
            let mut session = RobotSession::connect(&provider, &endpoint()).await.unwrap();

            session.open_gripper(30.0, 25.0).await.unwrap();
            assert_eq!(
                provider.world().snapshot().arm_owner,
                Some(ChannelSide::Primary)
            );
            assert_eq!(session.hand_position().await.unwrap(), 30.0);

            session.close_gripper(42.0).await.unwrap();
            assert_eq!(provider.world().snapshot().last_close_force, Some(42.0));
            assert_eq!(
                provider.world().snapshot().arm_owner,
                Some(ChannelSide::Primary)
            );

            // Motion still legal after the bundled units.
            session
                .move_pose(&Pose::new(1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 0.0), Speed::Full)
                .await
                .unwrap();
            session.disconnect().await.unwrap();
        });
    }

    #[test]
    fn failed_probe_skips_the_handshake() {
        tokio_test::block_on(async {
            let provider = SimProvider::new().with_unreachable_endpoint();
            let result = RobotSession::connect(&provider, &endpoint()).await;
            assert!(matches!(result, Err(DriverError::ConnectionFailed { .. })));
            // No channel was opened, nothing was touched.
            assert_eq!(provider.opened(), 0);
            assert!(!provider.world().snapshot().service_running);
        });
    }

    #[test]
    fn axis_updates_preserve_the_other_axes() {
        tokio_test::block_on(async {
            let provider = SimProvider::new();
            let mut session = RobotSession::connect(&provider, &endpoint()).await.unwrap();

            session
                .move_pose(
                    &Pose::new(100.0, -50.0, 250.0, 180.0, 0.0, 180.0, 261.0),
                    Speed::Full,
                )
                .await
                .unwrap();
            session.update_z(80.0, Speed::Half).await.unwrap();

            let pose = session.current_pose().await.unwrap();
            assert_eq!(pose.x, 100.0);
            assert_eq!(pose.y, -50.0);
            assert_eq!(pose.z, 80.0);
            assert_eq!(pose.fig, 261.0);

            session.update_xy(10.0, 20.0, Speed::Full).await.unwrap();
            let pose = session.current_pose().await.unwrap();
            assert_eq!((pose.x, pose.y, pose.z), (10.0, 20.0, 80.0));
            session.disconnect().await.unwrap();
        });
    }
}
