//! The robot capability layer: a `Simulated` variant that ray-casts
//! against an in-process [`SimulatedWorld`] and a `Lego` variant that
//! mirrors every motion call onto the wire.

use crate::error::SlamResult;
use crate::geometry::Pose;
use crate::wire::{Command, WireConnection};
use crate::world::SimulatedWorld;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::info;

/// Which concrete backend a [`RobotCapability`] implementor is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotKind {
    Simulated,
    Lego,
}

/// Shared surface both robot variants expose to the agent loop. Motion is
/// synchronous from the caller's point of view; `Lego` additionally
/// round-trips over the wire.
#[async_trait::async_trait]
pub trait RobotCapability {
    fn kind(&self) -> RobotKind;
    fn pose(&self) -> Pose;

    async fn move_forward(&mut self, distance: f64) -> SlamResult<()>;
    async fn rotate(&mut self, angle: f64) -> SlamResult<()>;

    /// Ranges along `measuring_angle_deg` (relative to current
    /// orientation), capped at `max_distance`.
    async fn range(&mut self, measuring_angle_deg: f64, max_distance: f64) -> SlamResult<f64>;
}

/// Drives a [`SimulatedWorld`] ray-caster; never touches the wire.
pub struct SimulatedRobot {
    pose: Pose,
    world: SimulatedWorld,
}

impl SimulatedRobot {
    pub fn new(pose: Pose, world: SimulatedWorld) -> Self {
        Self { pose, world }
    }
}

#[async_trait::async_trait]
impl RobotCapability for SimulatedRobot {
    fn kind(&self) -> RobotKind {
        RobotKind::Simulated
    }

    fn pose(&self) -> Pose {
        self.pose
    }

    async fn move_forward(&mut self, distance: f64) -> SlamResult<()> {
        info!(distance, "move forward (simulated)");
        self.pose.move_forward(distance);
        Ok(())
    }

    async fn rotate(&mut self, angle: f64) -> SlamResult<()> {
        info!(angle, "rotate (simulated)");
        self.pose.rotate(angle);
        Ok(())
    }

    async fn range(&mut self, measuring_angle_deg: f64, max_distance: f64) -> SlamResult<f64> {
        Ok(self.world.cast_ray(&self.pose, measuring_angle_deg, max_distance))
    }
}

/// Owns a [`WireConnection`] and mirrors every motion call onto it as
/// `MOVE`/`ROTATE` lines, per the agent loop's step 4.
pub struct LegoRobot<S> {
    pose: Pose,
    wire: WireConnection<S>,
}

impl<S> LegoRobot<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(pose: Pose, wire: WireConnection<S>) -> Self {
        Self { pose, wire }
    }
}

#[async_trait::async_trait]
impl<S> RobotCapability for LegoRobot<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    fn kind(&self) -> RobotKind {
        RobotKind::Lego
    }

    fn pose(&self) -> Pose {
        self.pose
    }

    async fn move_forward(&mut self, distance: f64) -> SlamResult<()> {
        info!(distance, "move forward (lego)");
        self.wire.send_command(&Command::Move { distance }).await?;
        self.pose.move_forward(distance);
        Ok(())
    }

    async fn rotate(&mut self, angle: f64) -> SlamResult<()> {
        info!(angle, "rotate (lego)");
        self.wire.send_command(&Command::Rotate { angle }).await?;
        self.pose.rotate(angle);
        Ok(())
    }

    async fn range(&mut self, measuring_angle_deg: f64, max_distance: f64) -> SlamResult<f64> {
        self.wire
            .send_command(&Command::RotateSensor {
                angle: measuring_angle_deg,
            })
            .await?;
        let measurements = self.wire.receive_scan().await?;
        Ok(measurements
            .first()
            .map(|m| m.polar.radius)
            .unwrap_or(max_distance))
    }
}
