//! The agent loop: owns the pose (via a [`RobotCapability`]), drives the
//! sensor driver, feeds the exploration planner, and executes whatever
//! primitive it returns until exploration completes or shutdown fires.

use crate::datapoint::{ControlMessage, DataPoint, Observation};
use crate::error::SlamResult;
use crate::geometry::Pose;
use crate::planner::{ExplorationPlanner, MotionPrimitive};
use crate::robot::RobotCapability;
use crate::sensor::ObservationEvent;
use crate::visualization::VisualizationEvent;
use crate::world::ObservedWorld;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tracing::info;

pub struct AgentLoop<R> {
    robot: R,
    world: ObservedWorld,
    planner: ExplorationPlanner,
    scan_signal: Arc<Notify>,
    shutdown: Arc<AtomicBool>,
    observations: mpsc::Receiver<ObservationEvent>,
    visualization: mpsc::Sender<VisualizationEvent>,
}

impl<R: RobotCapability> AgentLoop<R> {
    pub fn new(
        robot: R,
        world: ObservedWorld,
        planner: ExplorationPlanner,
        scan_signal: Arc<Notify>,
        shutdown: Arc<AtomicBool>,
        observations: mpsc::Receiver<ObservationEvent>,
        visualization: mpsc::Sender<VisualizationEvent>,
    ) -> Self {
        Self {
            robot,
            world,
            planner,
            scan_signal,
            shutdown,
            observations,
            visualization,
        }
    }

    /// Runs ticks until the exploration planner reports completion or
    /// shutdown is raised, then sets the sensor's shutdown flag too.
    pub async fn run(&mut self) -> SlamResult<()> {
        while !self.shutdown.load(Ordering::Relaxed) {
            if !self.tick().await? {
                break;
            }
        }
        self.shutdown.store(true, Ordering::Relaxed);
        info!("agent loop shutting down");
        Ok(())
    }

    /// One iteration of the loop. Returns `false` once exploration is
    /// complete (no further ticks should run).
    async fn tick(&mut self) -> SlamResult<bool> {
        self.run_scan().await?;

        let pose = self.robot.pose();
        let (primitive, emitted) =
            self.planner
                .plan_next_primitive(&mut self.world, &pose, &self.shutdown);
        for event in emitted {
            let _ = self.send(event).await;
        }

        let Some(primitive) = primitive else {
            return Ok(false);
        };

        // Politely wait for the visualization consumer to catch up before
        // committing to the next motion: a bounded channel's `reserve`
        // blocks until the receiver has made room.
        if let Ok(permit) = self.visualization.reserve().await {
            drop(permit);
        }
        if self.shutdown.load(Ordering::Relaxed) {
            return Ok(false);
        }

        self.execute(primitive).await?;

        let pose_after = self.robot.pose();
        self.send(VisualizationEvent::Data(DataPoint::pose(pose_after.position())))
            .await?;
        self.send(VisualizationEvent::Control(ControlMessage::DeleteTemporaryData))
            .await?;

        Ok(true)
    }

    async fn run_scan(&mut self) -> SlamResult<()> {
        self.scan_signal.notify_one();
        let pose = self.robot.pose();

        while let Some(event) = self.observations.recv().await {
            match event {
                ObservationEvent::ScanComplete => break,
                ObservationEvent::Measurement { polar, kind } => {
                    let location = pose.position().plus_polar(&polar);
                    let observation = Observation::new(location, kind);
                    self.world.add_observation(&pose, observation);
                    let _ = self
                        .send(VisualizationEvent::Data(DataPoint::observation(location)))
                        .await;
                }
            }
        }
        Ok(())
    }

    async fn execute(&mut self, primitive: MotionPrimitive) -> SlamResult<()> {
        match primitive {
            MotionPrimitive::Move { distance } => {
                self.robot.move_forward(distance).await?;
            }
            MotionPrimitive::RotateThenMove { delta, distance } => {
                self.robot.rotate(delta.in_degrees()).await?;
                self.robot.move_forward(distance).await?;
            }
        }
        Ok(())
    }

    async fn send(&self, event: VisualizationEvent) -> SlamResult<()> {
        let _ = self.visualization.send(event).await;
        Ok(())
    }
}
