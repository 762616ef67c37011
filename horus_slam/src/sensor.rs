//! The sensor driver: a separately scheduled producer that fans a scan out
//! into the observation queue and signals completion with a sentinel.

use crate::datapoint::ObservationType;
use crate::error::SlamResult;
use crate::geometry::{Angle, Polar};
use crate::robot::RobotCapability;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tracing::info;

/// Margin subtracted from `max_distance` when a range is capped, so the
/// reported point sits just inside the sensor's limit rather than on it.
const SAFETY_DISTANCE: f64 = 1.0;

/// One item placed on the observation queue by the sensor driver.
#[derive(Debug, Clone, Copy)]
pub enum ObservationEvent {
    Measurement { polar: Polar, kind: ObservationType },
    ScanComplete,
}

#[derive(Debug, Clone, Copy)]
pub struct SensorConfig {
    pub view_angle: f64,
    pub precision: f64,
    pub max_distance: Option<f64>,
}

/// Runs until `shutdown` is raised, waiting on `scan_signal` between scans
/// and fanning each completed scan into `observations`.
pub struct SensorDriver {
    config: SensorConfig,
    scan_signal: Arc<Notify>,
    shutdown: Arc<AtomicBool>,
}

impl SensorDriver {
    pub fn new(config: SensorConfig, scan_signal: Arc<Notify>, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            config,
            scan_signal,
            shutdown,
        }
    }

    /// Drives `robot` until shutdown, emitting a full fan of measurements
    /// into `observations` every time `scan_signal` fires.
    pub async fn run<R: RobotCapability>(
        &self,
        robot: &mut R,
        observations: mpsc::Sender<ObservationEvent>,
    ) -> SlamResult<()> {
        while !self.shutdown.load(Ordering::Relaxed) {
            self.scan_signal.notified().await;
            if self.shutdown.load(Ordering::Relaxed) {
                break;
            }
            self.scan_once(robot, &observations).await?;
        }
        info!("sensor driver shutting down");
        Ok(())
    }

    async fn scan_once<R: RobotCapability>(
        &self,
        robot: &mut R,
        observations: &mpsc::Sender<ObservationEvent>,
    ) -> SlamResult<()> {
        let half = self.config.view_angle / 2.0;
        let mut angle = -half;
        while angle <= half {
            let cap = self.config.max_distance.unwrap_or(f64::INFINITY);
            let distance = robot.range(angle, cap).await?;

            let (reported, kind) = match self.config.max_distance {
                Some(max) if distance >= max => (max - SAFETY_DISTANCE, ObservationType::Free),
                _ => (distance, ObservationType::Obstacle),
            };

            let polar = Polar::new(Angle::new(angle), reported)?;
            if observations
                .send(ObservationEvent::Measurement { polar, kind })
                .await
                .is_err()
            {
                return Ok(());
            }
            angle += self.config.precision;
        }
        let _ = observations.send(ObservationEvent::ScanComplete).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Pose;
    use crate::robot::SimulatedRobot;
    use crate::world::SimulatedWorld;

    #[tokio::test]
    async fn one_scan_emits_measurements_then_a_sentinel() {
        let world = SimulatedWorld::new(50.0, 50.0);
        let mut robot = SimulatedRobot::new(Pose::new(25.0, 25.0, 0.0), world);

        let scan_signal = Arc::new(Notify::new());
        let shutdown = Arc::new(AtomicBool::new(false));
        let driver = SensorDriver::new(
            SensorConfig {
                view_angle: 90.0,
                precision: 30.0,
                max_distance: Some(10.0),
            },
            scan_signal.clone(),
            shutdown.clone(),
        );

        let (tx, mut rx) = mpsc::channel(32);
        scan_signal.notify_one();
        shutdown.store(true, Ordering::Relaxed);

        driver.scan_once(&mut robot, &tx).await.unwrap();
        drop(tx);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        assert!(matches!(events.last(), Some(ObservationEvent::ScanComplete)));
        assert!(events.len() > 1);
    }
}
