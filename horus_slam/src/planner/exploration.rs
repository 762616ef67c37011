//! Frontier-based exploration planner.
//!
//! Turns "explore until done" into one motion primitive per step: predict
//! the world, extract a frontier of reachable-but-unseen cells, pick a
//! candidate goal, and compose either a rotate-then-move or a move
//! primitive towards it.

use crate::datapoint::{DataPoint, Frontier, Prediction};
use crate::geometry::{Angle, Point, Pose};
use crate::planner::rrt::RrtPlanner;
use crate::visualization::VisualizationEvent;
use crate::world::ObservedWorld;
use rand::seq::SliceRandom;
use std::sync::atomic::AtomicBool;
use tracing::debug;

/// Default Gaussian blur sigma used to predict the world before extracting
/// a frontier, per the occupancy engine's own default.
const DEFAULT_BLUR_SIGMA: f64 = 1.0;

/// Value below which a cell is considered already-known-free and is
/// excluded from the frontier.
const KNOWN_FREE_THRESHOLD: f64 = -10.0;
/// Minimum fraction of unknown neighbors for a cell to count as frontier.
const MIN_UNKNOWN_SURROUND: f64 = 0.3;
/// Minimum neighbor count (within `distance_tolerance`) for a frontier
/// point to be a viable candidate.
const MIN_NEIGHBORS: usize = 3;
const CANDIDATE_ATTEMPTS: usize = 5;
/// |Δθ| below which the agent skips the rotate phase of a hop.
const ANGLE_TOLERANCE_DEG: f64 = 3.0;

/// One motion instruction for the agent loop to execute.
#[derive(Debug, Clone, Copy)]
pub enum MotionPrimitive {
    Move { distance: f64 },
    RotateThenMove { delta: Angle, distance: f64 },
}

#[derive(Debug, Clone, Copy)]
pub struct ExplorationConfig {
    pub robot_size: f64,
    pub distance_tolerance: f64,
    pub angle_tolerance: f64,
    pub blur_sigma: f64,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            robot_size: 10.0,
            distance_tolerance: 10.0,
            angle_tolerance: ANGLE_TOLERANCE_DEG,
            blur_sigma: DEFAULT_BLUR_SIGMA,
        }
    }
}

pub struct ExplorationPlanner {
    config: ExplorationConfig,
    rrt: RrtPlanner,
}

impl ExplorationPlanner {
    pub fn new(config: ExplorationConfig, rrt: RrtPlanner) -> Self {
        Self { config, rrt }
    }

    fn free_radius(&self) -> i64 {
        (self.config.robot_size / 2.0).floor() as i64
    }

    /// Runs one step of the per-step protocol, returning the next motion
    /// primitive to execute plus any visualization events emitted along the
    /// way (the `Prediction` heatmap, the `Frontier` scatter points, and any
    /// RRT path preview emitted while picking a candidate). Returns
    /// `(None, _)` when exploration is complete.
    pub fn plan_next_primitive(
        &self,
        world: &mut ObservedWorld,
        pose: &Pose,
        shutdown: &AtomicBool,
    ) -> (Option<MotionPrimitive>, Vec<VisualizationEvent>) {
        let mut emitted = Vec::new();

        let (grid, origin) = match world.predict_world(self.config.blur_sigma) {
            Some(result) => result,
            None => return (None, emitted),
        };
        let prediction = Prediction::new(origin, grid);
        emitted.push(VisualizationEvent::Prediction(prediction.clone()));

        let frontier = self.compute_frontier(world, &prediction);
        emitted.extend(frontier.clone().into_iter().map(VisualizationEvent::Data));

        if frontier.is_empty() {
            debug!("frontier is empty; exploration complete");
            return (None, emitted);
        }

        let (goal, preview) = self.pick_candidate(world, &frontier, pose, shutdown);
        emitted.extend(preview.into_iter().map(VisualizationEvent::Data));
        let goal = match goal {
            Some(g) => g,
            None => return (None, emitted),
        };

        let delta = pose.angle_to_point(&goal);
        let distance = pose.position().distance_to(&goal);

        let primitive = if delta.in_degrees().abs() > self.config.angle_tolerance {
            MotionPrimitive::RotateThenMove { delta, distance }
        } else {
            MotionPrimitive::Move { distance }
        };

        (Some(primitive), emitted)
    }

    fn compute_frontier(&self, world: &ObservedWorld, prediction: &Prediction) -> Frontier {
        let radius = self.free_radius();
        let mut candidates = Vec::new();

        for (row_idx, row) in prediction.grid.iter().enumerate() {
            for (col_idx, &value) in row.iter().enumerate() {
                if value >= 0.0 {
                    continue;
                }
                if value < KNOWN_FREE_THRESHOLD {
                    continue;
                }
                let cell = Point::new(
                    prediction.origin.x + col_idx as f64,
                    prediction.origin.y + row_idx as f64,
                );
                if !world.is_surrrounding_free(&cell, radius, 1.0) {
                    continue;
                }
                if world.perc_unknown_surround(&cell, radius) < MIN_UNKNOWN_SURROUND {
                    continue;
                }
                candidates.push(cell);
            }
        }

        Frontier::new(prediction.origin, candidates)
    }

    /// Attempts up to `CANDIDATE_ATTEMPTS` times to find a reachable goal
    /// among the frontier's well-connected points, returning it alongside
    /// any RRT path preview points emitted along the way.
    fn pick_candidate(
        &self,
        world: &ObservedWorld,
        frontier: &Frontier,
        pose: &Pose,
        shutdown: &AtomicBool,
    ) -> (Option<Point>, Vec<DataPoint>) {
        let connected = well_connected_points(frontier, self.config.distance_tolerance);
        if connected.is_empty() {
            return (None, Vec::new());
        }

        let radius = self.free_radius();
        let mut rng = rand::thread_rng();

        for attempt in 0..CANDIDATE_ATTEMPTS {
            let candidate = match if attempt == 0 {
                nearest_to(&connected, &pose.position())
            } else {
                connected.choose(&mut rng).copied()
            } {
                Some(c) => c,
                None => return (None, Vec::new()),
            };

            if world.is_path_free(&pose.position(), &candidate, radius, 1.0) {
                return (Some(candidate), Vec::new());
            }

            let (hop, preview) = self.rrt.plan_next_step(world, pose.position(), candidate, shutdown);
            if let Some(hop) = hop {
                return (Some(hop), preview);
            }
        }

        (None, Vec::new())
    }
}

/// A frontier point is a viable candidate iff it has at least
/// `MIN_NEIGHBORS` other frontier points within `tolerance`.
fn well_connected_points(frontier: &Frontier, tolerance: f64) -> Vec<Point> {
    frontier
        .candidates
        .iter()
        .filter(|&&p| {
            frontier
                .candidates
                .iter()
                .filter(|&&other| other != p && p.distance_to(&other) < tolerance)
                .count()
                >= MIN_NEIGHBORS
        })
        .copied()
        .collect()
}

fn nearest_to(points: &[Point], origin: &Point) -> Option<Point> {
    points
        .iter()
        .min_by(|a, b| {
            a.distance_to(origin)
                .partial_cmp(&b.distance_to(origin))
                .unwrap()
        })
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datapoint::{Observation, ObservationType};
    use crate::planner::rrt::RrtConfig;

    fn open_world(size: f64) -> ObservedWorld {
        let mut world = ObservedWorld::new();
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(size, 0.0),
            Point::new(0.0, size),
            Point::new(size, size),
        ];
        for corner in corners {
            world.add_observation(
                &Pose::new(corner.x, corner.y, 0.0),
                Observation::new(corner, ObservationType::Free),
            );
        }
        world
    }

    #[test]
    fn empty_world_reports_exploration_complete() {
        let mut world = ObservedWorld::new();
        let planner = ExplorationPlanner::new(
            ExplorationConfig::default(),
            RrtPlanner::new(RrtConfig::default()),
        );
        let pose = Pose::new(0.0, 0.0, 0.0);
        let shutdown = AtomicBool::new(false);

        let (primitive, _) = planner.plan_next_primitive(&mut world, &pose, &shutdown);
        assert!(primitive.is_none());
    }

    #[test]
    fn partially_observed_world_yields_a_primitive_towards_the_frontier() {
        let mut world = open_world(30.0);
        let planner = ExplorationPlanner::new(
            ExplorationConfig::default(),
            RrtPlanner::new(RrtConfig::default()),
        );
        let pose = Pose::new(5.0, 5.0, 0.0);
        let shutdown = AtomicBool::new(false);

        let (primitive, emitted) = planner.plan_next_primitive(&mut world, &pose, &shutdown);
        assert!(!emitted.is_empty());
        match primitive {
            Some(MotionPrimitive::Move { distance })
            | Some(MotionPrimitive::RotateThenMove { distance, .. }) => {
                assert!(distance >= 0.0);
            }
            None => {}
        }
    }

    #[test]
    fn well_connected_points_requires_minimum_neighbor_count() {
        let frontier = Frontier::new(
            Point::new(0.0, 0.0),
            vec![
                Point::new(0.0, 0.0),
                Point::new(1.0, 0.0),
                Point::new(0.0, 1.0),
                Point::new(1.0, 1.0),
                Point::new(50.0, 50.0),
            ],
        );
        let connected = well_connected_points(&frontier, 5.0);
        assert!(connected.contains(&Point::new(0.0, 0.0)));
        assert!(!connected.contains(&Point::new(50.0, 50.0)));
    }
}
