//! RRT (Rapidly-exploring Random Tree) path planner.
//!
//! Samples candidate poses (tilted towards the goal most of the time),
//! rejects anything that lands outside the world, inside an inflated
//! obstacle, or behind one, and returns the first hop of the feasible
//! branch that gets within tolerance of the goal.
//!
//! # Example
//!
//! ```rust,no_run
//! use horus_slam::geometry::Point;
//! use horus_slam::planner::rrt::{RrtConfig, RrtPlanner};
//! use horus_slam::world::ObservedWorld;
//! use std::sync::atomic::AtomicBool;
//!
//! let world = ObservedWorld::new();
//! let planner = RrtPlanner::new(RrtConfig::default());
//! let shutdown = AtomicBool::new(false);
//! let (next_hop, preview) =
//!     planner.plan_next_step(&world, Point::new(0.0, 0.0), Point::new(5.0, 5.0), &shutdown);
//! ```

use crate::datapoint::DataPoint;
use crate::geometry::{Point, Polar};
use crate::world::ObservedWorld;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

/// Node budget above which a hop is abandoned as unreachable.
const MAX_NODES: usize = 200;
const PATH_PREVIEW_BRIGHT: (f32, f32, f32, f32) = (1.0, 0.6, 0.0, 1.0);
const PATH_PREVIEW_DIM: (f32, f32, f32, f32) = (1.0, 0.6, 0.0, 0.3);

/// Tuning knobs for one [`RrtPlanner`].
#[derive(Debug, Clone, Copy)]
pub struct RrtConfig {
    pub max_step: f64,
    pub min_step: f64,
    pub tilt_towards_goal: f64,
    pub tolerance: f64,
    pub robot_size: f64,
}

impl Default for RrtConfig {
    fn default() -> Self {
        Self {
            max_step: 10.0,
            min_step: 1.0,
            tilt_towards_goal: 0.5,
            tolerance: 5.0,
            robot_size: 10.0,
        }
    }
}

struct TreeNode {
    location: Point,
    parent: Option<usize>,
}

/// Arena-indexed RRT tree. Nodes reference their parent by index rather
/// than by owned reference, so reparenting never fights the borrow
/// checker.
pub struct RrtPlanner {
    config: RrtConfig,
}

impl RrtPlanner {
    pub fn new(config: RrtConfig) -> Self {
        Self { config }
    }

    /// Collision radius used for inflation: `floor(robot_size / 2)`.
    fn free_radius(&self) -> i64 {
        (self.config.robot_size / 2.0).floor() as i64
    }

    /// Searches a tree rooted at `start` for a collision-free branch that
    /// gets within tolerance of `goal`, returning the first hop of that
    /// branch plus the TEMPORARY dashed preview points to push onto the
    /// visualization channel. Returns `(None, _)` on shutdown or budget
    /// exhaustion.
    pub fn plan_next_step(
        &self,
        world: &ObservedWorld,
        start: Point,
        goal: Point,
        shutdown: &AtomicBool,
    ) -> (Option<Point>, Vec<DataPoint>) {
        if start == goal {
            warn!("start and goal coincide; returning start");
            return (Some(start), Vec::new());
        }

        let mut nodes = vec![TreeNode {
            location: start,
            parent: None,
        }];
        let mut min_step = self.config.min_step;
        let free_radius = self.free_radius();
        let mut rng = rand::thread_rng();

        loop {
            if shutdown.load(Ordering::Relaxed) {
                return (None, Vec::new());
            }
            if nodes.len() > MAX_NODES {
                warn!(goal = ?goal, "RRT exhausted its node budget");
                return (None, Vec::new());
            }

            let target = if rng.gen::<f64>() < self.config.tilt_towards_goal {
                jittered_goal(goal, self.config.tolerance, &mut rng)
            } else {
                match world.get_random_point(f64::NEG_INFINITY, f64::INFINITY, true) {
                    Some(p) => p,
                    None => continue,
                }
            };

            let parent_idx = nearest_node(&nodes, &target);
            let parent_loc = nodes[parent_idx].location;
            let distance = parent_loc.distance_to(&target);

            if distance < min_step {
                min_step *= 0.99;
                if min_step < self.config.min_step / 4.0 {
                    warn!(min_step, "min_step shrunk to a quarter of its floor");
                }
                continue;
            }

            let step = self.config.max_step.min(distance);
            let angle = parent_loc.angle_to(&target);
            let polar = Polar::new(angle, step).expect("step is derived from a distance, non-negative");
            let candidate = parent_loc.plus_polar(&polar);

            if !world.point_in_bounds(&candidate) {
                continue;
            }
            if !world.is_surrrounding_free(&candidate, free_radius, 1.0) {
                continue;
            }
            if !world.is_path_free(&parent_loc, &candidate, free_radius, 1.0) {
                continue;
            }

            nodes.push(TreeNode {
                location: candidate,
                parent: Some(parent_idx),
            });
            min_step = self.config.min_step;

            if candidate.distance_to(&goal) < self.config.tolerance {
                let terminal_idx = nodes.len() - 1;
                return extract_first_hop(&nodes, terminal_idx, start, goal);
            }
        }
    }
}

fn jittered_goal(goal: Point, tolerance: f64, rng: &mut impl Rng) -> Point {
    let normal = Normal::new(0.0, tolerance).expect("tolerance is a finite positive sigma");
    let offset = normal.sample(rng).abs();
    let angle = crate::geometry::Angle::new(rng.gen_range(0.0..360.0));
    let polar = Polar::new(angle, offset).expect("offset magnitude is non-negative");
    goal.plus_polar(&polar)
}

fn nearest_node(nodes: &[TreeNode], target: &Point) -> usize {
    nodes
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            a.location
                .distance_to(target)
                .partial_cmp(&b.location.distance_to(target))
                .unwrap()
        })
        .map(|(idx, _)| idx)
        .expect("tree always has at least the root")
}

/// Walks the parent chain from `terminal_idx` back to the root, emitting
/// TEMPORARY dashed preview points for `[goal, ..., start]`, and returns the
/// second node from the root (the child of the root) as the next hop.
fn extract_first_hop(
    nodes: &[TreeNode],
    terminal_idx: usize,
    start: Point,
    goal: Point,
) -> (Option<Point>, Vec<DataPoint>) {
    let mut points = vec![DataPoint::path_preview(goal, PATH_PREVIEW_BRIGHT)];

    let mut chain = vec![terminal_idx];
    let mut current = terminal_idx;
    while let Some(parent) = nodes[current].parent {
        chain.push(parent);
        current = parent;
    }

    if chain.len() == 1 {
        warn!("path planner returned the starting point");
        return (Some(start), points);
    }

    for &idx in &chain[..chain.len() - 1] {
        points.push(DataPoint::path_preview(nodes[idx].location, PATH_PREVIEW_DIM));
    }
    points.push(DataPoint::path_preview(start, PATH_PREVIEW_DIM));

    let next_hop = nodes[chain[chain.len() - 2]].location;
    (Some(next_hop), points)
}
