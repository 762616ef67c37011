//! Ground-truth simulated world used by tests and the `Simulated` robot
//! variant — never by the belief engine itself. Obstacles are axis-aligned
//! rectangles; ranging is done by marching a pose forward one unit at a
//! time until it leaves the rectangle-free area or the world bounds.

use crate::geometry::{Point, Pose};

/// An axis-aligned rectangular obstacle.
#[derive(Debug, Clone, Copy)]
pub struct Rect {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Rect {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.x_min && p.x <= self.x_max && p.y >= self.y_min && p.y <= self.y_max
    }
}

/// A rectangular world with axis-aligned rectangular obstacles, used as the
/// ground truth a [`crate::sensor::SensorDriver`] ranges against in tests.
pub struct SimulatedWorld {
    width: f64,
    height: f64,
    obstacles: Vec<Rect>,
}

impl SimulatedWorld {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            obstacles: Vec::new(),
        }
    }

    pub fn with_obstacle(mut self, rect: Rect) -> Self {
        self.obstacles.push(rect);
        self
    }

    pub fn in_bounds(&self, p: &Point) -> bool {
        p.x >= 0.0 && p.x < self.width && p.y >= 0.0 && p.y < self.height
    }

    pub fn is_occupied(&self, p: &Point) -> bool {
        self.obstacles.iter().any(|r| r.contains(p))
    }

    /// Marches one unit at a time from `pose` along `measuring_angle_deg`
    /// (relative to the pose's own orientation), stopping at the first
    /// obstacle cell or the world boundary, capped at `max_distance`.
    pub fn cast_ray(&self, pose: &Pose, measuring_angle_deg: f64, max_distance: f64) -> f64 {
        let mut ray = *pose;
        ray.rotate(measuring_angle_deg);
        let mut distance = 0.0;
        while distance < max_distance {
            let next_distance = distance + 1.0;
            let mut probe = ray;
            probe.move_forward(next_distance);
            let point = probe.position();
            if !self.in_bounds(&point) || self.is_occupied(&point) {
                break;
            }
            distance = next_distance;
        }
        distance.min(max_distance)
    }
}
