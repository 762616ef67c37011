//! Observed-World occupancy engine.
//!
//! Fuses ray observations into a log-odds-like grid with kernel-based
//! obstacle inflation and Bresenham-style free-path carving. Two snapshots
//! are kept: `raw` (the additive accumulator) and `blurred` (the raw grid
//! passed through a Gaussian blur), queried separately by callers that need
//! either the sharp accumulator or the smoothed belief used for planning.

use crate::datapoint::{Observation, ObservationBucket, ObservationType};
use crate::geometry::{Point, Pose};
use rand::Rng;
use tracing::debug;

/// Size of the obstacle inflation kernel (odd, centered).
const KERNEL_SIZE: usize = 7;
/// Blur sigma used when building the obstacle kernel (spec's richest
/// variant; an earlier draft's call site used sigma=1 for the kernel too,
/// which collided with the kernel's default and looked like a copy/paste
/// slip — the kernel always uses sigma=2 here).
const KERNEL_SIGMA: f64 = 2.0;
const KERNEL_PEAK: f64 = 100.0;
/// Amount subtracted from each cell visited while carving a free path.
const PATH_CARVE_DECREMENT: f64 = 6.0;

/// A 2-D belief grid fused from fan-shaped range observations.
pub struct ObservedWorld {
    buckets: Vec<ObservationBucket>,
    raw: Option<Vec<Vec<f64>>>,
    blurred: Option<Vec<Vec<f64>>>,
}

impl Default for ObservedWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl ObservedWorld {
    pub fn new() -> Self {
        Self {
            buckets: Vec::new(),
            raw: None,
            blurred: None,
        }
    }

    /// Appends `obs` into the bucket keyed by `pose`'s location (created on
    /// first insert; tolerance-based equality, never deleted).
    pub fn add_observation(&mut self, pose: &Pose, obs: Observation) {
        let location = pose.position();
        match self.buckets.iter_mut().find(|b| b.pose_location == location) {
            Some(bucket) => bucket.observations.push(obs),
            None => {
                let mut bucket = ObservationBucket::new(location);
                bucket.observations.push(obs);
                self.buckets.push(bucket);
            }
        }
    }

    /// Component-wise min/max over every observation location and bucket
    /// key. `None` if the map holds no observations yet.
    pub fn get_world_borders(&self) -> Option<(Point, Point)> {
        if self.buckets.is_empty() {
            return None;
        }
        let mut min = Point::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for bucket in &self.buckets {
            min = min.min(&bucket.pose_location);
            max = max.max(&bucket.pose_location);
            for obs in &bucket.observations {
                min = min.min(&obs.location);
                max = max.max(&obs.location);
            }
        }
        Some((min, max))
    }

    fn grid_dimensions(min: &Point, max: &Point) -> (usize, usize) {
        let width = (max.x - min.x).ceil() as usize + 1;
        let height = (max.y - min.y).ceil() as usize + 1;
        (width, height)
    }

    /// Bakes unbaked observation buckets into the raw grid, re-blurs, and
    /// returns `(blurred_grid, min_border)`. `None` on an empty map.
    pub fn predict_world(&mut self, sigma: f64) -> Option<(Vec<Vec<f64>>, Point)> {
        let (min_border, max_border) = self.get_world_borders()?;
        let (width, height) = Self::grid_dimensions(&min_border, &max_border);

        let shape_changed = match &self.raw {
            Some(grid) => grid.len() != height || grid.first().map(|r| r.len()) != Some(width),
            None => true,
        };

        if shape_changed {
            self.raw = Some(vec![vec![0.0; width]; height]);
            for bucket in &mut self.buckets {
                bucket.used_in_prediction = false;
            }
        }

        let kernel = obstacle_kernel(KERNEL_SIZE, KERNEL_SIGMA, KERNEL_PEAK);
        let raw = self.raw.as_mut().expect("raw grid allocated above");

        for bucket in &mut self.buckets {
            if bucket.used_in_prediction {
                continue;
            }
            let rel_pose = bucket.pose_location - min_border;
            let (px, py) = rel_pose.rounded();
            for obs in &bucket.observations {
                let rel_obs = obs.location - min_border;
                let (x, y) = rel_obs.rounded();
                if obs.kind == ObservationType::Obstacle {
                    apply_kernel_additive(raw, x, y, &kernel);
                }
                carve_free_path(raw, px, py, x, y);
            }
            bucket.used_in_prediction = true;
        }

        let raw_snapshot = self.raw.clone().expect("raw grid allocated above");
        let blurred = gaussian_blur_2d(&raw_snapshot, sigma);
        self.blurred = Some(blurred.clone());
        debug!(width, height, buckets = self.buckets.len(), "baked belief grid");
        Some((blurred, min_border))
    }

    /// Bilinearly-discretized lookup: `grid[round(y - min_y)][round(x - min_x)]`.
    pub fn get_state_on_coordinate(&self, point: &Point, blurred: bool) -> Option<f64> {
        let (min_border, _) = self.get_world_borders()?;
        let grid = if blurred {
            self.blurred.as_ref()?
        } else {
            self.raw.as_ref()?
        };
        let rel = *point - min_border;
        let (x, y) = rel.rounded();
        get_cell(grid, x, y)
    }

    pub fn point_in_bounds(&self, point: &Point) -> bool {
        match self.get_world_borders() {
            Some((min, max)) => {
                min.x <= point.x && point.x <= max.x && min.y <= point.y && point.y <= max.y
            }
            None => false,
        }
    }

    /// A square window of the blurred grid centered on `location`, clipped
    /// to world bounds.
    fn area_around_point(&self, location: &Point, radius: i64) -> Option<Vec<Vec<f64>>> {
        let (min_border, max_border) = self.get_world_borders()?;
        let grid = self.blurred.as_ref()?;

        let x_min = (min_border.x.max(location.x - radius as f64) - min_border.x).round() as i64;
        let x_max = (max_border.x.min(location.x + radius as f64) - min_border.x).round() as i64;
        let y_min = (min_border.y.max(location.y - radius as f64) - min_border.y).round() as i64;
        let y_max = (max_border.y.min(location.y + radius as f64) - min_border.y).round() as i64;

        let mut area = Vec::new();
        for y in y_min..=y_max {
            let mut row = Vec::new();
            for x in x_min..=x_max {
                if let Some(v) = get_cell(grid, x, y) {
                    row.push(v);
                }
            }
            area.push(row);
        }
        Some(area)
    }

    /// True iff every in-bounds cell of the `(2*radius+1)^2` square around
    /// `p` is at or below `threshold` in the blurred grid.
    pub fn is_surrrounding_free(&self, p: &Point, radius: i64, threshold: f64) -> bool {
        match self.area_around_point(p, radius) {
            Some(area) => area.iter().flatten().all(|&v| v <= threshold),
            None => false,
        }
    }

    /// Steps from `a` towards `b` in increments of `1.5 * radius`, checking
    /// [`Self::is_surrrounding_free`] at every waypoint.
    pub fn is_path_free(&self, a: &Point, b: &Point, radius: i64, threshold: f64) -> bool {
        let mut pose = Pose::new(a.x, a.y, 0.0);
        pose.turn_towards(b);
        while pose.position().distance_to(b) > radius as f64 {
            pose.move_forward(1.5 * radius as f64);
            if !self.is_surrrounding_free(&pose.position(), radius, threshold) {
                return false;
            }
        }
        true
    }

    /// Fraction of cells in the window around `location` that are unknown
    /// (`|value| < 1`); cells outside world bounds count as unknown too.
    pub fn perc_unknown_surround(&self, location: &Point, radius: i64) -> f64 {
        let total = ((2 * radius + 1) * (2 * radius + 1)) as f64;
        let area = match self.area_around_point(location, radius) {
            Some(area) => area,
            None => return 1.0,
        };
        let in_bounds_count: usize = area.iter().map(|row| row.len()).sum();
        let unknown_in_bounds = area
            .iter()
            .flatten()
            .filter(|&&v| v.abs() < 1.0)
            .count() as f64;
        let out_of_bounds = total - in_bounds_count as f64;
        (unknown_in_bounds + out_of_bounds) / total
    }

    /// Uniformly samples a point among cells whose value lies in
    /// `[min_value, max_value]`, clamped to world borders.
    pub fn get_random_point(&self, min_value: f64, max_value: f64, blurred: bool) -> Option<Point> {
        let (min_border, max_border) = self.get_world_borders()?;
        let grid = if blurred {
            self.blurred.as_ref()?
        } else {
            self.raw.as_ref()?
        };

        let mut candidates = Vec::new();
        for (y, row) in grid.iter().enumerate() {
            for (x, &value) in row.iter().enumerate() {
                if value >= min_value && value <= max_value {
                    candidates.push((x as f64, y as f64));
                }
            }
        }
        if candidates.is_empty() {
            return None;
        }
        let index = rand::thread_rng().gen_range(0..candidates.len());
        let (x, y) = candidates[index];
        let new_x = (min_border.x + x).min(max_border.x);
        let new_y = (min_border.y + y).min(max_border.y);
        Some(Point::new(new_x, new_y))
    }
}

fn get_cell(grid: &[Vec<f64>], x: i64, y: i64) -> Option<f64> {
    if y < 0 || x < 0 {
        return None;
    }
    grid.get(y as usize)?.get(x as usize).copied()
}

fn apply_kernel_additive(grid: &mut [Vec<f64>], cx: i64, cy: i64, kernel: &[Vec<f64>]) {
    let size = kernel.len() as i64;
    let half = size / 2;
    for ky in 0..size {
        for kx in 0..size {
            let gx = cx - half + kx;
            let gy = cy - half + ky;
            if gy >= 0 && gx >= 0 {
                if let Some(row) = grid.get_mut(gy as usize) {
                    if let Some(cell) = row.get_mut(gx as usize) {
                        *cell += kernel[ky as usize][kx as usize];
                    }
                }
            }
        }
    }
}

/// Walks unit steps from `(x_start, y_start)` to `(x_end, y_end)`,
/// subtracting [`PATH_CARVE_DECREMENT`] from each newly-visited cell.
fn carve_free_path(grid: &mut [Vec<f64>], x_start: i64, y_start: i64, x_end: i64, y_end: i64) {
    let mut pose = Pose::new(x_start as f64, y_start as f64, 0.0);
    let target = Point::new(x_end as f64, y_end as f64);
    pose.turn_towards(&target);

    let (mut x_old, mut y_old) = (x_start, y_start);
    while pose.position().distance_to(&target) > 0.5 {
        let (x, y) = pose.position().rounded();
        pose.move_forward(1.0);
        if x == x_old && y == y_old {
            continue;
        }
        if y >= 0 && x >= 0 {
            if let Some(row) = grid.get_mut(y as usize) {
                if let Some(cell) = row.get_mut(x as usize) {
                    *cell -= PATH_CARVE_DECREMENT;
                }
            }
        }
        x_old = x;
        y_old = y;
    }
}

fn obstacle_kernel(size: usize, sigma: f64, peak: f64) -> Vec<Vec<f64>> {
    let mut kernel = vec![vec![0.0; size]; size];
    kernel[size / 2][size / 2] = 1.0;
    let blurred = gaussian_blur_2d(&kernel, sigma);
    blurred
        .into_iter()
        .map(|row| row.into_iter().map(|v| v * peak).collect())
        .collect()
}

fn gaussian_kernel_1d(sigma: f64) -> Vec<f64> {
    let radius = (sigma * 4.0).ceil().max(1.0) as i64;
    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|i| (-0.5 * (i as f64 / sigma).powi(2)).exp())
        .collect();
    let sum: f64 = kernel.iter().sum();
    for v in &mut kernel {
        *v /= sum;
    }
    kernel
}

/// Separable Gaussian blur with clamped (edge-replicated) boundaries.
fn gaussian_blur_2d(grid: &[Vec<f64>], sigma: f64) -> Vec<Vec<f64>> {
    if sigma <= 0.0 || grid.is_empty() {
        return grid.to_vec();
    }
    let kernel = gaussian_kernel_1d(sigma);
    let radius = (kernel.len() / 2) as i64;
    let height = grid.len();
    let width = grid[0].len();

    let mut horizontal = vec![vec![0.0; width]; height];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0;
            for (k, &weight) in kernel.iter().enumerate() {
                let sx = (x as i64 + k as i64 - radius).clamp(0, width as i64 - 1) as usize;
                acc += weight * grid[y][sx];
            }
            horizontal[y][x] = acc;
        }
    }

    let mut vertical = vec![vec![0.0; width]; height];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0;
            for (k, &weight) in kernel.iter().enumerate() {
                let sy = (y as i64 + k as i64 - radius).clamp(0, height as i64 - 1) as usize;
                acc += weight * horizontal[sy][x];
            }
            vertical[y][x] = acc;
        }
    }
    vertical
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Pose;

    fn obstacle_at(world: &mut ObservedWorld, pose: Pose, location: Point) {
        world.add_observation(&pose, Observation::new(location, ObservationType::Obstacle));
    }

    #[test]
    fn empty_world_reports_no_borders_and_no_prediction() {
        let mut world = ObservedWorld::new();
        assert!(world.get_world_borders().is_none());
        assert!(world.predict_world(1.0).is_none());
    }

    #[test]
    fn obstacle_observation_raises_cell_value() {
        let mut world = ObservedWorld::new();
        let pose = Pose::new(5.0, 5.0, 0.0);
        obstacle_at(&mut world, pose, Point::new(10.0, 5.0));

        let (_, min_border) = world.predict_world(1.0).unwrap();
        let cell = world
            .get_state_on_coordinate(&Point::new(10.0, 5.0), false)
            .unwrap();
        assert!(cell > 0.0, "obstacle kernel should raise the raw cell above zero");
        assert!(min_border.x <= 5.0);
    }

    #[test]
    fn predict_world_is_idempotent_without_new_observations() {
        let mut world = ObservedWorld::new();
        let pose = Pose::new(0.0, 0.0, 0.0);
        obstacle_at(&mut world, pose, Point::new(3.0, 0.0));

        let (first, _) = world.predict_world(1.0).unwrap();
        let (second, _) = world.predict_world(1.0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn free_path_carving_lowers_visited_cells() {
        let mut world = ObservedWorld::new();
        let pose = Pose::new(0.0, 0.0, 0.0);
        world.add_observation(&pose, Observation::new(Point::new(5.0, 0.0), ObservationType::Free));
        world.predict_world(1.0).unwrap();

        let origin_cell = world.get_state_on_coordinate(&Point::new(0.0, 0.0), false).unwrap();
        assert!(origin_cell <= 0.0);
    }

    #[test]
    fn point_in_bounds_respects_borders() {
        let mut world = ObservedWorld::new();
        let pose = Pose::new(0.0, 0.0, 0.0);
        obstacle_at(&mut world, pose, Point::new(10.0, 10.0));
        world.predict_world(1.0).unwrap();

        assert!(world.point_in_bounds(&Point::new(5.0, 5.0)));
        assert!(!world.point_in_bounds(&Point::new(-5.0, -5.0)));
    }

    #[test]
    fn is_surrrounding_free_detects_obstacle_bump() {
        let mut world = ObservedWorld::new();
        let pose = Pose::new(0.0, 0.0, 0.0);
        obstacle_at(&mut world, pose, Point::new(10.0, 10.0));
        world.predict_world(1.0).unwrap();

        assert!(!world.is_surrrounding_free(&Point::new(10.0, 10.0), 2, 0.0));
    }
}
