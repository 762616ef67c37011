//! 2-D geometry primitives shared by the occupancy engine and the planners.
//!
//! # Features
//!
//! - [`Point`]: continuous world coordinates with tolerance equality
//! - [`Angle`]: degrees, always normalized into (-180°, 180°]
//! - [`Polar`]: angle/radius pair, convertible to Cartesian offsets
//! - [`Pose`]: position + orientation, with rotate/move-forward/turn-towards
//!
//! # Example
//!
//! ```rust
//! use horus_slam::geometry::{Point, Pose};
//!
//! let mut pose = Pose::new(0.0, 0.0, 0.0);
//! pose.move_forward(5.0);
//! assert!((pose.position().x - 5.0).abs() < 1e-6);
//! ```

use crate::error::{SlamError, SlamResult};
use std::ops::{Add, Sub};

/// Tolerance used for [`Point`] equality and for deduplicating observation
/// buckets keyed by pose location.
pub const EPSILON: f64 = 1e-6;

/// A point in continuous world coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`. Symmetric and zero iff `self == other`.
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Absolute bearing from `self` towards `other`, via `atan2`.
    pub fn angle_to(&self, other: &Point) -> Angle {
        let dy = other.y - self.y;
        let dx = other.x - self.x;
        Angle::new(dy.atan2(dx).to_degrees())
    }

    /// Offsets `self` by a polar vector (angle is an absolute bearing).
    pub fn plus_polar(&self, polar: &Polar) -> Point {
        *self + polar.to_cartesian()
    }

    /// Component-wise minimum, used when computing world borders.
    pub fn min(&self, other: &Point) -> Point {
        Point::new(self.x.min(other.x), self.y.min(other.y))
    }

    /// Component-wise maximum, used when computing world borders.
    pub fn max(&self, other: &Point) -> Point {
        Point::new(self.x.max(other.x), self.y.max(other.y))
    }

    /// Rounds both coordinates to the nearest integer (grid-cell lookup).
    pub fn rounded(&self) -> (i64, i64) {
        (self.x.round() as i64, self.y.round() as i64)
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        (self.x - other.x).abs() < EPSILON && (self.y - other.y).abs() < EPSILON
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// An angle in degrees, always kept in (-180°, 180°].
#[derive(Debug, Clone, Copy)]
pub struct Angle {
    degrees: f64,
}

impl Angle {
    pub fn new(degrees: f64) -> Self {
        let mut angle = Self { degrees };
        angle.normalize();
        angle
    }

    fn normalize(&mut self) {
        let mut d = self.degrees % 360.0;
        if d <= -180.0 {
            d += 360.0;
        } else if d > 180.0 {
            d -= 360.0;
        }
        self.degrees = d;
    }

    /// Adds `delta` degrees, re-normalizing into (-180°, 180°].
    pub fn change(&mut self, delta: f64) {
        self.degrees += delta;
        self.normalize();
    }

    pub fn in_degrees(&self) -> f64 {
        self.degrees
    }

    pub fn in_radians(&self) -> f64 {
        self.degrees.to_radians()
    }
}

impl Add for Angle {
    type Output = Angle;
    fn add(self, rhs: Angle) -> Angle {
        Angle::new(self.degrees + rhs.degrees)
    }
}

impl Sub for Angle {
    type Output = Angle;
    fn sub(self, rhs: Angle) -> Angle {
        Angle::new(self.degrees - rhs.degrees)
    }
}

/// A polar offset: absolute bearing + non-negative radius.
#[derive(Debug, Clone, Copy)]
pub struct Polar {
    pub angle: Angle,
    pub radius: f64,
}

impl Polar {
    /// Fails with [`SlamError::InvalidGeometry`] if `radius` is negative.
    pub fn new(angle: Angle, radius: f64) -> SlamResult<Polar> {
        if radius < 0.0 {
            return Err(SlamError::InvalidGeometry(format!(
                "polar radius must be non-negative, got {radius}"
            )));
        }
        Ok(Polar { angle, radius })
    }

    pub fn to_cartesian(&self) -> Point {
        let rad = self.angle.in_radians();
        Point::new(self.radius * rad.cos(), self.radius * rad.sin())
    }
}

/// A robot (or sensor head) pose: position plus orientation.
#[derive(Debug, Clone, Copy)]
pub struct Pose {
    position: Point,
    orientation: Angle,
}

impl Pose {
    pub fn new(x: f64, y: f64, orientation_degrees: f64) -> Self {
        Self {
            position: Point::new(x, y),
            orientation: Angle::new(orientation_degrees),
        }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn orientation(&self) -> Angle {
        self.orientation
    }

    /// Rotates in place by `delta` degrees.
    pub fn rotate(&mut self, delta: f64) {
        self.orientation.change(delta);
    }

    /// Moves `distance` along the current orientation.
    pub fn move_forward(&mut self, distance: f64) {
        let rad = self.orientation.in_radians();
        self.position = self.position + Point::new(distance * rad.cos(), distance * rad.sin());
    }

    /// The signed turn (in (-180°, 180°]) needed to face `point`.
    pub fn angle_to_point(&self, point: &Point) -> Angle {
        self.position.angle_to(point) - self.orientation
    }

    /// Rotates in place to face `point`.
    pub fn turn_towards(&mut self, point: &Point) {
        let delta = self.angle_to_point(point);
        self.rotate(delta.in_degrees());
    }
}
