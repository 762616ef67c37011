//! Data records shared between the occupancy engine, the planners, and the
//! visualization channel.

use crate::geometry::Point;

/// RGBA color in `[0, 1]` per channel.
pub type Color = (f32, f32, f32, f32);

/// What kind of range measurement an [`Observation`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationType {
    Obstacle,
    Free,
}

/// A single range measurement, already transformed into world coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Observation {
    pub location: Point,
    pub kind: ObservationType,
}

impl Observation {
    pub fn new(location: Point, kind: ObservationType) -> Self {
        Self { location, kind }
    }
}

/// All observations taken from one pose. Append-only once created; the
/// `used_in_prediction` flag lets [`crate::world::observed::ObservedWorld`]
/// bake each bucket into the raw grid exactly once.
#[derive(Debug, Clone)]
pub struct ObservationBucket {
    pub pose_location: Point,
    pub observations: Vec<Observation>,
    pub used_in_prediction: bool,
}

impl ObservationBucket {
    pub fn new(pose_location: Point) -> Self {
        Self {
            pose_location,
            observations: Vec::new(),
            used_in_prediction: false,
        }
    }
}

/// Visualization lifetime: `Temporary` records are purged by
/// [`crate::datapoint::ControlMessage::DeleteTemporaryData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Existence {
    Permanent,
    Temporary,
}

impl Default for Existence {
    fn default() -> Self {
        Existence::Permanent
    }
}

/// Identifies which polyline a path-tagged [`DataPoint`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathId {
    RobotHistory,
    RobotPathPlan,
}

/// Out-of-band instructions carried on the same channel as [`DataPoint`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    DeleteTemporaryData,
}

/// A single tagged record on the visualization channel. Every `DataPoint`
/// is a scatter/path record; the heatmap record kind is carried separately
/// as a [`Prediction`] on [`crate::visualization::VisualizationEvent`].
#[derive(Debug, Clone)]
pub struct DataPoint {
    pub location: Point,
    pub color: Color,
    pub path_id: Option<PathId>,
    pub path_style: Option<&'static str>,
    pub existence: Existence,
}

impl DataPoint {
    /// A freshly fused obstacle/free observation (blue, permanent scatter).
    pub fn observation(location: Point) -> Self {
        Self {
            location,
            color: (0.1, 0.2, 0.9, 0.3),
            path_id: None,
            path_style: None,
            existence: Existence::Permanent,
        }
    }

    /// A robot pose emitted after executing a motion primitive (red,
    /// permanent, appended to [`PathId::RobotHistory`]).
    pub fn pose(location: Point) -> Self {
        Self {
            location,
            color: (0.9, 0.2, 0.1, 0.3),
            path_id: Some(PathId::RobotHistory),
            path_style: Some("-"),
            existence: Existence::Permanent,
        }
    }

    /// One waypoint of a temporary dashed RRT path preview.
    pub fn path_preview(location: Point, color: Color) -> Self {
        Self {
            location,
            color,
            path_id: Some(PathId::RobotPathPlan),
            path_style: Some("--"),
            existence: Existence::Temporary,
        }
    }

    /// A frontier candidate (orange, temporary scatter).
    pub fn frontier_candidate(location: Point) -> Self {
        Self {
            location,
            color: (1.0, 0.6, 0.0, 0.6),
            path_id: None,
            path_style: None,
            existence: Existence::Temporary,
        }
    }
}

/// Free cells bordering unknown space: candidates for the next goal.
#[derive(Debug, Clone)]
pub struct Frontier {
    pub origin: Point,
    pub candidates: Vec<Point>,
}

impl Frontier {
    pub fn new(origin: Point, candidates: Vec<Point>) -> Self {
        Self { origin, candidates }
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl IntoIterator for Frontier {
    type Item = DataPoint;
    type IntoIter = std::vec::IntoIter<DataPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates
            .into_iter()
            .map(DataPoint::frontier_candidate)
            .collect::<Vec<_>>()
            .into_iter()
    }
}

/// A snapshot of the blurred occupancy grid, emitted for visualization.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub origin: Point,
    pub grid: Vec<Vec<f64>>,
}

impl Prediction {
    pub fn new(origin: Point, grid: Vec<Vec<f64>>) -> Self {
        Self { origin, grid }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frontier_iterates_as_temporary_scatter_points() {
        let frontier = Frontier::new(
            Point::new(0.0, 0.0),
            vec![Point::new(1.0, 1.0), Point::new(2.0, 2.0)],
        );
        let points: Vec<DataPoint> = frontier.into_iter().collect();
        assert_eq!(points.len(), 2);
        assert!(points.iter().all(|p| p.existence == Existence::Temporary));
    }
}
