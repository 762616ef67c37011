//! The visualization channel: a tagged stream of data records and control
//! messages, plus an in-process sink that mirrors the storage model the
//! agent's consumer renders from.

use crate::datapoint::{ControlMessage, DataPoint, Existence, PathId, Prediction};
use std::collections::HashMap;

/// One item carried on the visualization channel: a scatter/path record, a
/// heatmap prediction snapshot, or an out-of-band instruction.
#[derive(Debug, Clone)]
pub enum VisualizationEvent {
    Data(DataPoint),
    Prediction(Prediction),
    Control(ControlMessage),
}

impl From<DataPoint> for VisualizationEvent {
    fn from(data: DataPoint) -> Self {
        VisualizationEvent::Data(data)
    }
}

impl From<Prediction> for VisualizationEvent {
    fn from(prediction: Prediction) -> Self {
        VisualizationEvent::Prediction(prediction)
    }
}

impl From<ControlMessage> for VisualizationEvent {
    fn from(control: ControlMessage) -> Self {
        VisualizationEvent::Control(control)
    }
}

/// Accumulated points for one path, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct PathEntry {
    pub style: Option<&'static str>,
    pub existence: Existence,
    pub points: Vec<DataPoint>,
}

/// Anything that consumes [`VisualizationEvent`]s. The in-process
/// [`MapStorage`] is the reference implementation; a UI or disk writer can
/// implement the same trait to replace it without touching the agent loop.
pub trait VisualizationSink {
    fn handle(&mut self, event: VisualizationEvent);
}

/// Mirrors the original storage model: scatter points bucketed by
/// [`Existence`], one heatmap snapshot, and named path polylines.
#[derive(Debug, Clone, Default)]
pub struct MapStorage {
    pub scatter: HashMap<Existence, Vec<DataPoint>>,
    pub heatmap: Option<Prediction>,
    pub paths: HashMap<PathId, PathEntry>,
}

impl MapStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn add_scatter(&mut self, data: DataPoint) {
        self.scatter.entry(data.existence).or_default().push(data);
    }

    fn add_path(&mut self, data: DataPoint) {
        let Some(path_id) = data.path_id else {
            return;
        };
        let entry = self.paths.entry(path_id).or_insert_with(|| PathEntry {
            style: data.path_style,
            existence: data.existence,
            points: Vec::new(),
        });
        entry.points.push(data);
    }

    fn delete_temporary_data(&mut self) {
        self.scatter.remove(&Existence::Temporary);
        for entry in self.paths.values_mut() {
            if entry.existence == Existence::Temporary {
                entry.points.clear();
            }
        }
    }
}

impl VisualizationSink for MapStorage {
    fn handle(&mut self, event: VisualizationEvent) {
        match event {
            VisualizationEvent::Data(data) => {
                if data.path_id.is_some() {
                    self.add_path(data);
                } else {
                    self.add_scatter(data);
                }
            }
            VisualizationEvent::Prediction(prediction) => {
                self.heatmap = Some(prediction);
            }
            VisualizationEvent::Control(ControlMessage::DeleteTemporaryData) => {
                self.delete_temporary_data();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    #[test]
    fn scatter_points_bucket_by_existence() {
        let mut storage = MapStorage::new();
        storage.handle(DataPoint::observation(Point::new(1.0, 1.0)).into());
        storage.handle(DataPoint::frontier_candidate(Point::new(2.0, 2.0)).into());

        assert_eq!(storage.scatter.get(&Existence::Permanent).map(Vec::len), Some(1));
        assert_eq!(storage.scatter.get(&Existence::Temporary).map(Vec::len), Some(1));
    }

    #[test]
    fn prediction_events_replace_the_heatmap_slot() {
        let mut storage = MapStorage::new();
        assert!(storage.heatmap.is_none());

        storage.handle(Prediction::new(Point::new(0.0, 0.0), vec![vec![0.0; 3]; 3]).into());
        assert!(storage.heatmap.is_some());

        storage.handle(Prediction::new(Point::new(1.0, 1.0), vec![vec![1.0; 2]; 2]).into());
        let heatmap = storage.heatmap.as_ref().unwrap();
        assert_eq!(heatmap.origin, Point::new(1.0, 1.0));
    }

    #[test]
    fn delete_temporary_clears_temporary_scatter_and_path_points_only() {
        let mut storage = MapStorage::new();
        storage.handle(DataPoint::pose(Point::new(0.0, 0.0)).into());
        storage.handle(DataPoint::path_preview(Point::new(1.0, 1.0), (1.0, 0.6, 0.0, 1.0)).into());
        storage.handle(ControlMessage::DeleteTemporaryData.into());

        assert_eq!(storage.paths[&PathId::RobotHistory].points.len(), 1);
        assert_eq!(storage.paths[&PathId::RobotPathPlan].points.len(), 0);
    }
}
