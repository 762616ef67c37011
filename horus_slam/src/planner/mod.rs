//! Motion planning: local, sampling-based path search ([`rrt`]) and the
//! higher-level loop that decides where to go next ([`exploration`]).

pub mod exploration;
pub mod rrt;

pub use exploration::{ExplorationConfig, ExplorationPlanner, MotionPrimitive};
pub use rrt::{RrtConfig, RrtPlanner};
