//! 2-D SLAM core for a mobile ground robot.
//!
//! Maintains an occupancy-grid belief of the world ([`world::ObservedWorld`]),
//! plans local hops towards a goal with a sampling-based planner
//! ([`planner::rrt`]), and drives full exploration by turning unseen frontier
//! cells into a sequence of motion primitives ([`planner::exploration`]).
//! [`agent::AgentLoop`] ties the belief, the planner, a [`robot::RobotCapability`]
//! and a [`sensor::SensorDriver`] together; [`wire`] and [`visualization`]
//! are the two boundaries to the outside world.

pub mod agent;
pub mod config;
pub mod datapoint;
pub mod error;
pub mod geometry;
pub mod planner;
pub mod robot;
pub mod sensor;
pub mod visualization;
pub mod wire;
pub mod world;

pub use config::SlamConfig;
pub use error::{SlamError, SlamResult};
