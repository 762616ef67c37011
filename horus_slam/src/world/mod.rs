//! World representations: the belief the robot maintains ([`observed`]) and
//! the ground-truth backend used to drive it in tests ([`simulated`]).

pub mod observed;
pub mod simulated;

pub use observed::ObservedWorld;
pub use simulated::{Rect, SimulatedWorld};
