//! Zone-based obstacle detection: per-revolution bucket map, zone state machine and
//! avoidance handler dispatch.

mod detector;
mod handler;
mod revolution;

pub use detector::ObstacleDetector;
pub use handler::{dispatch, invoke, AvoidanceHandler, HandlerId, NoopHandler};
pub use revolution::RevolutionMap;
