pub mod engine;
pub mod state;

pub use engine::MonitorLoop;
pub use state::{Status, StatusTracker, Transition};
