//! HTTP API handlers for recyclo-sv

pub mod classify;
pub mod decide;
pub mod health;
pub mod progress;
pub mod user;

pub use classify::classify;
pub use decide::decide;
pub use health::health_routes;
pub use progress::{clear_logs, progress_logs, progress_summary};
pub use user::{OptionalUser, RequiredUser};
