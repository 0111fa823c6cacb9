//! HTTP API handlers for jokes-submit

pub mod health;
pub mod submit;

pub use health::health_routes;
pub use submit::submit_routes;
