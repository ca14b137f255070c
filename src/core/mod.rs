pub mod config;
pub mod health;
pub mod logging;

pub use config::Config;
pub use health::{Component, HealthChecker};
