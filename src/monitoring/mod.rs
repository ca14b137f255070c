pub mod metrics;
pub mod server;

pub use metrics::SyncMetrics;
pub use server::{routes, serve, DashboardState};
