pub mod backend;
pub mod client;
pub mod error;
pub mod resilient;
pub mod types;

pub use backend::{DashboardApi, GovernanceApi};
pub use client::SupernovaClient;
pub use error::{ClientError, ClientResult};
pub use resilient::{resilient, FetchOutcome, Fetched};
pub use types::*;
