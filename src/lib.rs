pub mod api;
pub mod core;
pub mod governance;
pub mod monitoring;
pub mod session;
pub mod sync;
