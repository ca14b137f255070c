pub mod auth;
pub mod context;
pub mod store;
pub mod token;

pub use auth::AuthService;
pub use context::SessionContext;
pub use store::{MemorySessionStore, SessionStore, SqliteSessionStore, StoredSession};
