pub mod auth_session;
pub mod provider;
pub mod usage;
pub mod user_store;

pub use auth_session::AuthSessionManager;
pub use provider::GoogleProvider;
pub use usage::UsageTracker;
pub use user_store::{MemoryUserStore, UserStore};
