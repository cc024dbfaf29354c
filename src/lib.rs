pub mod cookies;
pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

#[cfg(test)]
mod test_support;

pub use router::{AUTH_PREFIX, build_router};
