//! API Module
//!
//! The worker's HTTP event surface: request routing into the caching core,
//! the navigation message endpoint, the push control contract and the push
//! lifecycle event endpoints.

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
