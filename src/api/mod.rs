//! HTTP surface of the local cache service.

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
