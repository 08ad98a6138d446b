//! HTTP request and response bodies for the cache service.

pub mod requests;
pub mod responses;

pub use requests::{KeysQuery, SetRequest};
pub use responses::{
    ClearResponse, ErrorResponse, GetResponse, HealthResponse, KeyResponse, KeysResponse,
    StatsResponse,
};
