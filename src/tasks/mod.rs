//! Background Tasks Module
//!
//! Contains background tasks that run periodically for the lifetime of their
//! owner.
//!
//! # Tasks
//! - Credential refresh: renews a near-expiry credential during quiet periods

mod refresh;

pub use refresh::spawn_refresh_task;
