//! High-level API wrappers for the backend endpoints
//!
//! This module provides convenient wrappers around the raw HTTP client,
//! adding input validation and timestamps.

mod auth;
mod rewards;

pub use auth::*;
pub use rewards::*;
