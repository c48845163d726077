//! Aimi Point Core - Shared data models, loyalty rules, and errors

pub mod catalog;
pub mod errors;
pub mod models;
pub mod types;

pub use errors::{Error, Result};
pub use models::*;
pub use types::*;
