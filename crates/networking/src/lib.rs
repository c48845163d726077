//! Aimi Point Networking - HTTP client and API wrappers for the hosted backend

pub mod api;
pub mod http;

pub use http::AimiClient;
