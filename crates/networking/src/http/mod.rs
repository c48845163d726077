//! HTTP transport

mod client;

pub use client::AimiClient;
