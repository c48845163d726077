//! Aimi Point App - Controller, backends, and configuration

pub mod backend;
pub mod config;
pub mod controller;
pub mod state;
pub mod views;

pub use backend::{build_backend, Backend, MockBackend, RemoteBackend};
pub use config::{AppConfig, BackendKind, RemoteConfig};
pub use controller::Controller;
pub use state::{AppState, HomeState, Notice};
pub use views::{Dashboard, RewardCard, ThemeSummary};
