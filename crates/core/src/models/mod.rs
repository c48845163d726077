//! Data models for Aimi Point entities

mod level;
mod points;
mod reward;
mod theme;
mod user;

pub use level::*;
pub use points::*;
pub use reward::*;
pub use theme::*;
pub use user::*;
