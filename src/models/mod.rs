//! Data models

pub mod user;
pub mod prediction;
pub mod update;

pub use user::*;
pub use prediction::*;
pub use update::*;
