//! HTTP handlers

pub mod status;
pub mod users;
pub mod predictions;
pub mod model;
