//! HTTP handlers for the shop resources.

pub mod resource;
pub use resource::*;
