//! HTTP handlers for the admin panel.

pub mod admin;
pub use admin::*;
