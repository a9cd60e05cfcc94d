//! HTTP handlers, grouped by concern.

pub mod health;
pub mod link;
pub mod stats;
