//! HTTP handlers, organized by surface:
//! - `peer`: node-to-node fetch and the health endpoint
//! - `sentinel`: failure notifications from sentinels
//! - `api`: the client-facing front end

pub mod api;
pub mod peer;
pub mod sentinel;

pub use api::{get_value, group_stats};
pub use peer::{fetch_key, health};
pub use sentinel::failure_notice;
