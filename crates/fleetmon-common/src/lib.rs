//! Shared domain types for the fleetmon monitoring core.
//!
//! Everything the alert, notification, and engine crates agree on lives
//! here: severity ordering, rule and alert records, channel specs, mutes,
//! and the snowflake ID generator.

pub mod id;
pub mod types;
