//! Built-in rule descriptions.

#[path = "rules/en.rs"]
pub mod en;
