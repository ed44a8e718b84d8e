//! Cooking-question chat agent whose console transcript is reduced to the
//! user-facing answer by a heuristic sanitizer.

pub mod agent;
pub mod agent_output_sanitize;
pub mod chat;
pub mod providers;
pub mod recipes;
pub mod runtime_config;
pub mod runtime_wiring;
pub mod tools;
pub mod transcript;
pub mod types;

pub use agent_output_sanitize::{sanitize, SanitizeRules, Sanitizer};
