// src/config/mod.rs

//! Configuration loading and validation for runctl.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate values serde cannot check on its own (`validate.rs`).
//! - Parse human-friendly durations (`duration.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{default_config_path, load_and_validate, load_from_path, load_from_str};
pub use model::{RunConfig, RunSection};
pub use validate::validate_config;
