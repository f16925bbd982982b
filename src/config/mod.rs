// src/config/mod.rs

//! Configuration loading and validation for vodpublish.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate and convert the raw model into typed settings (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{
    ArtifactSection, ArtifactSettings, CheckoutSection, CheckoutSettings, ConfigFile,
    GenerateSection, GenerateSettings, GitSection, GitSettings, PublishSection,
    PublishSettings, RawConfigFile, SetupSection, SourceConfig,
};
