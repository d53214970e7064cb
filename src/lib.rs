//! tagsync library
//!
//! Configuration and fixture loading shared by the `tagsync` binary and its tests.

pub mod config;
pub mod fixture;

pub use config::{load_config, ConfigError, LoadedConfig, TagSyncConfig};
pub use fixture::{load_fixture, CatalogFixture};
