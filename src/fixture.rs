//! Offline catalog fixtures.
//!
//! A fixture seeds an in-memory catalog so a batch can be rehearsed without
//! reaching the catalog service.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tagsync_catalog_client::InMemoryCatalog;
use tagsync_core_types::ContainerId;

use crate::config::ConfigError;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct FixtureLabel {
    pub key: String,
    pub value: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub associations: Vec<String>,
}

fn default_active() -> bool {
    true
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CatalogFixture {
    #[serde(default)]
    pub containers: Vec<String>,
    #[serde(default)]
    pub labels: Vec<FixtureLabel>,
}

impl CatalogFixture {
    pub fn into_catalog(self) -> InMemoryCatalog {
        let catalog = InMemoryCatalog::new();
        for container in self.containers {
            catalog.add_container(container);
        }
        for label in self.labels {
            let id = catalog.seed_label(&label.key, &label.value);
            for container in label.associations {
                catalog.seed_association(&id, &ContainerId(container));
            }
            if !label.active {
                catalog.set_active(&id, false);
            }
        }
        catalog
    }
}

pub fn load_fixture(path: &Path) -> Result<CatalogFixture, ConfigError> {
    let content = fs::read_to_string(path).map_err(|err| ConfigError::Io {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    serde_yaml::from_str(&content).map_err(|err| ConfigError::Invalid {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}
