//! Instance file loading.
//!
//! Instance files follow the agent layout:
//!
//! ```yaml
//! init_config:
//!
//! instances:
//!   - host: 10.0.0.5
//!     port: 12865
//! ```

use crate::error::CheckError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Parsed contents of an instance file.
#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
pub struct InstancesFile<T> {
    #[serde(default)]
    pub init_config: Option<serde_yaml::Value>,
    #[serde(default = "Vec::new")]
    pub instances: Vec<T>,
}

impl<T: DeserializeOwned> InstancesFile<T> {
    pub fn from_yaml(text: &str) -> Result<Self, CheckError> {
        Ok(serde_yaml::from_str(text)?)
    }
}

/// Read the instance definitions from `path`.
pub fn load_instances<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, CheckError> {
    let text = std::fs::read_to_string(path)?;
    let file = InstancesFile::<T>::from_yaml(&text)?;
    debug!("Loaded {} instance(s) from {}", file.instances.len(), path.display());
    Ok(file.instances)
}
