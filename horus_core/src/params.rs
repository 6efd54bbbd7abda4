//! Simple runtime parameter system for HORUS
//!
//! Provides a straightforward key-value store for runtime configuration,
//! plus [`ParamLoader`] for reading typed parameters once at construction
//! time while tracking whether every compulsory parameter was found.

use crate::error::{HorusError, HorusResult};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

/// Simple runtime parameter store
///
/// Cloning is cheap and shares the underlying storage.
#[derive(Debug, Clone, Default)]
pub struct RuntimeParams {
    /// Parameter storage - BTreeMap maintains sorted order
    params: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl RuntimeParams {
    /// Create an empty parameter store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parameter store from a YAML mapping
    pub fn from_yaml_str(yaml: &str) -> HorusResult<Self> {
        let loaded: BTreeMap<String, Value> = serde_yaml::from_str(yaml)?;
        Ok(Self {
            params: Arc::new(RwLock::new(loaded)),
        })
    }

    /// Create a parameter store from a YAML file
    pub fn from_file(path: &Path) -> HorusResult<Self> {
        let yaml_str = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml_str)
    }

    /// Get a parameter value
    ///
    /// Returns `None` if the key is missing or the stored value does not
    /// deserialize into `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.try_get(key).ok().flatten()
    }

    /// Get a parameter value, distinguishing a missing key from a type mismatch
    pub fn try_get<T: DeserializeOwned>(&self, key: &str) -> HorusResult<Option<T>> {
        let value = match self.params.read().get(key) {
            Some(value) => value.clone(),
            None => return Ok(None),
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| HorusError::ParamType {
                name: key.to_string(),
                reason: e.to_string(),
            })
    }

    /// Get parameter with default
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Set a parameter value
    pub fn set<T: Serialize>(&self, key: &str, value: T) -> HorusResult<()> {
        let json_value = serde_json::to_value(value)?;
        self.params.write().insert(key.to_string(), json_value);
        Ok(())
    }

    /// Check if a parameter exists
    pub fn has(&self, key: &str) -> bool {
        self.params.read().contains_key(key)
    }

    /// List all parameter keys
    pub fn list_keys(&self) -> Vec<String> {
        self.params.read().keys().cloned().collect()
    }

    /// Remove a parameter
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.params.write().remove(key)
    }

    /// Save parameters to YAML file
    pub fn save_to_disk(&self, path: &Path) -> HorusResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(&*self.params.read())?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Merge parameters from a YAML file, overwriting existing keys
    pub fn load_from_disk(&self, path: &Path) -> HorusResult<()> {
        let yaml_str = std::fs::read_to_string(path)?;
        let loaded: BTreeMap<String, Value> = serde_yaml::from_str(&yaml_str)?;
        self.params.write().extend(loaded);
        Ok(())
    }
}

/// Loads typed parameters from a [`RuntimeParams`] store
///
/// Each loader tracks its own outcome: a missing or mistyped compulsory
/// parameter marks this loader as failed, nothing else.
///
/// ```rust,ignore
/// let mut loader = ParamLoader::new(&params, "control_manager");
/// let name: Option<String> = loader.load_param_compulsory("uav_name");
/// let rate = loader.load_param("rate", 100.0);
/// loader.finish()?;
/// ```
#[derive(Debug)]
pub struct ParamLoader<'a> {
    params: &'a RuntimeParams,
    node_name: String,
    print_values: bool,
    missing: Vec<String>,
}

impl<'a> ParamLoader<'a> {
    /// Create a loader reporting under the given node name
    pub fn new(params: &'a RuntimeParams, node_name: impl Into<String>) -> Self {
        Self {
            params,
            node_name: node_name.into(),
            print_values: true,
            missing: Vec::new(),
        }
    }

    /// Enable or disable logging of every loaded value
    pub fn set_print_values(&mut self, print_values: bool) {
        self.print_values = print_values;
    }

    /// Load an optional parameter, falling back to `default`
    pub fn load_param<T: DeserializeOwned + Debug>(&mut self, name: &str, default: T) -> T {
        match self.params.try_get::<T>(name) {
            Ok(Some(value)) => {
                self.print(name, &value);
                value
            }
            Ok(None) => {
                self.print(name, &default);
                default
            }
            Err(e) => {
                log::warn!("[{}]: {}, using default {:?}", self.node_name, e, default);
                default
            }
        }
    }

    /// Load an optional parameter without a default
    pub fn load_param_optional<T: DeserializeOwned + Debug>(&mut self, name: &str) -> Option<T> {
        match self.params.try_get::<T>(name) {
            Ok(Some(value)) => {
                self.print(name, &value);
                Some(value)
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!("[{}]: {}, ignoring it", self.node_name, e);
                None
            }
        }
    }

    /// Load a compulsory parameter
    ///
    /// A missing or mistyped value is logged as an error and marks this
    /// loader as unsuccessful.
    pub fn load_param_compulsory<T: DeserializeOwned + Debug>(&mut self, name: &str) -> Option<T> {
        match self.params.try_get::<T>(name) {
            Ok(Some(value)) => {
                self.print(name, &value);
                Some(value)
            }
            Ok(None) => {
                log::error!(
                    "[{}]: Could not load non-optional parameter {}",
                    self.node_name,
                    name
                );
                self.missing.push(name.to_string());
                None
            }
            Err(e) => {
                log::error!("[{}]: {}", self.node_name, e);
                self.missing.push(name.to_string());
                None
            }
        }
    }

    /// Whether every compulsory parameter requested so far was loaded
    pub fn loaded_successfully(&self) -> bool {
        self.missing.is_empty()
    }

    /// Names of compulsory parameters that failed to load
    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    /// Consume the loader, turning a failed load into an error
    pub fn finish(self) -> HorusResult<()> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(HorusError::config(format!(
                "[{}]: could not load compulsory parameters: {}",
                self.node_name,
                self.missing.join(", ")
            )))
        }
    }

    fn print<T: Debug>(&self, name: &str, value: &T) {
        if self.print_values {
            log::info!("[{}]: parameter '{}':\t{:?}", self.node_name, name, value);
        }
    }
}
