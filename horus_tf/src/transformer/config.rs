//! Construction-time configuration of a [`Transformer`](super::Transformer)

use horus_core::{HorusError, HorusResult, ParamLoader, RuntimeParams};
use std::time::Duration;

/// Identity and limits of a transformer
#[derive(Debug, Clone, PartialEq)]
pub struct TransformerConfig {
    /// Name used to prefix log messages
    pub node_name: String,

    /// Vehicle namespace prepended to bare frame names (e.g. `uav1`)
    ///
    /// Default: None (bare names stay bare)
    pub uav_name: Option<String>,

    /// Maximum age of a latest-available transform used as fallback
    ///
    /// Exact-time lookups are never rejected for age.
    ///
    /// Default: None (no bound)
    pub cache_timeout: Option<Duration>,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self::new("transformer")
    }
}

impl TransformerConfig {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            uav_name: None,
            cache_timeout: None,
        }
    }

    pub fn with_uav_name(mut self, uav_name: impl Into<String>) -> Self {
        let uav_name: String = uav_name.into();
        self.uav_name = (!uav_name.is_empty()).then_some(uav_name);
        self
    }

    pub fn with_cache_timeout(mut self, cache_timeout: Duration) -> Self {
        self.cache_timeout = Some(cache_timeout);
        self
    }

    /// Load from a parameter store
    ///
    /// Keys: `node_name` (compulsory), `uav_name`, `cache_timeout` (seconds).
    pub fn from_params(params: &RuntimeParams) -> HorusResult<Self> {
        let mut loader = ParamLoader::new(params, "Transformer");
        let node_name: Option<String> = loader.load_param_compulsory("node_name");
        let uav_name: Option<String> = loader.load_param_optional("uav_name");
        let cache_timeout: Option<f64> = loader.load_param_optional("cache_timeout");
        loader.finish()?;

        let mut config = Self::new(node_name.unwrap_or_default());
        if let Some(uav_name) = uav_name {
            config = config.with_uav_name(uav_name);
        }
        if let Some(secs) = cache_timeout {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(HorusError::config(format!(
                    "cache_timeout must be a positive number of seconds, got {}",
                    secs
                )));
            }
            config = config.with_cache_timeout(Duration::from_secs_f64(secs));
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> HorusResult<()> {
        if self.node_name.is_empty() {
            return Err(HorusError::config("node_name must not be empty"));
        }
        if let Some(uav_name) = &self.uav_name {
            if uav_name.contains('/') {
                return Err(HorusError::config(format!(
                    "uav_name '{}' must not contain '/'",
                    uav_name
                )));
            }
        }
        if self.cache_timeout == Some(Duration::ZERO) {
            return Err(HorusError::config("cache_timeout must be positive"));
        }
        Ok(())
    }
}
