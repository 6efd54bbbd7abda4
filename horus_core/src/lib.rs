//! # HORUS Core
//!
//! Runtime building blocks shared by the HORUS crates:
//!
//! - **Errors**: [`HorusError`] and the [`HorusResult`] alias
//! - **Parameters**: [`RuntimeParams`] key-value store and [`ParamLoader`]
//! - **Logging**: call-site keyed throttling for the `log` facade
//!   ([`warn_throttled!`], [`error_throttled!`])

pub mod error;
pub mod log_throttle;
pub mod params;

pub use error::{HorusError, HorusResult};
pub use log_throttle::LogThrottle;
pub use params::{ParamLoader, RuntimeParams};

// Used by the throttled logging macros
#[doc(hidden)]
pub use log;
