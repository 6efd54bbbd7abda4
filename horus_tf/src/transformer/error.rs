use crate::tree::TFError;
use std::time::Duration;
use thiserror::Error;

/// Why a transform request produced no result
///
/// None of these are fatal; the request API turns them into `None` plus a
/// log entry, the `try_*` methods hand them to the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// The transformer was default-constructed and has no transform store
    #[error("Transformer is not initialized")]
    NotInitialized,

    /// An empty frame name was used before any control frame was set
    #[error("cannot resolve an empty frame name, the current control frame was never set")]
    MissingControlFrame,

    /// A transform into latitude/longitude was requested before any geodetic anchor was set
    #[error("cannot transform to latitude/longitude, missing UTM zone (was set_current_lat_lon() called?)")]
    MissingUtmZone,

    /// Neither the exact-time nor the latest-available lookup succeeded
    #[error("no transform from '{from}' to '{to}': {cause}")]
    LookupFailure {
        from: String,
        to: String,
        #[source]
        cause: LookupError,
    },

    /// A pre-fetched transform does not start in the pose's frame
    #[error("pose is in frame '{actual}' but the transform starts in '{expected}'")]
    FrameMismatch { expected: String, actual: String },
}

/// Cause of a [`TransformError::LookupFailure`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    #[error(transparent)]
    Store(#[from] TFError),

    /// The latest available transform is older than the configured cache timeout
    #[error("latest transform is {age:?} old, cache timeout is {timeout:?}")]
    Stale { age: Duration, timeout: Duration },
}
