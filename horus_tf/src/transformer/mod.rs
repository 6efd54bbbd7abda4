//! Transformer - pose transformation between named frames
//!
//! Resolves frame names under the vehicle namespace convention, looks
//! transforms up in a [`TransformStore`] with an exact-time then
//! latest-available fallback, and splices in the nonlinear UTM projection
//! when either endpoint is the geodetic pseudo-frame
//! ([`LATLON_ORIGIN`](crate::frames::LATLON_ORIGIN)).
//!
//! # Example
//!
//! ```rust,ignore
//! use horus_tf::{create_shared_tree, Pose, Transformer, TransformerConfig};
//!
//! let tree = create_shared_tree();
//! let transformer = Transformer::new(
//!     TransformerConfig::new("control_manager").with_uav_name("uav1"),
//!     tree.clone(),
//! )?;
//!
//! transformer.set_current_control_frame("uav1/fcu");
//! transformer.set_current_lat_lon(50.0, 14.4);
//!
//! // Bare names get the "uav1/" prefix, "" means the control frame
//! let pose = transformer.transform_pose(&pose_in_fcu, "local_origin");
//! ```
//!
//! Every request method takes `&self`; share the transformer across threads
//! with an `Arc`.

mod compose;
mod config;
mod error;

pub use config::TransformerConfig;
pub use error::{LookupError, TransformError};

use crate::frames::{FrameNameResolver, LATLON_ORIGIN};
use crate::geodetic::{self, UtmZone};
use crate::messages::{Pose, PoseStamped, ReferenceStamped};
use crate::registry::{ControlFrameRegistry, UtmZoneRegistry};
use crate::stamped::StampedTransform;
use crate::store::TransformStore;
use horus_core::{error_throttled, warn_throttled, HorusResult};
use parking_lot::RwLock;
use std::sync::Arc;

/// Seconds between repeated failure reports from one call site
const REPORT_PERIOD_SECS: f64 = 1.0;

/// A request to express a pose in another frame
#[derive(Debug, Clone, PartialEq)]
pub struct TransformRequest {
    /// Frame the pose is given in (may be empty or bare)
    pub from_frame: String,
    /// Frame to express the pose in (may be empty or bare)
    pub to_frame: String,
    /// Logical time of the pose in nanoseconds
    pub stamp: u64,
    pub pose: Pose,
}

impl TransformRequest {
    pub fn new(
        from_frame: impl Into<String>,
        to_frame: impl Into<String>,
        stamp: u64,
        pose: Pose,
    ) -> Self {
        Self {
            from_frame: from_frame.into(),
            to_frame: to_frame.into(),
            stamp,
            pose,
        }
    }

    /// Request taking frame and stamp from the pose header
    pub fn from_pose(pose: &PoseStamped, to_frame: impl Into<String>) -> Self {
        Self::new(
            pose.header.frame_id.clone(),
            to_frame,
            pose.header.stamp,
            pose.pose,
        )
    }
}

/// Transforms poses between frames
///
/// A default-constructed transformer has no store and rejects every request.
pub struct Transformer {
    config: TransformerConfig,
    resolver: FrameNameResolver,
    control_frame: ControlFrameRegistry,
    utm_zone: UtmZoneRegistry,
    store: RwLock<Option<Arc<dyn TransformStore>>>,
}

impl Default for Transformer {
    fn default() -> Self {
        let config = TransformerConfig::default();
        Self {
            resolver: FrameNameResolver::new(&config.node_name, None),
            config,
            control_frame: ControlFrameRegistry::new(),
            utm_zone: UtmZoneRegistry::new(),
            store: RwLock::new(None),
        }
    }
}

impl std::fmt::Debug for Transformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transformer")
            .field("config", &self.config)
            .field("control_frame", &self.control_frame.get())
            .field("utm_zone", &self.utm_zone.get())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl Clone for Transformer {
    fn clone(&self) -> Self {
        self.snapshot()
    }
}

impl Transformer {
    /// Create an initialized transformer reading from `store`
    pub fn new<S: TransformStore + 'static>(
        config: TransformerConfig,
        store: Arc<S>,
    ) -> HorusResult<Self> {
        config.validate()?;

        let store: Arc<dyn TransformStore> = store;
        let resolver = FrameNameResolver::new(&config.node_name, config.uav_name.clone());
        if resolver.uav_name().is_none() {
            log::warn!(
                "[{}]: Transformer: no uav_name given, bare frame names will not be namespaced",
                config.node_name
            );
        }
        log::info!(
            "[{}]: Transformer: initialized (uav_name: {:?}, cache_timeout: {:?})",
            config.node_name,
            config.uav_name,
            config.cache_timeout
        );

        Ok(Self {
            config,
            resolver,
            control_frame: ControlFrameRegistry::new(),
            utm_zone: UtmZoneRegistry::new(),
            store: RwLock::new(Some(store)),
        })
    }

    /// Independent copy of this transformer
    ///
    /// Each registry is copied under its own lock; the store handle is
    /// shared, not re-created.
    pub fn snapshot(&self) -> Self {
        let control_frame = self.control_frame.snapshot();
        let utm_zone = self.utm_zone.snapshot();
        let store = self.store_handle();

        Self {
            config: self.config.clone(),
            resolver: self.resolver.clone(),
            control_frame,
            utm_zone,
            store: RwLock::new(store),
        }
    }

    pub fn config(&self) -> &TransformerConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.store.read().is_some()
    }

    /// Swap the transform store, e.g. after its producer was restarted
    pub fn replace_store<S: TransformStore + 'static>(&self, store: Arc<S>) {
        let store: Arc<dyn TransformStore> = store;
        *self.store.write() = Some(store);
    }

    /// Set the frame used for empty frame names
    pub fn set_current_control_frame(&self, frame: impl Into<String>) {
        self.control_frame.set(frame.into());
    }

    pub fn current_control_frame(&self) -> Option<String> {
        self.control_frame.get()
    }

    /// Anchor the geodetic conversion: remember the UTM zone of (`lat`, `lon`)
    pub fn set_current_lat_lon(&self, lat: f64, lon: f64) {
        let zone = geodetic::ll_to_utm(lat, lon).zone;
        self.utm_zone.set(zone);
    }

    pub fn current_utm_zone(&self) -> Option<UtmZone> {
        self.utm_zone.get()
    }

    /// Canonical form of a frame name (see [`FrameNameResolver::resolve`])
    pub fn resolve_frame_name(&self, name: &str) -> String {
        self.resolver.resolve(name, &self.control_frame)
    }

    /// Transform from `from` to `to` at `stamp`, falling back to the latest available one
    pub fn get_transform(&self, from: &str, to: &str, stamp: u64) -> Option<StampedTransform> {
        self.try_get_transform(from, to, stamp)
            .map_err(|e| self.report(&e))
            .ok()
    }

    /// Express a pose in another frame
    pub fn transform(&self, request: &TransformRequest) -> Option<PoseStamped> {
        self.try_transform(request).map_err(|e| self.report(&e)).ok()
    }

    /// Express a stamped pose in `to_frame`
    pub fn transform_pose(&self, pose: &PoseStamped, to_frame: &str) -> Option<PoseStamped> {
        self.transform(&TransformRequest::from_pose(pose, to_frame))
    }

    /// Express a position + heading reference in `to_frame`
    pub fn transform_reference(
        &self,
        reference: &ReferenceStamped,
        to_frame: &str,
    ) -> Option<ReferenceStamped> {
        self.transform_pose(&reference.to_pose(), to_frame)
            .map(|pose| ReferenceStamped::from_pose(&pose))
    }

    /// Apply a transform obtained earlier from [`get_transform`](Self::get_transform)
    pub fn transform_with(&self, tf: &StampedTransform, pose: &PoseStamped) -> Option<PoseStamped> {
        self.try_transform_with(tf, pose)
            .map_err(|e| self.report(&e))
            .ok()
    }

    /// Fallible version of [`get_transform`](Self::get_transform)
    pub fn try_get_transform(
        &self,
        from: &str,
        to: &str,
        stamp: u64,
    ) -> Result<StampedTransform, TransformError> {
        let store = self.store_handle().ok_or(TransformError::NotInitialized)?;
        let (from, to) = self.resolve_endpoints(from, to)?;

        if from == self.latlon_frame() || to == self.latlon_frame() {
            return Ok(StampedTransform::geodetic(from, to, stamp));
        }

        self.lookup_linear(store.as_ref(), &from, &to, stamp)
    }

    /// Fallible version of [`transform`](Self::transform)
    pub fn try_transform(&self, request: &TransformRequest) -> Result<PoseStamped, TransformError> {
        let store = self.store_handle().ok_or(TransformError::NotInitialized)?;
        let (from, to) = self.resolve_endpoints(&request.from_frame, &request.to_frame)?;
        self.compose(store.as_ref(), &from, &to, request.stamp, &request.pose)
    }

    /// Fallible version of [`transform_with`](Self::transform_with)
    pub fn try_transform_with(
        &self,
        tf: &StampedTransform,
        pose: &PoseStamped,
    ) -> Result<PoseStamped, TransformError> {
        let store = self.store_handle().ok_or(TransformError::NotInitialized)?;
        let frame = self.resolve_frame_name(&pose.header.frame_id);
        if frame.is_empty() {
            return Err(TransformError::MissingControlFrame);
        }

        if frame == tf.to() {
            return Ok(PoseStamped::new(tf.to(), pose.header.stamp, pose.pose));
        }
        if frame != tf.from() {
            return Err(TransformError::FrameMismatch {
                expected: tf.from().to_string(),
                actual: frame,
            });
        }

        match tf.transform() {
            Some(transform) => Ok(PoseStamped::new(
                tf.to(),
                pose.header.stamp,
                pose.pose.transformed(transform),
            )),
            None => self.compose(store.as_ref(), tf.from(), tf.to(), pose.header.stamp, &pose.pose),
        }
    }

    /// Store handle, cloned so that no lock is held during lookups
    fn store_handle(&self) -> Option<Arc<dyn TransformStore>> {
        self.store.read().clone()
    }

    fn resolve_endpoints(&self, from: &str, to: &str) -> Result<(String, String), TransformError> {
        let from = self.resolve_frame_name(from);
        let to = self.resolve_frame_name(to);
        if from.is_empty() || to.is_empty() {
            return Err(TransformError::MissingControlFrame);
        }
        Ok((from, to))
    }

    fn latlon_frame(&self) -> String {
        self.resolve_frame_name(LATLON_ORIGIN)
    }

    /// Log a failed request, rate limited per kind
    fn report(&self, error: &TransformError) {
        let node = &self.config.node_name;
        match error {
            TransformError::NotInitialized => {
                error_throttled!(
                    REPORT_PERIOD_SECS,
                    "[{}]: Transformer: cannot provide transform, not initialized",
                    node
                );
            }
            TransformError::MissingControlFrame => {
                warn_throttled!(REPORT_PERIOD_SECS, "[{}]: Transformer: {}", node, error);
            }
            TransformError::MissingUtmZone => {
                warn_throttled!(REPORT_PERIOD_SECS, "[{}]: Transformer: {}", node, error);
            }
            TransformError::LookupFailure { .. } => {
                warn_throttled!(REPORT_PERIOD_SECS, "[{}]: Transformer: {}", node, error);
            }
            TransformError::FrameMismatch { .. } => {
                warn_throttled!(REPORT_PERIOD_SECS, "[{}]: Transformer: {}", node, error);
            }
        }
    }
}
