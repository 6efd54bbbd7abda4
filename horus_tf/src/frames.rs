//! Frame name conventions
//!
//! Frames of a vehicle live under its namespace, e.g. `uav1/fcu`. Requests
//! may use bare names (`fcu`), which get the configured vehicle namespace
//! prepended, or the empty name, which stands for the current control frame.

use crate::registry::ControlFrameRegistry;
use horus_core::warn_throttled;

/// Every vehicle namespace starts with this token
pub const UAV_NAMESPACE_TOKEN: &str = "uav";

/// Geodetic pseudo-frame: positions are (latitude, longitude, altitude)
pub const LATLON_ORIGIN: &str = "latlon_origin";

/// Planar frame the geodetic pseudo-frame is projected into
pub const UTM_ORIGIN: &str = "utm_origin";

/// Seconds between repeated resolver warnings from one call site
const WARN_PERIOD_SECS: f64 = 1.0;

/// Canonicalizes frame names
#[derive(Debug, Clone)]
pub struct FrameNameResolver {
    node_name: String,
    uav_name: Option<String>,
}

impl FrameNameResolver {
    /// `uav_name` of `None` (or empty) disables namespacing of bare names
    pub fn new(node_name: impl Into<String>, uav_name: Option<String>) -> Self {
        Self {
            node_name: node_name.into(),
            uav_name: uav_name.filter(|name| !name.is_empty()),
        }
    }

    pub fn uav_name(&self) -> Option<&str> {
        self.uav_name.as_deref()
    }

    /// Fully-qualified name for `name`
    ///
    /// An empty result means the name could not be resolved (the control
    /// frame was never set) and must not be used for lookups.
    pub fn resolve(&self, name: &str, control_frame: &ControlFrameRegistry) -> String {
        if name.is_empty() {
            return match control_frame.get() {
                Some(frame) => frame,
                None => {
                    warn_throttled!(
                        WARN_PERIOD_SECS,
                        "[{}]: Transformer: could not resolve an empty frame_id, missing the current control frame (are you calling set_current_control_frame()?)",
                        self.node_name
                    );
                    String::new()
                }
            };
        }

        if !name.starts_with(UAV_NAMESPACE_TOKEN) {
            match &self.uav_name {
                Some(uav_name) => return format!("{}/{}", uav_name, name),
                None => {
                    warn_throttled!(
                        WARN_PERIOD_SECS,
                        "[{}]: Transformer: could not deduce a namespaced frame_id '{}' (did you construct the Transformer with a uav_name?)",
                        self.node_name,
                        name
                    );
                }
            }
        }

        name.to_string()
    }

    /// Name of the planar frame paired with the geodetic frame of `frame`'s vehicle
    pub fn utm_origin_for(frame: &str) -> String {
        format!("{}/{}", namespace_prefix(frame), UTM_ORIGIN)
    }
}

/// Vehicle namespace of a frame name
///
/// `"uav1/world"` gives `"uav1"`, a namespaced name without a slash is
/// returned whole, and a name outside any namespace gives `""`.
pub fn namespace_prefix(name: &str) -> &str {
    if !name.starts_with(UAV_NAMESPACE_TOKEN) {
        return "";
    }
    match name[UAV_NAMESPACE_TOKEN.len()..].find('/') {
        Some(pos) => &name[..UAV_NAMESPACE_TOKEN.len() + pos],
        None => name,
    }
}
