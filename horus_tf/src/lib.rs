//! HORUS Transformer
//!
//! Pose transformation between named coordinate frames of one or more
//! vehicles.
//!
//! # Overview
//!
//! - Transform math ([`Transform`]) and a time-buffered frame forest
//!   ([`TFTree`]) that producers fill with [`TransformStamped`] messages
//! - Frame naming: vehicle namespaces, control-frame-relative names
//! - Exact-time lookups with a latest-available fallback
//! - Latitude/longitude endpoints through the UTM projection
//!
//! # Example
//!
//! ```rust,ignore
//! use horus_tf::{create_shared_tree, publish_transforms, PoseStamped, Pose,
//!                Transform, TransformStamped, Transformer, TransformerConfig};
//!
//! let tree = create_shared_tree();
//! publish_transforms(&tree, &[TransformStamped::new(
//!     "uav1/local_origin", "uav1/fcu", stamp,
//!     Transform::from_translation([1.0, 0.0, 0.0]),
//! )], false)?;
//!
//! let transformer = Transformer::new(
//!     TransformerConfig::new("tracker").with_uav_name("uav1"),
//!     tree.clone(),
//! )?;
//!
//! let pose = PoseStamped::new("fcu", stamp, Pose::default());
//! let in_local = transformer.transform_pose(&pose, "local_origin");
//! ```

pub mod buffer;
pub mod frames;
pub mod geodetic;
pub mod messages;
pub mod registry;
pub mod stamped;
pub mod store;
pub mod transform;
pub mod transformer;
pub mod tree;

pub use buffer::CircularBuffer;
pub use frames::{namespace_prefix, FrameNameResolver, LATLON_ORIGIN, UTM_ORIGIN};
pub use geodetic::{UtmCoordinate, UtmZone};
pub use messages::{Header, Pose, PoseStamped, Reference, ReferenceStamped, TransformStamped};
pub use registry::{ControlFrameRegistry, Registry, UtmZoneRegistry};
pub use stamped::StampedTransform;
pub use store::{
    create_shared_tree, publish_transforms, LookupTime, SharedTFTree, StoreTransform,
    TransformStore,
};
pub use transform::Transform;
pub use transformer::{
    LookupError, TransformError, TransformRequest, Transformer, TransformerConfig,
};
pub use tree::{FrameNode, TFError, TFResult, TFTree};

/// Get current timestamp in nanoseconds
pub fn timestamp_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_now() {
        let ts = timestamp_now();
        assert!(ts > 0);
    }
}
