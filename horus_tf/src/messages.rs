//! Stamped message types consumed and produced by the transformer

use crate::transform::{quaternion_from_yaw, yaw_from_quaternion, Transform};
use serde::{Deserialize, Serialize};

/// Frame and time a message refers to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// Frame the payload is expressed in (may be empty or unnamespaced before resolution)
    pub frame_id: String,
    /// Timestamp in nanoseconds since the UNIX epoch
    pub stamp: u64,
}

impl Header {
    pub fn new(frame_id: impl Into<String>, stamp: u64) -> Self {
        Self {
            frame_id: frame_id.into(),
            stamp,
        }
    }
}

/// Position and orientation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Position [x, y, z]
    pub position: [f64; 3],
    /// Orientation quaternion [x, y, z, w]
    pub orientation: [f64; 4],
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            orientation: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl Pose {
    pub fn new(position: [f64; 3], orientation: [f64; 4]) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Pose with an orientation given as yaw only
    pub fn from_position_yaw(position: [f64; 3], yaw: f64) -> Self {
        Self {
            position,
            orientation: quaternion_from_yaw(yaw),
        }
    }

    /// Apply a rigid transform to this pose
    pub fn transformed(&self, tf: &Transform) -> Pose {
        Pose {
            position: tf.transform_point(self.position),
            orientation: tf.transform_orientation(self.orientation),
        }
    }
}

/// A pose with a header
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseStamped {
    pub header: Header,
    pub pose: Pose,
}

impl PoseStamped {
    pub fn new(frame_id: impl Into<String>, stamp: u64, pose: Pose) -> Self {
        Self {
            header: Header::new(frame_id, stamp),
            pose,
        }
    }
}

/// Position plus heading, as used for UAV control references
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    /// Position [x, y, z]
    pub position: [f64; 3],
    /// Heading (yaw) in radians
    pub heading: f64,
}

/// A reference with a header
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceStamped {
    pub header: Header,
    pub reference: Reference,
}

impl ReferenceStamped {
    pub fn new(frame_id: impl Into<String>, stamp: u64, position: [f64; 3], heading: f64) -> Self {
        Self {
            header: Header::new(frame_id, stamp),
            reference: Reference { position, heading },
        }
    }

    /// Lift into a pose (heading becomes a rotation about Z)
    pub fn to_pose(&self) -> PoseStamped {
        PoseStamped {
            header: self.header.clone(),
            pose: Pose::from_position_yaw(self.reference.position, self.reference.heading),
        }
    }

    /// Project a pose back onto position plus heading
    pub fn from_pose(pose: &PoseStamped) -> Self {
        Self {
            header: pose.header.clone(),
            reference: Reference {
                position: pose.pose.position,
                heading: yaw_from_quaternion(pose.pose.orientation),
            },
        }
    }
}

/// Transform message published by store producers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformStamped {
    /// Parent frame and timestamp
    pub header: Header,
    /// Child frame
    pub child_frame_id: String,
    /// Pose of the child frame in the parent frame
    pub transform: Transform,
}

impl TransformStamped {
    pub fn new(
        parent: impl Into<String>,
        child: impl Into<String>,
        stamp: u64,
        transform: Transform,
    ) -> Self {
        Self {
            header: Header::new(parent, stamp),
            child_frame_id: child.into(),
            transform,
        }
    }
}
