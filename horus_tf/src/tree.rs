//! TF Tree - Frame hierarchy and transform lookup
//!
//! Manages a forest of coordinate frames and provides transform lookup
//! between any two connected frames, at a given time or at the latest
//! time available on the whole chain.

use crate::buffer::CircularBuffer;
use crate::messages::TransformStamped;
use crate::store::{LookupTime, StoreTransform};
use crate::transform::Transform;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Default buffer duration in seconds
const DEFAULT_BUFFER_DURATION_SECS: f64 = 10.0;

/// Default buffer capacity (samples per frame)
const DEFAULT_BUFFER_CAPACITY: usize = 1000;

/// TF errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TFError {
    #[error("Frame '{0}' not found")]
    FrameNotFound(String),

    #[error("Frame name must not be empty")]
    EmptyFrameName,

    #[error("No common ancestor found between '{0}' and '{1}'")]
    NoCommonAncestor(String, String),

    #[error("Making '{parent}' the parent of '{child}' would create a cycle")]
    CycleDetected { parent: String, child: String },

    #[error(
        "Lookup of frame '{frame}' at {requested} ns requires extrapolation (buffered {oldest}..{newest} ns)"
    )]
    Extrapolation {
        frame: String,
        requested: u64,
        oldest: u64,
        newest: u64,
    },

    #[error("No transform available for frame '{0}'")]
    TransformNotAvailable(String),
}

/// Result type for TF operations
pub type TFResult<T> = Result<T, TFError>;

/// How a frame is attached to its parent
#[derive(Debug, Clone)]
pub enum FrameLink {
    /// No parent
    Root,
    /// Fixed pose in the parent
    Static(Transform),
    /// Time-varying pose in the parent
    Dynamic(CircularBuffer<(u64, Transform)>),
}

/// A node in the transform tree
#[derive(Debug, Clone)]
pub struct FrameNode {
    /// Frame identifier
    pub name: String,
    /// Parent frame name (None for roots)
    pub parent: Option<String>,
    /// Child frame names
    pub children: Vec<String>,
    /// Pose of this frame in its parent
    pub link: FrameLink,
}

impl FrameNode {
    /// Create a new root frame node
    pub fn new_root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            link: FrameLink::Root,
        }
    }

    pub fn is_static(&self) -> bool {
        !matches!(self.link, FrameLink::Dynamic(_))
    }

    /// Newest sample time of a dynamic frame
    pub fn latest_stamp(&self) -> Option<u64> {
        match &self.link {
            FrameLink::Dynamic(buffer) => buffer.latest().map(|(ts, _)| ts),
            _ => None,
        }
    }

    /// Pose of this frame in its parent at `timestamp`
    fn transform_at(&self, timestamp: u64) -> TFResult<Transform> {
        match &self.link {
            FrameLink::Root => Ok(Transform::identity()),
            FrameLink::Static(tf) => Ok(*tf),
            FrameLink::Dynamic(buffer) => {
                let (oldest, newest) = buffer
                    .time_range()
                    .ok_or_else(|| TFError::TransformNotAvailable(self.name.clone()))?;
                buffer
                    .interpolate_at(timestamp)
                    .ok_or_else(|| TFError::Extrapolation {
                        frame: self.name.clone(),
                        requested: timestamp,
                        oldest,
                        newest,
                    })
            }
        }
    }
}

/// Transform forest for managing coordinate frames
///
/// Any frame may be a root; a transform whose parent is unknown creates the
/// parent as a new root.
#[derive(Debug)]
pub struct TFTree {
    /// All frames indexed by name
    frames: HashMap<String, FrameNode>,
    /// Buffer duration in nanoseconds
    buffer_duration_ns: u64,
    /// Buffer capacity per frame
    buffer_capacity: usize,
}

impl Default for TFTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TFTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self {
            frames: HashMap::new(),
            buffer_duration_ns: (DEFAULT_BUFFER_DURATION_SECS * 1e9) as u64,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }

    /// Set how much history dynamic frames keep
    pub fn set_buffer_duration(&mut self, seconds: f64) {
        self.buffer_duration_ns = (seconds.max(0.0) * 1e9) as u64;
    }

    /// Set the buffer capacity for frames created from now on
    pub fn set_buffer_capacity(&mut self, capacity: usize) {
        self.buffer_capacity = capacity.max(1);
    }

    pub fn has_frame(&self, name: &str) -> bool {
        self.frames.contains_key(name)
    }

    pub fn get_frame(&self, name: &str) -> Option<&FrameNode> {
        self.frames.get(name)
    }

    pub fn frame_names(&self) -> Vec<String> {
        self.frames.keys().cloned().collect()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Names of all frames without a parent
    pub fn roots(&self) -> Vec<String> {
        self.frames
            .values()
            .filter(|f| f.parent.is_none())
            .map(|f| f.name.clone())
            .collect()
    }

    /// Set a static transform (fixed, never changes)
    pub fn set_static_transform(
        &mut self,
        parent: &str,
        child: &str,
        transform: Transform,
    ) -> TFResult<()> {
        self.attach(parent, child)?;
        if let Some(frame) = self.frames.get_mut(child) {
            frame.link = FrameLink::Static(transform);
        }
        Ok(())
    }

    /// Add a sample of a dynamic transform (changes over time)
    pub fn set_transform(
        &mut self,
        parent: &str,
        child: &str,
        transform: Transform,
        timestamp: u64,
    ) -> TFResult<()> {
        self.attach(parent, child)?;

        let capacity = self.buffer_capacity;
        let duration = self.buffer_duration_ns;
        if let Some(frame) = self.frames.get_mut(child) {
            if !matches!(frame.link, FrameLink::Dynamic(_)) {
                frame.link = FrameLink::Dynamic(CircularBuffer::new(capacity));
            }
            if let FrameLink::Dynamic(buffer) = &mut frame.link {
                buffer.insert(timestamp, transform);
                if let Some((newest, _)) = buffer.latest() {
                    buffer.prune_before(newest.saturating_sub(duration));
                }
            }
        }
        Ok(())
    }

    /// Insert a transform message
    pub fn apply(&mut self, msg: &TransformStamped, is_static: bool) -> TFResult<()> {
        if is_static {
            self.set_static_transform(&msg.header.frame_id, &msg.child_frame_id, msg.transform)
        } else {
            self.set_transform(
                &msg.header.frame_id,
                &msg.child_frame_id,
                msg.transform,
                msg.header.stamp,
            )
        }
    }

    /// Make `parent` the parent of `child`, creating either frame as needed
    fn attach(&mut self, parent: &str, child: &str) -> TFResult<()> {
        if parent.is_empty() || child.is_empty() {
            return Err(TFError::EmptyFrameName);
        }
        if parent == child || self.ancestors(parent).iter().any(|a| a == child) {
            return Err(TFError::CycleDetected {
                parent: parent.to_string(),
                child: child.to_string(),
            });
        }

        self.frames
            .entry(parent.to_string())
            .or_insert_with(|| FrameNode::new_root(parent));

        let previous_parent = self
            .frames
            .entry(child.to_string())
            .or_insert_with(|| FrameNode::new_root(child))
            .parent
            .replace(parent.to_string());

        if previous_parent.as_deref() != Some(parent) {
            if let Some(old) = previous_parent {
                if let Some(old_parent) = self.frames.get_mut(&old) {
                    old_parent.children.retain(|c| c != child);
                }
            }
            if let Some(parent_frame) = self.frames.get_mut(parent) {
                parent_frame.children.push(child.to_string());
            }
        }
        Ok(())
    }

    /// Frames above `name`, nearest first
    fn ancestors(&self, name: &str) -> Vec<String> {
        let mut ancestors = Vec::new();
        let mut current = self.frames.get(name).and_then(|f| f.parent.clone());
        while let Some(parent) = current {
            if ancestors.contains(&parent) {
                break;
            }
            current = self.frames.get(&parent).and_then(|f| f.parent.clone());
            ancestors.push(parent);
        }
        ancestors
    }

    /// Lookup the transform mapping points expressed in `source` into `target`
    pub fn lookup_transform(
        &self,
        target: &str,
        source: &str,
        time: LookupTime,
    ) -> TFResult<StoreTransform> {
        if target.is_empty() || source.is_empty() {
            return Err(TFError::EmptyFrameName);
        }
        if source == target {
            return Ok(StoreTransform {
                transform: Transform::identity(),
                stamp: time.timestamp(),
            });
        }

        let (source_path, target_path) = self.find_paths_to_common_ancestor(source, target)?;

        // The common ancestor closes both paths and contributes no link
        let source_links = &source_path[..source_path.len() - 1];
        let target_links = &target_path[..target_path.len() - 1];

        let stamp = match time {
            LookupTime::At(t) => Some(t),
            LookupTime::Latest => self.common_latest_stamp(source_links, target_links)?,
        };
        let uses_dynamic = source_links
            .iter()
            .chain(target_links)
            .any(|name| self.frames.get(name).map(|f| !f.is_static()).unwrap_or(false));
        let sample_time = stamp.unwrap_or(0);

        let ancestor_from_source = self.chain_transform(source_links, sample_time)?;
        let ancestor_from_target = self.chain_transform(target_links, sample_time)?;

        Ok(StoreTransform {
            transform: ancestor_from_target.inverse().compose(&ancestor_from_source),
            stamp: if uses_dynamic { stamp } else { time.timestamp() },
        })
    }

    /// Check if a transform is available between two frames
    pub fn can_transform(&self, target: &str, source: &str, time: LookupTime) -> bool {
        self.lookup_transform(target, source, time).is_ok()
    }

    /// Get the chain of frames from source to target
    pub fn frame_chain(&self, source: &str, target: &str) -> TFResult<Vec<String>> {
        if source == target {
            return Ok(vec![source.to_string()]);
        }

        let (mut source_path, target_path) = self.find_paths_to_common_ancestor(source, target)?;

        // Combine paths: source -> common ancestor -> target
        for frame in target_path.into_iter().rev().skip(1) {
            source_path.push(frame);
        }

        Ok(source_path)
    }

    /// Pose of the last frame's parent relative to the first frame, composed upwards
    fn chain_transform(&self, links: &[String], timestamp: u64) -> TFResult<Transform> {
        let mut transform = Transform::identity();
        for name in links {
            let frame = self
                .frames
                .get(name)
                .ok_or_else(|| TFError::FrameNotFound(name.clone()))?;
            transform = frame.transform_at(timestamp)?.compose(&transform);
        }
        Ok(transform)
    }

    /// Newest time at which every dynamic link of the chain has data
    fn common_latest_stamp(
        &self,
        source_links: &[String],
        target_links: &[String],
    ) -> TFResult<Option<u64>> {
        let mut common: Option<u64> = None;
        for name in source_links.iter().chain(target_links) {
            let frame = self
                .frames
                .get(name)
                .ok_or_else(|| TFError::FrameNotFound(name.clone()))?;
            if frame.is_static() {
                continue;
            }
            let newest = frame
                .latest_stamp()
                .ok_or_else(|| TFError::TransformNotAvailable(name.clone()))?;
            common = Some(common.map_or(newest, |c| c.min(newest)));
        }
        Ok(common)
    }

    /// Find paths from source and target to their common ancestor
    fn find_paths_to_common_ancestor(
        &self,
        source: &str,
        target: &str,
    ) -> TFResult<(Vec<String>, Vec<String>)> {
        for name in [source, target] {
            if !self.frames.contains_key(name) {
                return Err(TFError::FrameNotFound(name.to_string()));
            }
        }

        let mut source_path = vec![source.to_string()];
        source_path.extend(self.ancestors(source));
        let mut target_path = vec![target.to_string()];
        target_path.extend(self.ancestors(target));

        for (i, source_frame) in source_path.iter().enumerate() {
            if let Some(j) = target_path.iter().position(|f| f == source_frame) {
                return Ok((source_path[..=i].to_vec(), target_path[..=j].to_vec()));
            }
        }

        Err(TFError::NoCommonAncestor(
            source.to_string(),
            target.to_string(),
        ))
    }

    /// Remove a frame and everything below it
    pub fn remove_frame(&mut self, name: &str) -> TFResult<()> {
        let frame = self
            .frames
            .remove(name)
            .ok_or_else(|| TFError::FrameNotFound(name.to_string()))?;

        if let Some(parent) = &frame.parent {
            if let Some(parent_frame) = self.frames.get_mut(parent) {
                parent_frame.children.retain(|c| c != name);
            }
        }

        for child in frame.children {
            // Children are always present, a miss only means it was already removed
            let _ = self.remove_frame(&child);
        }
        Ok(())
    }

    /// Remove all frames
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Validate the structure: parents exist and no frame is its own ancestor
    pub fn validate(&self) -> TFResult<()> {
        for frame in self.frames.values() {
            if let Some(parent) = &frame.parent {
                if !self.frames.contains_key(parent) {
                    return Err(TFError::FrameNotFound(parent.clone()));
                }
            }

            let mut visited = HashSet::new();
            let mut current = Some(frame.name.as_str());
            while let Some(name) = current {
                if !visited.insert(name) {
                    return Err(TFError::CycleDetected {
                        parent: name.to_string(),
                        child: frame.name.clone(),
                    });
                }
                current = self.frames.get(name).and_then(|f| f.parent.as_deref());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SEC: u64 = 1_000_000_000;

    #[test]
    fn test_parent_created_as_root() {
        let mut tree = TFTree::new();
        tree.set_static_transform("world", "base_link", Transform::from_translation([1.0, 0.0, 0.0]))
            .unwrap();

        assert!(tree.has_frame("world"));
        assert!(tree.has_frame("base_link"));
        assert_eq!(tree.roots(), vec!["world".to_string()]);
        assert_eq!(tree.get_frame("world").unwrap().children, vec!["base_link"]);
    }

    #[test]
    fn test_lookup_identity() {
        let tree = TFTree::new();
        let tf = tree.lookup_transform("world", "world", LookupTime::At(5)).unwrap();
        assert!(tf.transform.is_identity(1e-10));
    }

    #[test]
    fn test_lookup_direct_and_inverse() {
        let mut tree = TFTree::new();
        tree.set_static_transform("world", "robot", Transform::from_translation([1.0, 2.0, 3.0]))
            .unwrap();

        // Robot origin expressed in world
        let tf = tree.lookup_transform("world", "robot", LookupTime::Latest).unwrap();
        assert_eq!(tf.transform.transform_point([0.0; 3]), [1.0, 2.0, 3.0]);
        assert_eq!(tf.stamp, None);

        // World origin expressed in robot
        let tf = tree.lookup_transform("robot", "world", LookupTime::Latest).unwrap();
        assert_relative_eq!(tf.transform.translation[0], -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_lookup_across_branches() {
        let mut tree = TFTree::new();
        tree.set_static_transform("world", "a", Transform::from_translation([1.0, 0.0, 0.0]))
            .unwrap();
        tree.set_static_transform(
            "world",
            "b",
            Transform::from_translation_yaw([0.0, 1.0, 0.0], std::f64::consts::FRAC_PI_2),
        )
        .unwrap();

        // Origin of `a` is (1, 0) in world, (-1, -1) in b rotated by 90 degrees
        let tf = tree.lookup_transform("b", "a", LookupTime::At(0)).unwrap();
        let p = tf.transform.transform_point([0.0; 3]);
        assert_relative_eq!(p[0], -1.0, epsilon = 1e-9);
        assert_relative_eq!(p[1], -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_dynamic_lookup_and_extrapolation() {
        let mut tree = TFTree::new();
        tree.set_transform("odom", "fcu", Transform::from_translation([0.0, 0.0, 0.0]), 10 * SEC)
            .unwrap();
        tree.set_transform("odom", "fcu", Transform::from_translation([2.0, 0.0, 0.0]), 12 * SEC)
            .unwrap();

        let tf = tree.lookup_transform("odom", "fcu", LookupTime::At(11 * SEC)).unwrap();
        assert_relative_eq!(tf.transform.translation[0], 1.0, epsilon = 1e-9);
        assert_eq!(tf.stamp, Some(11 * SEC));

        let err = tree.lookup_transform("odom", "fcu", LookupTime::At(5 * SEC)).unwrap_err();
        assert!(matches!(err, TFError::Extrapolation { .. }));

        let tf = tree.lookup_transform("odom", "fcu", LookupTime::Latest).unwrap();
        assert_relative_eq!(tf.transform.translation[0], 2.0, epsilon = 1e-9);
        assert_eq!(tf.stamp, Some(12 * SEC));
    }

    #[test]
    fn test_latest_uses_common_time() {
        let mut tree = TFTree::new();
        for (ts, x) in [(1, 0.0), (2, 1.0), (3, 2.0)] {
            tree.set_transform("world", "a", Transform::from_translation([x, 0.0, 0.0]), ts * SEC)
                .unwrap();
        }
        tree.set_transform("a", "b", Transform::identity(), SEC).unwrap();
        tree.set_transform("a", "b", Transform::identity(), 2 * SEC).unwrap();

        let tf = tree.lookup_transform("world", "b", LookupTime::Latest).unwrap();
        assert_eq!(tf.stamp, Some(2 * SEC));
        assert_relative_eq!(tf.transform.translation[0], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_disconnected_trees() {
        let mut tree = TFTree::new();
        tree.set_static_transform("uav1/world", "uav1/fcu", Transform::identity())
            .unwrap();
        tree.set_static_transform("uav2/world", "uav2/fcu", Transform::identity())
            .unwrap();

        let err = tree
            .lookup_transform("uav2/fcu", "uav1/fcu", LookupTime::Latest)
            .unwrap_err();
        assert!(matches!(err, TFError::NoCommonAncestor(_, _)));

        let err = tree
            .lookup_transform("uav1/fcu", "unknown", LookupTime::Latest)
            .unwrap_err();
        assert_eq!(err, TFError::FrameNotFound("unknown".to_string()));
    }

    #[test]
    fn test_cycle_rejected() {
        let mut tree = TFTree::new();
        tree.set_static_transform("world", "base", Transform::identity())
            .unwrap();
        tree.set_static_transform("base", "arm", Transform::identity())
            .unwrap();

        let result = tree.set_static_transform("arm", "world", Transform::identity());
        assert!(matches!(result, Err(TFError::CycleDetected { .. })));
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_reparent() {
        let mut tree = TFTree::new();
        tree.set_static_transform("map", "fcu", Transform::identity())
            .unwrap();
        tree.set_static_transform("odom", "fcu", Transform::identity())
            .unwrap();

        assert!(tree.get_frame("map").unwrap().children.is_empty());
        assert_eq!(tree.get_frame("odom").unwrap().children, vec!["fcu"]);
    }

    #[test]
    fn test_frame_chain() {
        let mut tree = TFTree::new();
        tree.set_static_transform("world", "base", Transform::identity())
            .unwrap();
        tree.set_static_transform("base", "arm", Transform::identity())
            .unwrap();
        tree.set_static_transform("arm", "gripper", Transform::identity())
            .unwrap();

        let chain = tree.frame_chain("world", "gripper").unwrap();
        assert_eq!(chain, vec!["world", "base", "arm", "gripper"]);
    }

    #[test]
    fn test_buffer_duration_prunes_history() {
        let mut tree = TFTree::new();
        tree.set_buffer_duration(2.0);
        for ts in 1..=5 {
            tree.set_transform("odom", "fcu", Transform::identity(), ts * SEC)
                .unwrap();
        }

        assert!(!tree.can_transform("odom", "fcu", LookupTime::At(2 * SEC)));
        assert!(tree.can_transform("odom", "fcu", LookupTime::At(3 * SEC)));
    }

    #[test]
    fn test_remove_frame() {
        let mut tree = TFTree::new();
        tree.set_static_transform("world", "robot", Transform::identity())
            .unwrap();
        tree.set_static_transform("robot", "sensor", Transform::identity())
            .unwrap();

        tree.remove_frame("robot").unwrap();
        assert_eq!(tree.frame_count(), 1);
        assert!(tree.get_frame("world").unwrap().children.is_empty());

        tree.clear();
        assert_eq!(tree.frame_count(), 0);
    }
}
