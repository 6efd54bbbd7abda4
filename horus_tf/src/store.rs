//! Transform store interface
//!
//! The transformer only needs a synchronous point lookup. Whatever fills the
//! store (a listener thread, a simulator, a replay tool) lives elsewhere and
//! writes through its own handle.

use crate::messages::TransformStamped;
use crate::transform::Transform;
use crate::tree::{TFResult, TFTree};
use parking_lot::RwLock;
use std::sync::Arc;

/// When to evaluate a transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupTime {
    /// At the given time (nanoseconds since the UNIX epoch)
    At(u64),
    /// At the newest time available for the whole chain
    Latest,
}

impl LookupTime {
    /// The requested time, if any
    pub fn timestamp(&self) -> Option<u64> {
        match self {
            LookupTime::At(t) => Some(*t),
            LookupTime::Latest => None,
        }
    }
}

/// Result of a store lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreTransform {
    /// Maps points from the source frame into the target frame
    pub transform: Transform,
    /// Time the transform was evaluated at; `None` for purely static chains
    /// looked up at the latest time
    pub stamp: Option<u64>,
}

/// A time-indexed table of rigid transforms between named frames
pub trait TransformStore: Send + Sync {
    /// Transform mapping points expressed in `source` into `target`
    fn lookup(&self, target: &str, source: &str, time: LookupTime) -> TFResult<StoreTransform>;
}

/// Thread-safe handle to a [`TFTree`]
///
/// Producers and the transformer share clones of the same handle.
pub type SharedTFTree = Arc<RwLock<TFTree>>;

/// Create a new shared TF tree
pub fn create_shared_tree() -> SharedTFTree {
    Arc::new(RwLock::new(TFTree::new()))
}

impl TransformStore for RwLock<TFTree> {
    fn lookup(&self, target: &str, source: &str, time: LookupTime) -> TFResult<StoreTransform> {
        self.read().lookup_transform(target, source, time)
    }
}

impl<S: TransformStore + ?Sized> TransformStore for Arc<S> {
    fn lookup(&self, target: &str, source: &str, time: LookupTime) -> TFResult<StoreTransform> {
        (**self).lookup(target, source, time)
    }
}

/// Insert a batch of transform messages into a shared tree
///
/// Stops at the first rejected message.
pub fn publish_transforms(
    tree: &SharedTFTree,
    transforms: &[TransformStamped],
    is_static: bool,
) -> TFResult<()> {
    let mut tree = tree.write();
    for msg in transforms {
        tree.apply(msg, is_static)?;
    }
    Ok(())
}
