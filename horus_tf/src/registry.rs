//! Small pieces of shared state read during transform resolution
//!
//! Each registry has its own lock so that updating one never blocks readers
//! of another.

use crate::geodetic::UtmZone;
use parking_lot::RwLock;

/// A value that starts absent and is set (overwritten) by explicit calls
#[derive(Debug)]
pub struct Registry<T> {
    value: RwLock<Option<T>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            value: RwLock::new(None),
        }
    }
}

impl<T: Clone> Registry<T> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the value and mark it present
    pub fn set(&self, value: T) {
        *self.value.write() = Some(value);
    }

    /// Current value, `None` until the first [`set`](Self::set)
    pub fn get(&self) -> Option<T> {
        self.value.read().clone()
    }

    pub fn is_set(&self) -> bool {
        self.value.read().is_some()
    }

    /// Independent copy taken under this registry's lock
    pub fn snapshot(&self) -> Self {
        Self {
            value: RwLock::new(self.get()),
        }
    }
}

/// Default frame substituted for empty frame names
pub type ControlFrameRegistry = Registry<String>;

/// Zone used to turn planar coordinates back into latitude/longitude
pub type UtmZoneRegistry = Registry<UtmZone>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_absent() {
        let registry = ControlFrameRegistry::new();
        assert!(!registry.is_set());
        assert_eq!(registry.get(), None);
    }

    #[test]
    fn test_set_overwrites() {
        let registry = ControlFrameRegistry::new();
        registry.set("uav1/fcu".to_string());
        registry.set("uav1/local_origin".to_string());
        assert_eq!(registry.get().as_deref(), Some("uav1/local_origin"));
    }

    #[test]
    fn test_snapshot_is_independent() {
        let registry = UtmZoneRegistry::new();
        registry.set(UtmZone::from_lat_lon(50.0, 14.4));

        let copy = registry.snapshot();
        registry.set(UtmZone::from_lat_lon(-33.9, 151.2));

        assert_eq!(copy.get().map(|z| z.number), Some(33));
        assert_eq!(registry.get().map(|z| z.number), Some(56));
    }
}
