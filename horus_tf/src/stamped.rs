//! Transform handed out by the transformer

use crate::transform::Transform;

/// A resolved transform between two fully-qualified frames
///
/// Transforms touching the geodetic pseudo-frame carry no payload: they only
/// name the endpoints, and applying them goes through the nonlinear
/// conversion instead of linear composition.
#[derive(Debug, Clone, PartialEq)]
pub struct StampedTransform {
    from: String,
    to: String,
    requested_stamp: u64,
    resolved_stamp: u64,
    store_stamp: Option<u64>,
    transform: Option<Transform>,
}

impl StampedTransform {
    /// Endpoint-only transform involving the geodetic pseudo-frame
    pub fn geodetic(from: impl Into<String>, to: impl Into<String>, stamp: u64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            requested_stamp: stamp,
            resolved_stamp: stamp,
            store_stamp: None,
            transform: None,
        }
    }

    /// Linear transform retrieved from the store at `resolved_stamp`
    pub fn linear(
        from: impl Into<String>,
        to: impl Into<String>,
        requested_stamp: u64,
        resolved_stamp: u64,
        store_stamp: Option<u64>,
        transform: Transform,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            requested_stamp,
            resolved_stamp,
            store_stamp,
            transform: Some(transform),
        }
    }

    /// Source frame (resolved)
    pub fn from(&self) -> &str {
        &self.from
    }

    /// Target frame (resolved)
    pub fn to(&self) -> &str {
        &self.to
    }

    /// Time the caller asked for
    pub fn requested_stamp(&self) -> u64 {
        self.requested_stamp
    }

    /// Wall-clock time at which the transform was retrieved
    pub fn resolved_stamp(&self) -> u64 {
        self.resolved_stamp
    }

    /// Time the store evaluated the transform at (`None` for static chains)
    pub fn store_stamp(&self) -> Option<u64> {
        self.store_stamp
    }

    /// Rigid transform mapping `from` into `to`; `None` for geodetic transforms
    pub fn transform(&self) -> Option<&Transform> {
        self.transform.as_ref()
    }

    pub fn is_geodetic(&self) -> bool {
        self.transform.is_none()
    }
}
