//! Resolution of a pose request into store lookups and geodetic conversions

use super::{LookupError, TransformError, Transformer, REPORT_PERIOD_SECS};
use crate::frames::FrameNameResolver;
use crate::geodetic;
use crate::messages::{Pose, PoseStamped};
use crate::stamped::StampedTransform;
use crate::store::{LookupTime, TransformStore};
use crate::timestamp_now;
use horus_core::warn_throttled;
use std::time::Duration;

impl Transformer {
    /// Express `pose` (in resolved frame `from`) in resolved frame `to`
    ///
    /// Cases, in order: identity, geodetic source, geodetic target, plain.
    pub(super) fn compose(
        &self,
        store: &dyn TransformStore,
        from: &str,
        to: &str,
        stamp: u64,
        pose: &Pose,
    ) -> Result<PoseStamped, TransformError> {
        if from == to {
            return Ok(PoseStamped::new(to, stamp, *pose));
        }

        let latlon = self.latlon_frame();

        if from == latlon {
            let planar = self.project_to_utm(pose);
            let utm_frame = FrameNameResolver::utm_origin_for(from);
            if utm_frame == to {
                return Ok(PoseStamped::new(to, stamp, planar));
            }
            let tf = self.lookup_linear(store, &utm_frame, to, stamp)?;
            return Ok(PoseStamped::new(to, stamp, apply(&tf, &planar)));
        }

        if to == latlon {
            let zone = self.utm_zone.get().ok_or(TransformError::MissingUtmZone)?;
            let utm_frame = FrameNameResolver::utm_origin_for(to);
            let planar = if from == utm_frame {
                *pose
            } else {
                let tf = self.lookup_linear(store, from, &utm_frame, stamp)?;
                apply(&tf, pose)
            };

            // The linearly transformed coordinates feed the inverse projection
            let (lat, lon) = geodetic::utm_to_ll(planar.position[0], planar.position[1], &zone);
            let geodetic_pose = Pose::new([lat, lon, planar.position[2]], planar.orientation);
            return Ok(PoseStamped::new(to, stamp, geodetic_pose));
        }

        let tf = self.lookup_linear(store, from, to, stamp)?;
        Ok(PoseStamped::new(to, stamp, apply(&tf, pose)))
    }

    /// Rigid transform from `from` to `to`, exact time first, latest available second
    pub(super) fn lookup_linear(
        &self,
        store: &dyn TransformStore,
        from: &str,
        to: &str,
        stamp: u64,
    ) -> Result<StampedTransform, TransformError> {
        let node = &self.config.node_name;

        let exact_error = match store.lookup(to, from, LookupTime::At(stamp)) {
            Ok(found) => {
                return Ok(StampedTransform::linear(
                    from,
                    to,
                    stamp,
                    timestamp_now(),
                    found.stamp,
                    found.transform,
                ));
            }
            Err(e) => e,
        };
        log::debug!(
            "[{}]: Transformer: exact lookup '{}' -> '{}' at {} failed: {}",
            node,
            from,
            to,
            stamp,
            exact_error
        );

        let found = store
            .lookup(to, from, LookupTime::Latest)
            .map_err(|e| TransformError::LookupFailure {
                from: from.to_string(),
                to: to.to_string(),
                cause: LookupError::Store(e),
            })?;

        let now = timestamp_now();
        if let (Some(timeout), Some(found_stamp)) = (self.config.cache_timeout, found.stamp) {
            let age = Duration::from_nanos(now.saturating_sub(found_stamp));
            if age > timeout {
                return Err(TransformError::LookupFailure {
                    from: from.to_string(),
                    to: to.to_string(),
                    cause: LookupError::Stale { age, timeout },
                });
            }
        }

        warn_throttled!(
            REPORT_PERIOD_SECS,
            "[{}]: Transformer: no transform '{}' -> '{}' at {} ({}), using the latest available",
            node,
            from,
            to,
            stamp,
            exact_error
        );

        Ok(StampedTransform::linear(
            from,
            to,
            stamp,
            now,
            found.stamp,
            found.transform,
        ))
    }

    /// Project (lat, lon, alt) onto the UTM plane, keeping altitude and orientation
    ///
    /// Uses the anchor zone when one is set so that all projections share a
    /// single plane, otherwise the zone containing the point.
    fn project_to_utm(&self, pose: &Pose) -> Pose {
        let [lat, lon, alt] = pose.position;
        let (easting, northing) = match self.utm_zone.get() {
            Some(zone) => geodetic::ll_to_utm_in_zone(lat, lon, &zone),
            None => {
                let utm = geodetic::ll_to_utm(lat, lon);
                (utm.easting, utm.northing)
            }
        };
        Pose::new([easting, northing, alt], pose.orientation)
    }
}

fn apply(tf: &StampedTransform, pose: &Pose) -> Pose {
    match tf.transform() {
        Some(transform) => pose.transformed(transform),
        None => *pose,
    }
}
