//! Rate-limited logging
//!
//! [`LogThrottle`] remembers when each call site last emitted and answers
//! whether it may emit again. It knows nothing about the logging backend;
//! the `*_throttled!` macros pair it with the `log` facade.
//!
//! ```rust,ignore
//! use horus_core::warn_throttled;
//!
//! // At most one line per second from this call site
//! warn_throttled!(1.0, "[{}]: missing the current control frame", node_name);
//! ```

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Process-wide throttle used by the logging macros
pub static GLOBAL_LOG_THROTTLE: Lazy<LogThrottle> = Lazy::new(LogThrottle::new);

/// Last-emitted-timestamp rate limiter keyed by call site
#[derive(Debug, Default)]
pub struct LogThrottle {
    last_emitted: Mutex<HashMap<&'static str, Instant>>,
}

impl LogThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `site` may emit now, and records the emission
    pub fn should_emit(&self, site: &'static str, period: Duration) -> bool {
        self.should_emit_at(site, period, Instant::now())
    }

    /// Same as [`should_emit`](Self::should_emit) with an explicit clock
    pub fn should_emit_at(&self, site: &'static str, period: Duration, now: Instant) -> bool {
        let mut last_emitted = self.last_emitted.lock();
        match last_emitted.get(site) {
            Some(last) if now.saturating_duration_since(*last) < period => false,
            _ => {
                last_emitted.insert(site, now);
                true
            }
        }
    }

    /// Forget all call sites
    pub fn reset(&self) {
        self.last_emitted.lock().clear();
    }
}

/// Log through `log` at the given level, at most once per `period_secs` per call site
#[macro_export]
macro_rules! log_throttled {
    ($lvl:expr, $period_secs:expr, $($arg:tt)+) => {
        if $crate::log_throttle::GLOBAL_LOG_THROTTLE.should_emit(
            concat!(module_path!(), ":", file!(), ":", line!()),
            ::std::time::Duration::from_secs_f64($period_secs),
        ) {
            $crate::log::log!($lvl, $($arg)+);
        }
    };
}

/// Throttled `log::warn!`
#[macro_export]
macro_rules! warn_throttled {
    ($period_secs:expr, $($arg:tt)+) => {
        $crate::log_throttled!($crate::log::Level::Warn, $period_secs, $($arg)+)
    };
}

/// Throttled `log::error!`
#[macro_export]
macro_rules! error_throttled {
    ($period_secs:expr, $($arg:tt)+) => {
        $crate::log_throttled!($crate::log::Level::Error, $period_secs, $($arg)+)
    };
}
