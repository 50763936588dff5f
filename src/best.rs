use tracing::warn;

use crate::store::KeyValueStore;

/// Namespaced key the best reaction time is stored under
pub const BEST_KEY: &str = "reflex.best_ms.v1";

/// Durable best (minimum) reaction time.
///
/// This is the only place storage errors are seen; every failure is logged
/// and turned into "not set" or a dropped write, so callers never deal with
/// I/O error types.
#[derive(Debug)]
pub struct BestStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> BestStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Current best in ms, or `None` when unset, unreadable or corrupted
    pub fn read(&self) -> Option<f64> {
        let raw = match self.store.get(BEST_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(error = %err, "failed to read best time, treating as unset");
                return None;
            }
        };

        match raw.trim().parse::<f64>() {
            Ok(ms) if ms.is_finite() && ms > 0.0 => Some(ms),
            _ => {
                warn!(value = %raw, "ignoring malformed best time");
                None
            }
        }
    }

    /// Persist `ms` if it is finite and positive. Storage failures are logged
    /// and dropped; returns whether the value reached the backend.
    pub fn write(&mut self, ms: f64) -> bool {
        if !ms.is_finite() || ms <= 0.0 {
            return false;
        }
        match self.store.set(BEST_KEY, &ms.to_string()) {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, best_ms = ms, "failed to persist best time");
                false
            }
        }
    }

    pub fn clear(&mut self) {
        if let Err(err) = self.store.remove(BEST_KEY) {
            warn!(error = %err, "failed to clear best time");
        }
    }

    /// Write `ms` when it beats the stored best (or nothing is stored).
    /// Returns whether a new best was stored.
    pub fn offer(&mut self, ms: f64) -> bool {
        if !ms.is_finite() || ms <= 0.0 {
            return false;
        }
        match self.read() {
            Some(best) if ms >= best => false,
            _ => self.write(ms),
        }
    }
}
