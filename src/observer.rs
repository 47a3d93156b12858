//! Injectable observer for resolution events.
//!
//! The resolver drops records whose alias chain never reaches a canonical
//! user. The observer makes those drops visible without tying the resolver
//! to a logging backend.

use tracing::warn;

use crate::AliasAssignment;

pub trait ResolutionObserver {
    /// Called once per deferred record that was still unresolved after the
    /// replay pass and therefore left out of the map.
    fn alias_dropped(&self, _record: &AliasAssignment) {}
}

/// Ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl ResolutionObserver for NullObserver {}

/// Logs a warning per dropped record through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ResolutionObserver for TracingObserver {
    fn alias_dropped(&self, record: &AliasAssignment) {
        warn!(
            alias_id = %record.alias_user_id,
            source_id = %record.user_id,
            "alias never resolved to a canonical user, dropped"
        );
    }
}
