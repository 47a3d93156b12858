//! Run configuration: the four file paths a run operates on.

use std::path::PathBuf;

/// Input and output locations for one pipeline run.
///
/// Paths are explicit per run; nothing is read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Canonical users, CSV with at least a `user_id` column.
    pub users: PathBuf,
    /// Alias assignments, CSV with the exact header
    /// `timestamp,user_id,alias_user_id`.
    pub aliases: PathBuf,
    /// Activity events, CSV with at least `user_id`, `feature_key` and
    /// `feature_value` columns.
    pub events: PathBuf,
    /// Where the summary CSV is written.
    pub summary: PathBuf,
}

impl RunConfig {
    pub fn new(
        users: impl Into<PathBuf>,
        aliases: impl Into<PathBuf>,
        events: impl Into<PathBuf>,
        summary: impl Into<PathBuf>,
    ) -> Self {
        Self {
            users: users.into(),
            aliases: aliases.into(),
            events: events.into(),
            summary: summary.into(),
        }
    }
}
