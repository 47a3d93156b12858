//! Resolve user identity aliases and summarize activity events.
//!
//! Three tabular inputs (canonical users, alias assignments, activity events)
//! feed a two-stage batch pipeline: the [`resolver`] flattens every alias to
//! the canonical user it ultimately refers to, and the [`aggregator`] counts
//! activity rows per `(feature_key, feature_value)` pair after substituting
//! each actor with its canonical identity.

use serde::{Deserialize, Serialize};

pub mod aggregator;
pub mod config;
pub mod io;
pub mod observer;
pub mod pipeline;
pub mod resolver;

pub use aggregator::{summarize, FeatureSummary};
pub use config::RunConfig;
pub use observer::{NullObserver, ResolutionObserver, TracingObserver};
pub use pipeline::{run, PipelineError};
pub use resolver::{AliasMap, AliasResolver, ResolveError};

/// One row of the alias-assignment stream: `alias_user_id` is an alias of
/// `user_id` from `timestamp` onward.
///
/// `user_id` may name a canonical user or a previously declared alias.
/// `timestamp` is carried verbatim from the input and never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasAssignment {
    pub timestamp: String,
    pub user_id: String,
    pub alias_user_id: String,
}

impl AliasAssignment {
    pub fn new(
        timestamp: impl Into<String>,
        user_id: impl Into<String>,
        alias_user_id: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            user_id: user_id.into(),
            alias_user_id: alias_user_id.into(),
        }
    }
}

/// One row of the activity stream. `user_id` may be canonical or an alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub user_id: String,
    pub feature_key: String,
    pub feature_value: String,
}

impl ActivityEvent {
    pub fn new(
        user_id: impl Into<String>,
        feature_key: impl Into<String>,
        feature_value: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            feature_key: feature_key.into(),
            feature_value: feature_value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::alias_row(
        "timestamp,user_id,alias_user_id\n2024-01-15T10:30:00Z,u1,a1\n",
        AliasAssignment::new("2024-01-15T10:30:00Z", "u1", "a1")
    )]
    #[case::opaque_timestamp(
        "timestamp,user_id,alias_user_id\nnot-a-date,u2,a2\n",
        AliasAssignment::new("not-a-date", "u2", "a2")
    )]
    fn deserialize_alias_assignment(#[case] csv_text: &str, #[case] expected: AliasAssignment) {
        let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
        let actual: AliasAssignment = reader.deserialize().next().unwrap().unwrap();
        assert_eq!(expected, actual);
    }

    #[test]
    fn deserialize_activity_event_ignores_extra_columns() {
        let text = "user_id,feature_key,feature_value,session\nu1,search,enabled,s9\n";
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let actual: ActivityEvent = reader.deserialize().next().unwrap().unwrap();
        assert_eq!(ActivityEvent::new("u1", "search", "enabled"), actual);
    }
}
