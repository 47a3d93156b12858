//! Count activity rows per `(feature_key, feature_value)` pair.

use std::collections::BTreeMap;

use tracing::trace;

use crate::resolver::AliasMap;
use crate::ActivityEvent;

/// Per-pair row counts, ordered lexicographically by key then value.
///
/// These are row counts over all events, not distinct-user counts; two
/// events by the same canonical user both contribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureSummary {
    counts: BTreeMap<(String, String), u64>,
}

impl FeatureSummary {
    pub fn record(&mut self, feature_key: String, feature_value: String) {
        *self.counts.entry((feature_key, feature_value)).or_insert(0) += 1;
    }

    pub fn get(&self, feature_key: &str, feature_value: &str) -> u64 {
        self.counts
            .get(&(feature_key.to_string(), feature_value.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Rows in `(feature_key, feature_value, count)` form, in stable
    /// lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, u64)> {
        self.counts
            .iter()
            .map(|((key, value), count)| (key.as_str(), value.as_str(), *count))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Summarize an in-memory event stream.
///
/// Each event's actor is substituted with its canonical identity; actors
/// with no alias entry pass through unchanged and still count.
pub fn summarize<I>(events: I, aliases: &AliasMap) -> FeatureSummary
where
    I: IntoIterator<Item = ActivityEvent>,
{
    let mut summary = FeatureSummary::default();
    for event in events {
        count_event(&mut summary, event, aliases);
    }
    summary
}

/// Summarize a fallible event stream, stopping at the first error.
pub fn try_summarize<I, E>(events: I, aliases: &AliasMap) -> Result<FeatureSummary, E>
where
    I: IntoIterator<Item = Result<ActivityEvent, E>>,
{
    let mut summary = FeatureSummary::default();
    for event in events {
        count_event(&mut summary, event?, aliases);
    }
    Ok(summary)
}

fn count_event(summary: &mut FeatureSummary, event: ActivityEvent, aliases: &AliasMap) {
    let actor = aliases.canonicalize(&event.user_id);
    trace!(
        actor,
        feature_key = %event.feature_key,
        feature_value = %event.feature_value,
        "counting activity row"
    );
    summary.record(event.feature_key, event.feature_value);
}
