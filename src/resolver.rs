//! Alias resolution: flatten every alias assignment to a canonical user.
//!
//! The resolver consumes the alias stream in order and maintains the
//! invariant that every stored mapping already points at a canonical user,
//! so lookups are O(1) with no chain walking. Records whose source is not
//! yet known are deferred and replayed once after the stream ends; the
//! replay walks the remaining dependency edges to a canonical root, so
//! chains of any depth resolve regardless of arrival order. A cycle among
//! deferred records is an error rather than an infinite walk.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::debug;

use crate::observer::ResolutionObserver;
use crate::AliasAssignment;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("canonical user set is empty")]
    EmptyCanonicalSet,

    #[error("alias chain through {alias_id:?} forms a cycle")]
    AliasCycle { alias_id: String },
}

/// A fully resolved mapping from alias to canonical user.
///
/// Every value is a member of the canonical set the resolver was built
/// with; no value is itself an alias. Immutable once constructed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    entries: HashMap<String, String>,
}

impl AliasMap {
    /// The canonical identity for `id`: the resolved target when `id` is a
    /// known alias, otherwise `id` itself.
    pub fn canonicalize<'a>(&'a self, id: &'a str) -> &'a str {
        self.entries.get(id).map(String::as_str).unwrap_or(id)
    }

    /// The resolved target for `alias_id`, if the stream declared one.
    pub fn get(&self, alias_id: &str) -> Option<&str> {
        self.entries.get(alias_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(alias, canonical)| (alias.as_str(), canonical.as_str()))
    }
}

/// Incremental alias resolver.
///
/// Feed the alias stream in order with [`observe`](Self::observe), then call
/// [`finish`](Self::finish) to replay deferred records and obtain the map.
#[derive(Debug, Clone)]
pub struct AliasResolver {
    canonical: HashSet<String>,
    entries: HashMap<String, String>,
    deferred: Vec<AliasAssignment>,
}

impl AliasResolver {
    pub fn new(canonical: HashSet<String>) -> Result<Self, ResolveError> {
        if canonical.is_empty() {
            return Err(ResolveError::EmptyCanonicalSet);
        }
        Ok(Self {
            canonical,
            entries: HashMap::new(),
            deferred: Vec::new(),
        })
    }

    /// First-pass step for one record, in stream order.
    ///
    /// Stores the already-canonical target when the source is known; defers
    /// the record otherwise. Later assignments to the same alias overwrite
    /// earlier ones.
    pub fn observe(&mut self, record: AliasAssignment) {
        if self.canonical.contains(&record.user_id) {
            self.entries.insert(record.alias_user_id, record.user_id);
        } else if let Some(canonical) = self.entries.get(&record.user_id).cloned() {
            self.entries.insert(record.alias_user_id, canonical);
        } else {
            debug!(
                alias_id = %record.alias_user_id,
                source_id = %record.user_id,
                "source not yet known, deferring"
            );
            self.deferred.push(record);
        }
    }

    /// Replay the deferred queue once and return the finished map.
    ///
    /// Each deferred source is walked through the deferred dependency edges
    /// until it reaches a canonical user or an already-resolved alias.
    /// Records whose chain never bottoms out are dropped from the map and
    /// reported to `observer`; a cycle is [`ResolveError::AliasCycle`].
    pub fn finish(mut self, observer: &dyn ResolutionObserver) -> Result<AliasMap, ResolveError> {
        // Dependency edges among deferred records. Duplicate assignments to
        // the same alias keep the last edge, matching pass-order overwrite.
        let mut edges: HashMap<&str, &str> = HashMap::with_capacity(self.deferred.len());
        for record in &self.deferred {
            edges.insert(record.alias_user_id.as_str(), record.user_id.as_str());
        }

        let mut resolved = Vec::new();
        for record in &self.deferred {
            match self.find_canonical(&record.user_id, &edges)? {
                Some(canonical) => resolved.push((record.alias_user_id.clone(), canonical)),
                None => observer.alias_dropped(record),
            }
        }
        for (alias, canonical) in resolved {
            self.entries.insert(alias, canonical);
        }

        Ok(AliasMap {
            entries: self.entries,
        })
    }

    /// Resolve a whole stream in one call: [`new`](Self::new), then
    /// [`observe`](Self::observe) per record, then [`finish`](Self::finish).
    pub fn resolve<I>(
        canonical: HashSet<String>,
        records: I,
        observer: &dyn ResolutionObserver,
    ) -> Result<AliasMap, ResolveError>
    where
        I: IntoIterator<Item = AliasAssignment>,
    {
        let mut resolver = Self::new(canonical)?;
        for record in records {
            resolver.observe(record);
        }
        resolver.finish(observer)
    }

    /// Walk `start` through the deferred edges to a canonical user, if any.
    fn find_canonical(
        &self,
        start: &str,
        edges: &HashMap<&str, &str>,
    ) -> Result<Option<String>, ResolveError> {
        let mut current = start;
        let mut visited: HashSet<&str> = HashSet::new();
        loop {
            if self.canonical.contains(current) {
                return Ok(Some(current.to_string()));
            }
            if let Some(canonical) = self.entries.get(current) {
                return Ok(Some(canonical.clone()));
            }
            if !visited.insert(current) {
                return Err(ResolveError::AliasCycle {
                    alias_id: current.to_string(),
                });
            }
            match edges.get(current) {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
    }
}
