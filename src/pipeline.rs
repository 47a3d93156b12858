//! Sequential composition of the batch run: read users, resolve aliases,
//! summarize events, write the summary.
//!
//! One-shot and synchronous. Every stage failure aborts the run; there are
//! no retries and no partial results.

use thiserror::Error;
use tracing::info;

use crate::aggregator::{try_summarize, FeatureSummary};
use crate::config::RunConfig;
use crate::io::{
    read_user_ids, ActivityEventReader, AliasStreamReader, ReadError, SummaryWriter, WriteError,
};
use crate::observer::ResolutionObserver;
use crate::resolver::{AliasResolver, ResolveError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read canonical users: {0}")]
    Users(#[source] ReadError),

    #[error("failed to read alias stream: {0}")]
    Aliases(#[source] ReadError),

    #[error("alias resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    #[error("failed to read activity events: {0}")]
    Events(#[source] ReadError),

    #[error("failed to write summary: {0}")]
    Summary(#[from] WriteError),
}

/// Run the whole pipeline and return the summary that was written.
pub fn run(
    config: &RunConfig,
    observer: &dyn ResolutionObserver,
) -> Result<FeatureSummary, PipelineError> {
    info!(path = %config.users.display(), "reading canonical users");
    let canonical = read_user_ids(&config.users).map_err(PipelineError::Users)?;

    info!(
        users = canonical.len(),
        path = %config.aliases.display(),
        "resolving alias stream"
    );
    let mut resolver = AliasResolver::new(canonical)?;
    let alias_stream = AliasStreamReader::open(&config.aliases).map_err(PipelineError::Aliases)?;
    for record in alias_stream {
        resolver.observe(record.map_err(PipelineError::Aliases)?);
    }
    let aliases = resolver.finish(observer)?;

    info!(
        aliases = aliases.len(),
        path = %config.events.display(),
        "summarizing activity events"
    );
    let events = ActivityEventReader::open(&config.events).map_err(PipelineError::Events)?;
    let summary = try_summarize(events, &aliases).map_err(PipelineError::Events)?;

    info!(
        rows = summary.len(),
        path = %config.summary.display(),
        "writing event summary"
    );
    SummaryWriter::create(&config.summary)?.write(&summary)?;

    Ok(summary)
}
