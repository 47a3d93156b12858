//! End-to-end run of the alias-resolution pipeline over generated inputs.
//!
//! Run with: cargo run --example summarize

use std::fs;

use event_summary::{run, RunConfig, TracingObserver};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let dir = tempfile::tempdir()?;
    let config = RunConfig::new(
        dir.path().join("users.csv"),
        dir.path().join("alias.csv"),
        dir.path().join("events.csv"),
        dir.path().join("event_summary.csv"),
    );

    fs::write(&config.users, "user_id\nu1\nu2\n")?;
    fs::write(
        &config.aliases,
        // a2 arrives before its source a1 is known; ghost never resolves.
        "timestamp,user_id,alias_user_id\n\
         2024-01-15T10:00:00Z,a1,a2\n\
         2024-01-15T10:01:00Z,u1,a1\n\
         2024-01-15T10:02:00Z,ghost,g1\n",
    )?;
    fs::write(
        &config.events,
        "user_id,feature_key,feature_value\n\
         a2,search,enabled\n\
         a1,search,enabled\n\
         u1,export,csv\n\
         u2,search,enabled\n\
         stranger,export,csv\n",
    )?;

    let summary = run(&config, &TracingObserver)?;

    println!("summary rows:");
    for (key, value, count) in summary.iter() {
        println!("  {key},{value},{count}");
    }
    Ok(())
}
