//! Per-run counters for the backfill pass.
//!
//! Zeroed at run start, accumulated while processing, reported at run end.

use serde::Serialize;

/// Outcome counters for one backfill run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Activities returned by Strava for the requested range
    pub total_fetched: u32,
    /// Activities of category "Walk", indoor ones included
    pub walks_found: u32,
    /// Outdoor walks already carrying the computed name
    pub already_named: u32,
    /// Outdoor walks whose name differs from the computed one
    pub to_rename: u32,
    /// Of `to_rename`, those whose current name already had a dog theme
    pub previously_themed: u32,
    /// Rename writes that succeeded (always 0 in dry-run)
    pub renamed: u32,
    /// Rename writes or name computations that failed
    pub errors: u32,
}

impl RunStats {
    /// Start a run over `total_fetched` activities.
    pub fn new(total_fetched: usize) -> Self {
        Self {
            total_fetched: u32::try_from(total_fetched).unwrap_or(u32::MAX),
            ..Self::default()
        }
    }

    /// Emit the end-of-run summary.
    pub fn log_summary(&self, dry_run: bool) {
        tracing::info!(
            total_fetched = self.total_fetched,
            walks_found = self.walks_found,
            already_named = self.already_named,
            to_rename = self.to_rename,
            previously_themed = self.previously_themed,
            "Backfill summary"
        );

        if dry_run {
            tracing::info!("Dry run: no changes were made, run without --dry-run to rename");
        } else if self.errors > 0 {
            tracing::warn!(
                renamed = self.renamed,
                errors = self.errors,
                "Backfill finished with errors"
            );
        } else {
            tracing::info!(renamed = self.renamed, "Backfill finished");
        }
    }
}
