// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity processing service.
//!
//! Handles the core workflow for each activity:
//! 1. Eligibility: outdoor walks with a start time only
//! 2. Compute the themed name for the start time
//! 3. Skip if the name already matches exactly
//! 4. Rename on Strava (live mode)

use crate::error::Result;
use crate::models::{RunStats, StravaActivity};
use crate::services::naming::{is_already_themed, name_for};
use crate::services::StravaClient;

/// Whether renames are written to Strava.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    DryRun,
    Live,
}

/// Why an activity is not considered for renaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotWalk,
    Indoor,
    MissingStartDate,
}

/// What should happen to an activity, before any write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Skip(SkipReason),
    AlreadyCorrect { name: String },
    Rename { old_name: String, new_name: String },
}

/// What did happen to an activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Skipped(SkipReason),
    AlreadyCorrect,
    /// Dry run: the rename was computed but not written
    WouldRename { new_name: String },
    Renamed { new_name: String },
}

/// Decide what to do with an activity. Pure; no I/O.
///
/// Filters run in a fixed order and stop at the first failure: category,
/// then indoor flag, then presence of the start time.
pub fn decide(activity: &StravaActivity) -> Result<Decision> {
    if !activity.is_walk() {
        return Ok(Decision::Skip(SkipReason::NotWalk));
    }
    if activity.is_indoor() {
        return Ok(Decision::Skip(SkipReason::Indoor));
    }
    let Some(start_date_local) = activity.start_date_local.as_deref() else {
        return Ok(Decision::Skip(SkipReason::MissingStartDate));
    };

    let new_name = name_for(start_date_local)?;
    let current = activity.name.as_deref().unwrap_or_default();

    if current == new_name {
        Ok(Decision::AlreadyCorrect {
            name: current.to_string(),
        })
    } else {
        Ok(Decision::Rename {
            old_name: activity.display_name().to_string(),
            new_name: new_name.to_string(),
        })
    }
}

/// Applies naming decisions to activities.
pub struct ActivityProcessor {
    strava: StravaClient,
    mode: RunMode,
}

impl ActivityProcessor {
    pub fn new(strava: StravaClient, mode: RunMode) -> Self {
        Self { strava, mode }
    }

    /// Process a single activity (webhook path).
    ///
    /// A failed rename is returned as an error.
    pub async fn process_one(
        &self,
        access_token: &str,
        activity: &StravaActivity,
    ) -> Result<Outcome> {
        match decide(activity)? {
            Decision::Skip(reason) => {
                log_skip(activity, reason);
                Ok(Outcome::Skipped(reason))
            }
            Decision::AlreadyCorrect { name } => {
                tracing::info!(activity_id = activity.id, name = %name, "Already correctly named");
                Ok(Outcome::AlreadyCorrect)
            }
            Decision::Rename { old_name, new_name } => {
                self.rename(access_token, activity.id, &old_name, new_name)
                    .await
            }
        }
    }

    /// Process a batch in order (backfill path).
    ///
    /// Per-item failures are counted and never stop the batch.
    pub async fn process(&self, access_token: &str, activities: &[StravaActivity]) -> RunStats {
        let mut stats = RunStats::new(activities.len());
        let total = activities.len();

        for (index, activity) in activities.iter().enumerate() {
            let position = index + 1;
            let decision = decide(activity);

            if !matches!(decision, Ok(Decision::Skip(SkipReason::NotWalk))) {
                stats.walks_found += 1;
            }

            match decision {
                Ok(Decision::Skip(reason)) => log_skip(activity, reason),
                Ok(Decision::AlreadyCorrect { name }) => {
                    tracing::info!(position, total, name = %name, "Already correct");
                    stats.already_named += 1;
                }
                Ok(Decision::Rename { old_name, new_name }) => {
                    stats.to_rename += 1;
                    if is_already_themed(&old_name) {
                        stats.previously_themed += 1;
                    }

                    tracing::info!(
                        position,
                        total,
                        activity_id = activity.id,
                        start = activity.start_date_local.as_deref().unwrap_or_default(),
                        old = %old_name,
                        new = %new_name,
                        "Rename candidate"
                    );

                    match self
                        .rename(access_token, activity.id, &old_name, new_name)
                        .await
                    {
                        Ok(Outcome::Renamed { .. }) => stats.renamed += 1,
                        Ok(_) => {}
                        Err(e) => {
                            tracing::error!(
                                activity_id = activity.id,
                                error = %e,
                                "Failed to rename activity"
                            );
                            stats.errors += 1;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        activity_id = activity.id,
                        error = %e,
                        "Could not compute name for activity"
                    );
                    stats.errors += 1;
                }
            }
        }

        stats
    }

    async fn rename(
        &self,
        access_token: &str,
        activity_id: u64,
        old_name: &str,
        new_name: String,
    ) -> Result<Outcome> {
        if self.mode == RunMode::DryRun {
            tracing::info!(activity_id, old = %old_name, new = %new_name, "[DRY RUN] Would rename");
            return Ok(Outcome::WouldRename { new_name });
        }

        self.strava
            .update_activity_name(access_token, activity_id, &new_name)
            .await?;
        tracing::info!(activity_id, old = %old_name, new = %new_name, "Renamed activity");
        Ok(Outcome::Renamed { new_name })
    }
}

fn log_skip(activity: &StravaActivity, reason: SkipReason) {
    match reason {
        SkipReason::NotWalk => tracing::debug!(
            activity_id = activity.id,
            activity_type = %activity.activity_type,
            "Skipping: not a Walk"
        ),
        SkipReason::Indoor => tracing::debug!(
            activity_id = activity.id,
            "Skipping: indoor (trainer) walk"
        ),
        SkipReason::MissingStartDate => tracing::warn!(
            activity_id = activity.id,
            "Skipping: activity missing start_date_local"
        ),
    }
}
