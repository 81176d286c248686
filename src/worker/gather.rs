//! Input gathering for one generation job.
//!
//! Everything the solver needs is re-read from storage when the job runs.
//! The reads are not transactional, so the gatherer fingerprints the id
//! sets, re-reads, and retries when anything shifted between the two
//! passes. Without this, an activity could reference a room deleted
//! mid-gather.

use std::collections::BTreeSet;
use std::time::Duration;

use tracing::{info, warn};

use crate::data::models::{Activity, Group, Institution, Room};
use crate::data::{DbContext, activities, groups, institutions, rooms};
use crate::solver::SolveInput;

const SNAPSHOT_ATTEMPTS: u32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum GatherError {
    #[error("institution {0} not found")]
    NotFound(String),
    #[error("no activities for institution {0}")]
    NoActivities(String),
    #[error("storage read failed: {0}")]
    Storage(#[from] mongodb::error::Error),
    #[error("inputs kept changing during snapshot reads")]
    UnstableSnapshot,
}

impl GatherError {
    /// Short classifier recorded on the failed schedule.
    pub fn failure_code(&self) -> String {
        match self {
            GatherError::NotFound(_) => "not_found".to_string(),
            GatherError::NoActivities(_) => "no_activities".to_string(),
            GatherError::Storage(error) => format!("persist_error:read:{error}"),
            GatherError::UnstableSnapshot => "persist_error:snapshot_unstable".to_string(),
        }
    }
}

/// Ids of every document in one gather pass, in set order.
#[derive(PartialEq, Eq)]
struct Fingerprint {
    activities: BTreeSet<String>,
    rooms: BTreeSet<String>,
    groups: BTreeSet<String>,
}

fn fingerprint(activities: &[Activity], rooms: &[Room], groups: &[Group]) -> Fingerprint {
    Fingerprint {
        activities: activities.iter().map(|a| a.id.clone()).collect(),
        rooms: rooms.iter().map(|r| r.id.clone()).collect(),
        groups: groups.iter().map(|g| g.id.clone()).collect(),
    }
}

async fn read_pass(
    db: &DbContext,
    institution_id: &str,
) -> Result<(Institution, Vec<Activity>, Vec<Room>, Vec<Group>), GatherError> {
    let institution = institutions::find_by_id(db, institution_id)
        .await?
        .ok_or_else(|| GatherError::NotFound(institution_id.to_string()))?;
    let activities = activities::find_by_institution(db, institution_id).await?;
    let rooms = rooms::find_by_institution(db, institution_id).await?;
    let groups = groups::find_by_institution(db, institution_id).await?;
    Ok((institution, activities, rooms, groups))
}

/// Reads the full problem for an institution as a consistent snapshot.
///
/// The grid comes from the schedule record (copied at creation), not from
/// the institution, so a concurrent grid edit cannot skew a running job.
pub async fn gather(
    db: &DbContext,
    institution_id: &str,
    grid: crate::data::models::TimeGridConfig,
) -> Result<SolveInput, GatherError> {
    let mut last_error = GatherError::UnstableSnapshot;
    for attempt in 1..=SNAPSHOT_ATTEMPTS {
        // Transient read failures are retried like snapshot mismatches;
        // missing institutions and empty activity sets are final.
        let passes = async {
            let first = read_pass(db, institution_id).await?;
            let second = read_pass(db, institution_id).await?;
            Ok::<_, GatherError>((first, second))
        };
        let ((_, acts, rms, grps), (_, acts2, rms2, grps2)) = match passes.await {
            Ok(passes) => passes,
            Err(error @ GatherError::Storage(_)) => {
                warn!(institution_id, attempt, error = %error, "snapshot read failed, retrying");
                last_error = error;
                tokio::time::sleep(Duration::from_millis(200 * u64::from(attempt))).await;
                continue;
            }
            Err(error) => return Err(error),
        };

        if fingerprint(&acts, &rms, &grps) != fingerprint(&acts2, &rms2, &grps2) {
            warn!(
                institution_id,
                attempt, "inputs changed between snapshot reads, retrying"
            );
            last_error = GatherError::UnstableSnapshot;
            tokio::time::sleep(Duration::from_millis(200 * u64::from(attempt))).await;
            continue;
        }

        if acts2.is_empty() {
            return Err(GatherError::NoActivities(institution_id.to_string()));
        }

        let professors: BTreeSet<&str> = acts2
            .iter()
            .filter_map(|a| a.professor_id.as_deref())
            .collect();
        info!(
            institution_id,
            activities = acts2.len(),
            rooms = rms2.len(),
            groups = grps2.len(),
            professors = professors.len(),
            "inputs gathered"
        );

        return Ok(SolveInput {
            grid,
            activities: acts2,
            rooms: rms2,
            groups: grps2,
        });
    }
    Err(last_error)
}
