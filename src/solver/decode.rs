//! Solution decoding: assigned `y` variables to placements.

use std::collections::BTreeMap;

use good_lp::Solution;

use crate::data::models::{Activity, Room};
use crate::solver::model::VarModel;

/// One placed activity, with its active weeks coalesced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub activity_id: String,
    pub room_id: String,
    pub start_timeslot: u32,
    pub active_weeks: Vec<u32>,
}

/// Reads the assigned `y[a, k, r, s]` layer and aggregates per-week hits
/// into one placement per `(activity, room, start)`.
pub fn decode(
    solution: &impl Solution,
    vm: &VarModel,
    activities: &[Activity],
    rooms: &[Room],
) -> Vec<Placement> {
    let selected: Vec<(usize, usize, u32, u32)> = vm
        .actives
        .iter()
        .filter(|av| solution.value(av.var) > 0.5)
        .map(|av| (av.activity, av.room, av.start, av.week))
        .collect();
    coalesce(selected, activities, rooms)
}

/// Groups `(activity, room, start, week)` hits by everything but the week;
/// the weeks become `active_weeks`, sorted ascending and deduplicated. Every
/// group has at least one hit, so `active_weeks` is never empty.
fn coalesce(
    selected: Vec<(usize, usize, u32, u32)>,
    activities: &[Activity],
    rooms: &[Room],
) -> Vec<Placement> {
    let mut grouped: BTreeMap<(usize, usize, u32), Vec<u32>> = BTreeMap::new();
    for (activity, room, start, week) in selected {
        grouped.entry((activity, room, start)).or_default().push(week);
    }
    grouped
        .into_iter()
        .map(|((activity, room, start), mut weeks)| {
            weeks.sort_unstable();
            weeks.dedup();
            Placement {
                activity_id: activities[activity].id.clone(),
                room_id: rooms[room].id.clone(),
                start_timeslot: start,
                active_weeks: weeks,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::models::{ActivityType, Frequency};

    fn activity(id: &str) -> Activity {
        Activity {
            id: id.to_string(),
            institution_id: "inst".to_string(),
            course_id: "c1".to_string(),
            activity_type: ActivityType::Course,
            duration_slots: 1,
            group_id: "g1".to_string(),
            professor_id: None,
            required_room_features: Vec::new(),
            frequency: Frequency::Weekly,
            selected_timeslot: None,
        }
    }

    fn room(id: &str) -> Room {
        Room {
            id: id.to_string(),
            institution_id: "inst".to_string(),
            name: id.to_string(),
            capacity: 10,
            features: Vec::new(),
        }
    }

    #[test]
    fn coalesce_merges_weeks_per_placement() {
        let activities = vec![activity("a1"), activity("a2")];
        let rooms = vec![room("r1")];
        // a1 runs weeks 1 and 0 at (r1, slot 2); a2 runs week 0 at (r1, slot 4).
        let selected = vec![(0, 0, 2, 1), (0, 0, 2, 0), (1, 0, 4, 0)];
        let placements = coalesce(selected, &activities, &rooms);
        assert_eq!(placements.len(), 2);
        assert_eq!(placements[0].activity_id, "a1");
        assert_eq!(placements[0].active_weeks, vec![0, 1]);
        assert_eq!(placements[1].activity_id, "a2");
        assert_eq!(placements[1].active_weeks, vec![0]);
    }

    #[test]
    fn coalesce_deduplicates_repeated_weeks() {
        let activities = vec![activity("a1")];
        let rooms = vec![room("r1")];
        let selected = vec![(0, 0, 0, 1), (0, 0, 0, 1)];
        let placements = coalesce(selected, &activities, &rooms);
        assert_eq!(placements[0].active_weeks, vec![1]);
    }
}
