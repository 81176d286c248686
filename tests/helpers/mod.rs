//! Shared builders and property checks for solver scenario tests.

use std::collections::HashMap;

use timetabler::data::models::{
    Activity, ActivityType, Frequency, Group, Room, SelectedTimeslot, TimeGridConfig,
};
use timetabler::solver::ancestry::AncestryMap;
use timetabler::solver::{Placement, SolveInput};

pub fn grid(weeks: u32, days: u32, timeslots_per_day: u32, max_per_day: u32) -> TimeGridConfig {
    TimeGridConfig {
        weeks,
        days,
        timeslots_per_day,
        max_timeslots_per_day_per_group: max_per_day,
    }
}

pub fn make_room(id: &str, features: &[&str]) -> Room {
    Room {
        id: id.to_owned(),
        institution_id: "inst-1".to_owned(),
        name: format!("Room {id}"),
        capacity: 30,
        features: features.iter().map(|f| (*f).to_owned()).collect(),
    }
}

pub fn make_group(id: &str, parent: Option<&str>) -> Group {
    Group {
        id: id.to_owned(),
        institution_id: "inst-1".to_owned(),
        name: format!("Group {id}"),
        parent_group_id: parent.map(str::to_owned),
    }
}

pub fn make_activity(id: &str, group_id: &str, duration: u32, frequency: Frequency) -> Activity {
    Activity {
        id: id.to_owned(),
        institution_id: "inst-1".to_owned(),
        course_id: "course-1".to_owned(),
        activity_type: ActivityType::Course,
        duration_slots: duration,
        group_id: group_id.to_owned(),
        professor_id: None,
        required_room_features: Vec::new(),
        frequency,
        selected_timeslot: None,
    }
}

pub fn with_professor(mut activity: Activity, professor_id: &str) -> Activity {
    activity.professor_id = Some(professor_id.to_owned());
    activity
}

pub fn with_features(mut activity: Activity, features: &[&str]) -> Activity {
    activity.required_room_features = features.iter().map(|f| (*f).to_owned()).collect();
    activity
}

pub fn with_pin(mut activity: Activity, start: u32, weeks: &[u32]) -> Activity {
    activity.selected_timeslot = Some(SelectedTimeslot {
        start_timeslot: start,
        active_weeks: weeks.to_vec(),
    });
    activity
}

fn covered(start: u32, duration: u32) -> Vec<u32> {
    (start..start + duration).collect()
}

fn overlaps(a: &Placement, da: u32, b: &Placement, db: u32) -> bool {
    let shared_week = a.active_weeks.iter().any(|w| b.active_weeks.contains(w));
    if !shared_week {
        return false;
    }
    covered(a.start_timeslot, da)
        .iter()
        .any(|slot| covered(b.start_timeslot, db).contains(slot))
}

/// Asserts every property a completed schedule must satisfy against its
/// inputs: coverage, day containment, room/professor/group exclusivity,
/// and the per-group daily load cap.
pub fn assert_valid_schedule(input: &SolveInput, placements: &[Placement]) {
    let by_activity: HashMap<&str, &Activity> =
        input.activities.iter().map(|a| (a.id.as_str(), a)).collect();
    let ancestry = AncestryMap::build(&input.groups).expect("group forest must be acyclic");

    // Coverage: exactly one placement per activity.
    assert_eq!(
        placements.len(),
        input.activities.len(),
        "every activity must be placed exactly once"
    );
    for activity in &input.activities {
        let count = placements
            .iter()
            .filter(|p| p.activity_id == activity.id)
            .count();
        assert_eq!(count, 1, "activity {} placed {count} times", activity.id);
    }

    for placement in placements {
        let activity = by_activity[placement.activity_id.as_str()];
        let duration = activity.duration_slots;

        // Day containment.
        let first_day = placement.start_timeslot / input.grid.timeslots_per_day;
        let last_day = (placement.start_timeslot + duration - 1) / input.grid.timeslots_per_day;
        assert_eq!(
            first_day, last_day,
            "activity {} straddles a day boundary",
            activity.id
        );

        // Active weeks: non-empty, within range, sorted, deduplicated.
        assert!(!placement.active_weeks.is_empty());
        assert!(placement.active_weeks.iter().all(|&w| w < input.grid.weeks));
        assert!(placement.active_weeks.windows(2).all(|w| w[0] < w[1]));

        // Frequency law.
        match activity.frequency {
            Frequency::Weekly => {
                let all_weeks: Vec<u32> = (0..input.grid.weeks).collect();
                assert_eq!(placement.active_weeks, all_weeks);
            }
            Frequency::Biweekly => assert_eq!(placement.active_weeks.len(), 1),
            Frequency::BiweeklyOdd => assert_eq!(placement.active_weeks, vec![0]),
            Frequency::BiweeklyEven => assert_eq!(placement.active_weeks, vec![1]),
        }
    }

    // Pairwise exclusivity.
    for (i, a) in placements.iter().enumerate() {
        let act_a = by_activity[a.activity_id.as_str()];
        for b in placements.iter().skip(i + 1) {
            let act_b = by_activity[b.activity_id.as_str()];
            let conflict = overlaps(a, act_a.duration_slots, b, act_b.duration_slots);

            if a.room_id == b.room_id {
                assert!(
                    !conflict,
                    "room {} double-booked by {} and {}",
                    a.room_id, act_a.id, act_b.id
                );
            }
            if let (Some(pa), Some(pb)) = (&act_a.professor_id, &act_b.professor_id)
                && pa == pb
            {
                assert!(
                    !conflict,
                    "professor {pa} double-booked by {} and {}",
                    act_a.id, act_b.id
                );
            }
            if ancestry.conflicts(&act_a.group_id, &act_b.group_id) {
                assert!(
                    !conflict,
                    "groups {} and {} share students but overlap",
                    act_a.group_id, act_b.group_id
                );
            }
        }
    }

    // Daily load cap per group conflict set.
    for group in &input.groups {
        for week in 0..input.grid.weeks {
            for day in 0..input.grid.days {
                let mut used = 0;
                for placement in placements {
                    let activity = by_activity[placement.activity_id.as_str()];
                    if !ancestry.conflicts(&activity.group_id, &group.id) {
                        continue;
                    }
                    if !placement.active_weeks.contains(&week) {
                        continue;
                    }
                    if placement.start_timeslot / input.grid.timeslots_per_day == day {
                        used += activity.duration_slots;
                    }
                }
                assert!(
                    used <= input.grid.max_timeslots_per_day_per_group,
                    "group {} overloaded on week {week} day {day}: {used} slots",
                    group.id
                );
            }
        }
    }
}
