//! Decision-variable model for the timetable problem.
//!
//! Three boolean layers over [`good_lp::ProblemVariables`]:
//!
//! - `x[a, r, s]` -- activity `a` is placed in room `r` starting at slot `s`
//! - `w[a, k]`    -- activity `a` runs in week `k`
//! - `y[a, k, r, s]` -- the conjunction of the two, linearised in
//!   [`crate::solver::constraints`]; the decoder reads only this layer.
//!
//! Structural problems (oversized durations, unknown group references,
//! unsatisfiable pins) are rejected here, before the backend ever runs.

use std::collections::HashSet;

use good_lp::{ProblemVariables, Variable, variable};

use crate::data::models::{Activity, Frequency, Room, SelectedTimeslot};
use crate::solver::error::{InfeasibleReason, SolveError};
use crate::solver::grid::TimeGrid;
use crate::solver::rooms::eligible_rooms;

/// One `x[a, r, s]` placement-choice variable.
#[derive(Clone, Copy)]
pub struct PlacementVar {
    pub activity: usize,
    pub room: usize,
    pub start: u32,
    pub var: Variable,
}

/// One `w[a, k]` active-week variable.
#[derive(Clone, Copy)]
pub struct WeekVar {
    pub activity: usize,
    pub week: u32,
    pub var: Variable,
}

/// One `y[a, k, r, s]` per-week realisation variable.
#[derive(Clone, Copy)]
pub struct ActiveVar {
    pub activity: usize,
    pub week: u32,
    pub room: usize,
    pub start: u32,
    pub var: Variable,
}

/// A validated pin derived from an activity's `selected_timeslot`.
pub struct Pin {
    pub activity: usize,
    pub start: u32,
    pub active_weeks: Option<Vec<u32>>,
}

/// The variable layers the constraint generator and decoder iterate over.
/// The backing [`ProblemVariables`] are returned separately by [`build`]
/// because the solver driver consumes them.
pub struct VarModel {
    pub placements: Vec<PlacementVar>,
    pub weeks: Vec<WeekVar>,
    pub actives: Vec<ActiveVar>,
    pub pins: Vec<Pin>,
}

fn validate_pin(
    index: usize,
    activity: &Activity,
    pin: &SelectedTimeslot,
    starts: &[u32],
    grid: &TimeGrid,
) -> Result<Pin, SolveError> {
    if !starts.contains(&pin.start_timeslot) {
        return Err(SolveError::Infeasible(InfeasibleReason::PinConflict {
            activity_id: activity.id.clone(),
        }));
    }
    let active_weeks = if pin.active_weeks.is_empty() {
        None
    } else {
        if pin.active_weeks.iter().any(|&week| week >= grid.weeks) {
            return Err(SolveError::Infeasible(InfeasibleReason::PinConflict {
                activity_id: activity.id.clone(),
            }));
        }
        Some(pin.active_weeks.clone())
    };
    Ok(Pin {
        activity: index,
        start: pin.start_timeslot,
        active_weeks,
    })
}

/// Instantiates every variable layer for the given activities.
///
/// Fails fast on the structural error classes of the input: zero or
/// oversized durations, non-weekly frequencies on a grid with fewer than
/// two weeks, activities whose group is unknown, activities with no
/// eligible room, and pins that fall outside the activity's legal
/// placements.
pub fn build(
    grid: &TimeGrid,
    activities: &[Activity],
    rooms: &[Room],
    known_groups: &HashSet<&str>,
) -> Result<(ProblemVariables, VarModel), SolveError> {
    let mut vars = ProblemVariables::new();
    let mut placements = Vec::new();
    let mut weeks = Vec::new();
    let mut actives = Vec::new();
    let mut pins = Vec::new();

    for (index, activity) in activities.iter().enumerate() {
        if activity.frequency != Frequency::Weekly && grid.weeks < 2 {
            return Err(SolveError::InvalidInput(format!(
                "activity {} has frequency {} but the grid spans {} week(s)",
                activity.id,
                activity.frequency.as_str(),
                grid.weeks
            )));
        }
        if !known_groups.contains(activity.group_id.as_str()) {
            return Err(SolveError::InvalidInput(format!(
                "activity {} references unknown group {}",
                activity.id, activity.group_id
            )));
        }

        let activity_rooms = eligible_rooms(activity, rooms)?;
        let activity_starts = grid.allowed_starts(activity.duration_slots)?;

        for &room in &activity_rooms {
            for &start in &activity_starts {
                placements.push(PlacementVar {
                    activity: index,
                    room,
                    start,
                    var: vars.add(variable().binary()),
                });
            }
        }
        for week in 0..grid.weeks {
            weeks.push(WeekVar {
                activity: index,
                week,
                var: vars.add(variable().binary()),
            });
        }
        for week in 0..grid.weeks {
            for &room in &activity_rooms {
                for &start in &activity_starts {
                    actives.push(ActiveVar {
                        activity: index,
                        week,
                        room,
                        start,
                        var: vars.add(variable().binary()),
                    });
                }
            }
        }

        if let Some(selected) = &activity.selected_timeslot {
            pins.push(validate_pin(index, activity, selected, &activity_starts, grid)?);
        }
    }

    Ok((
        vars,
        VarModel {
            placements,
            weeks,
            actives,
            pins,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::models::{ActivityType, TimeGridConfig};

    fn grid(weeks: u32, days: u32, timeslots_per_day: u32) -> TimeGrid {
        TimeGrid::from_config(&TimeGridConfig {
            weeks,
            days,
            timeslots_per_day,
            max_timeslots_per_day_per_group: timeslots_per_day,
        })
        .unwrap()
    }

    fn room(id: &str) -> Room {
        Room {
            id: id.to_string(),
            institution_id: "inst".to_string(),
            name: id.to_string(),
            capacity: 30,
            features: Vec::new(),
        }
    }

    fn activity(id: &str, duration: u32, frequency: Frequency) -> Activity {
        Activity {
            id: id.to_string(),
            institution_id: "inst".to_string(),
            course_id: "c1".to_string(),
            activity_type: ActivityType::Course,
            duration_slots: duration,
            group_id: "g1".to_string(),
            professor_id: None,
            required_room_features: Vec::new(),
            frequency,
            selected_timeslot: None,
        }
    }

    fn known_groups() -> HashSet<&'static str> {
        HashSet::from(["g1"])
    }

    #[test]
    fn layer_sizes_follow_the_grid() {
        let grid = grid(2, 1, 4);
        let rooms = vec![room("r1")];
        let activities = vec![activity("a1", 2, Frequency::Weekly)];
        let (_, model) = build(&grid, &activities, &rooms, &known_groups()).unwrap();
        // 1 room x 3 starts, 2 weeks, and their product.
        assert_eq!(model.placements.len(), 3);
        assert_eq!(model.weeks.len(), 2);
        assert_eq!(model.actives.len(), 6);
    }

    #[test]
    fn biweekly_on_single_week_grid_is_invalid() {
        let grid = grid(1, 1, 4);
        let rooms = vec![room("r1")];
        let activities = vec![activity("a1", 2, Frequency::BiweeklyEven)];
        assert!(matches!(
            build(&grid, &activities, &rooms, &known_groups()),
            Err(SolveError::InvalidInput(_))
        ));
    }

    #[test]
    fn unknown_group_is_invalid() {
        let grid = grid(1, 1, 4);
        let rooms = vec![room("r1")];
        let mut bad = activity("a1", 2, Frequency::Weekly);
        bad.group_id = "nope".to_string();
        assert!(matches!(
            build(&grid, &[bad], &rooms, &known_groups()),
            Err(SolveError::InvalidInput(_))
        ));
    }

    #[test]
    fn pin_outside_allowed_starts_conflicts() {
        let grid = grid(1, 1, 4);
        let rooms = vec![room("r1")];
        let mut pinned = activity("a1", 2, Frequency::Weekly);
        // Duration 2 on a 4-slot day allows starts 0..=2; slot 3 overruns.
        pinned.selected_timeslot = Some(SelectedTimeslot {
            start_timeslot: 3,
            active_weeks: Vec::new(),
        });
        assert!(matches!(
            build(&grid, &[pinned], &rooms, &known_groups()),
            Err(SolveError::Infeasible(InfeasibleReason::PinConflict { .. }))
        ));
    }

    #[test]
    fn pin_week_outside_grid_conflicts() {
        let grid = grid(2, 1, 4);
        let rooms = vec![room("r1")];
        let mut pinned = activity("a1", 2, Frequency::Biweekly);
        pinned.selected_timeslot = Some(SelectedTimeslot {
            start_timeslot: 0,
            active_weeks: vec![5],
        });
        assert!(matches!(
            build(&grid, &[pinned], &rooms, &known_groups()),
            Err(SolveError::Infeasible(InfeasibleReason::PinConflict { .. }))
        ));
    }
}
