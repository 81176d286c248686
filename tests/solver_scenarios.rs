//! End-to-end scenarios for the solver core: feasible timetables satisfy
//! every scheduling invariant, and each failure class surfaces its typed
//! error with the expected classifier string.

mod helpers;

use helpers::{
    assert_valid_schedule, grid, make_activity, make_group, make_room, with_features, with_pin,
    with_professor,
};
use timetabler::data::models::Frequency;
use timetabler::solver::{
    InfeasibleReason, SolveError, SolveInput, SolverSettings, solve,
};

fn settings() -> SolverSettings {
    SolverSettings::default()
}

#[test]
fn trivial_single_activity_schedules() {
    let input = SolveInput {
        grid: grid(1, 1, 4, 4),
        activities: vec![make_activity("a1", "g1", 2, Frequency::Weekly)],
        rooms: vec![make_room("r1", &[])],
        groups: vec![make_group("g1", None)],
    };

    let placements = solve(&input, &settings()).expect("trivial problem must be feasible");
    assert_valid_schedule(&input, &placements);

    let placement = &placements[0];
    assert_eq!(placement.room_id, "r1");
    assert_eq!(placement.active_weeks, vec![0]);
    assert!(placement.start_timeslot + 2 <= 4);
}

#[test]
fn missing_room_feature_is_infeasible_before_solving() {
    let input = SolveInput {
        grid: grid(1, 1, 4, 4),
        activities: vec![with_features(
            make_activity("a1", "g1", 2, Frequency::Weekly),
            &["projector"],
        )],
        rooms: vec![make_room("r1", &[])],
        groups: vec![make_group("g1", None)],
    };

    let error = solve(&input, &settings()).unwrap_err();
    assert!(matches!(
        &error,
        SolveError::Infeasible(InfeasibleReason::NoEligibleRoom { activity_id }) if activity_id == "a1"
    ));
    assert_eq!(error.failure_code(), "infeasible:no_eligible_room:a1");
}

#[test]
fn biweekly_even_on_one_week_grid_is_invalid_input() {
    let input = SolveInput {
        grid: grid(1, 1, 2, 2),
        activities: vec![
            with_professor(make_activity("a1", "g1", 2, Frequency::BiweeklyEven), "p1"),
            with_professor(make_activity("a2", "g1", 2, Frequency::Weekly), "p1"),
        ],
        rooms: vec![make_room("r1", &[])],
        groups: vec![make_group("g1", None)],
    };

    let error = solve(&input, &settings()).unwrap_err();
    assert!(matches!(error, SolveError::InvalidInput(_)));
    assert!(error.failure_code().starts_with("invalid_input"));
}

#[test]
fn biweekly_activities_separate_into_different_weeks() {
    let input = SolveInput {
        grid: grid(2, 1, 2, 2),
        activities: vec![
            make_activity("a1", "g1", 2, Frequency::Biweekly),
            make_activity("a2", "g1", 2, Frequency::Biweekly),
        ],
        rooms: vec![make_room("r1", &[])],
        groups: vec![make_group("g1", None)],
    };

    let placements = solve(&input, &settings()).expect("two weeks fit two biweekly activities");
    assert_valid_schedule(&input, &placements);

    let mut weeks: Vec<Vec<u32>> = placements.iter().map(|p| p.active_weeks.clone()).collect();
    weeks.sort();
    assert_eq!(weeks, vec![vec![0], vec![1]]);
}

#[test]
fn series_and_subgroup_never_overlap() {
    let input = SolveInput {
        grid: grid(1, 1, 4, 4),
        activities: vec![
            make_activity("a_series", "series", 2, Frequency::Weekly),
            make_activity("a_g1", "g1", 2, Frequency::Weekly),
        ],
        rooms: vec![make_room("r1", &[])],
        groups: vec![
            make_group("series", None),
            make_group("g1", Some("series")),
            make_group("g2", Some("series")),
        ],
    };

    let placements = solve(&input, &settings()).expect("four slots fit two two-slot activities");
    assert_valid_schedule(&input, &placements);

    let starts: Vec<u32> = placements.iter().map(|p| p.start_timeslot).collect();
    assert_eq!(starts.len(), 2);
    assert_eq!(
        u32::abs_diff(starts[0], starts[1]),
        2,
        "covered slot sets must be disjoint"
    );
}

#[test]
fn daily_load_cap_makes_overfull_day_infeasible() {
    // Four two-slot weekly activities demand 8 slots; the cap allows 6.
    let input = SolveInput {
        grid: grid(1, 1, 8, 6),
        activities: vec![
            make_activity("a1", "g1", 2, Frequency::Weekly),
            make_activity("a2", "g1", 2, Frequency::Weekly),
            make_activity("a3", "g1", 2, Frequency::Weekly),
            make_activity("a4", "g1", 2, Frequency::Weekly),
        ],
        rooms: vec![make_room("r1", &[])],
        groups: vec![make_group("g1", None)],
    };

    let error = solve(&input, &settings()).unwrap_err();
    assert!(matches!(
        error,
        SolveError::Infeasible(InfeasibleReason::Unsat)
    ));
    assert_eq!(error.failure_code(), "infeasible");
}

#[test]
fn weekly_runs_every_week_and_odd_even_pin_their_week() {
    let input = SolveInput {
        grid: grid(2, 1, 6, 6),
        activities: vec![
            make_activity("a_weekly", "g1", 2, Frequency::Weekly),
            make_activity("a_odd", "g1", 2, Frequency::BiweeklyOdd),
            make_activity("a_even", "g1", 2, Frequency::BiweeklyEven),
        ],
        rooms: vec![make_room("r1", &[])],
        groups: vec![make_group("g1", None)],
    };

    let placements = solve(&input, &settings()).expect("six slots fit three activities");
    assert_valid_schedule(&input, &placements);

    let weeks_of = |id: &str| {
        placements
            .iter()
            .find(|p| p.activity_id == id)
            .unwrap()
            .active_weeks
            .clone()
    };
    assert_eq!(weeks_of("a_weekly"), vec![0, 1]);
    assert_eq!(weeks_of("a_odd"), vec![0]);
    assert_eq!(weeks_of("a_even"), vec![1]);
}

#[test]
fn professor_exclusivity_spans_rooms() {
    // Two rooms, one professor, one slot-pair per day: the two activities
    // must land on different slot pairs even though rooms are plentiful.
    let input = SolveInput {
        grid: grid(1, 1, 4, 4),
        activities: vec![
            with_professor(make_activity("a1", "g1", 2, Frequency::Weekly), "p1"),
            with_professor(make_activity("a2", "g2", 2, Frequency::Weekly), "p1"),
        ],
        rooms: vec![make_room("r1", &[]), make_room("r2", &[])],
        groups: vec![make_group("g1", None), make_group("g2", None)],
    };

    let placements = solve(&input, &settings()).expect("professor fits both sequentially");
    assert_valid_schedule(&input, &placements);
}

#[test]
fn pinned_activity_keeps_its_start_and_weeks() {
    let input = SolveInput {
        grid: grid(2, 1, 4, 4),
        activities: vec![
            with_pin(make_activity("a1", "g1", 2, Frequency::Biweekly), 2, &[1]),
            make_activity("a2", "g1", 2, Frequency::Weekly),
        ],
        rooms: vec![make_room("r1", &[])],
        groups: vec![make_group("g1", None)],
    };

    let placements = solve(&input, &settings()).expect("pin leaves room for the other activity");
    assert_valid_schedule(&input, &placements);

    let pinned = placements.iter().find(|p| p.activity_id == "a1").unwrap();
    assert_eq!(pinned.start_timeslot, 2);
    assert_eq!(pinned.active_weeks, vec![1]);
}

#[test]
fn pin_outside_legal_starts_fails_before_solving() {
    let input = SolveInput {
        grid: grid(1, 1, 4, 4),
        activities: vec![with_pin(
            make_activity("a1", "g1", 2, Frequency::Weekly),
            3,
            &[],
        )],
        rooms: vec![make_room("r1", &[])],
        groups: vec![make_group("g1", None)],
    };

    let error = solve(&input, &settings()).unwrap_err();
    assert_eq!(error.failure_code(), "infeasible:pin_conflict:a1");
}

#[test]
fn group_cycle_is_reported_as_invalid_graph() {
    let input = SolveInput {
        grid: grid(1, 1, 4, 4),
        activities: vec![make_activity("a1", "g1", 1, Frequency::Weekly)],
        rooms: vec![make_room("r1", &[])],
        groups: vec![make_group("g1", Some("g2")), make_group("g2", Some("g1"))],
    };

    let error = solve(&input, &settings()).unwrap_err();
    assert!(matches!(error, SolveError::InvalidGraph { .. }));
    assert_eq!(error.failure_code(), "invalid_graph");
}

#[test]
fn repeated_runs_agree_on_feasibility() {
    let input = SolveInput {
        grid: grid(2, 2, 4, 4),
        activities: vec![
            make_activity("a1", "g1", 2, Frequency::Weekly),
            make_activity("a2", "g1", 1, Frequency::Biweekly),
            make_activity("a3", "g2", 2, Frequency::Weekly),
        ],
        rooms: vec![make_room("r1", &[])],
        groups: vec![make_group("g1", None), make_group("g2", None)],
    };

    let first = solve(&input, &settings()).expect("problem is feasible");
    let second = solve(&input, &settings()).expect("problem is feasible");
    assert_valid_schedule(&input, &first);
    assert_valid_schedule(&input, &second);
    assert_eq!(first.len(), second.len());
}
