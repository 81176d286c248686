//! Constraint generation over the variable model.
//!
//! Every generator threads the backend model through and returns it, so the
//! driver can chain them. Sums are built as [`Expression`]s and bounded with
//! `leq`/`eq`; the `y` conjunction layer is linearised with the standard
//! three inequalities.

use std::collections::HashMap;

use good_lp::{Expression, SolverModel, Variable};

use crate::data::models::{Activity, Frequency, Group};
use crate::solver::ancestry::AncestryMap;
use crate::solver::grid::{TimeGrid, covered_slots};
use crate::solver::model::VarModel;

/// Everything the generators need besides the variables themselves.
pub struct ConstraintContext<'a> {
    pub grid: &'a TimeGrid,
    pub activities: &'a [Activity],
    pub groups: &'a [Group],
    pub ancestry: &'a AncestryMap,
}

/// Applies the full constraint system in a fixed order.
pub fn apply<M: SolverModel>(mut model: M, ctx: &ConstraintContext, vm: &VarModel) -> M {
    model = add_placement_choice(model, ctx, vm);
    model = add_week_patterns(model, ctx, vm);
    model = add_week_linking(model, vm);
    model = add_room_exclusivity(model, ctx, vm);
    model = add_professor_exclusivity(model, ctx, vm);
    model = add_group_exclusivity(model, ctx, vm);
    model = add_daily_load(model, ctx, vm);
    model = add_pins(model, vm);
    model
}

/// Exactly one `(room, start)` choice per activity.
fn add_placement_choice<M: SolverModel>(
    mut model: M,
    ctx: &ConstraintContext,
    vm: &VarModel,
) -> M {
    for index in 0..ctx.activities.len() {
        let mut sum = Expression::from(0.0);
        for pv in vm.placements.iter().filter(|pv| pv.activity == index) {
            sum = sum + pv.var;
        }
        model = model.with(sum.eq(1.0));
    }
    model
}

/// Week-activation pattern per activity frequency.
fn add_week_patterns<M: SolverModel>(mut model: M, ctx: &ConstraintContext, vm: &VarModel) -> M {
    for (index, activity) in ctx.activities.iter().enumerate() {
        let week_vars: Vec<Variable> = vm
            .weeks
            .iter()
            .filter(|wv| wv.activity == index)
            .map(|wv| wv.var)
            .collect();
        match activity.frequency {
            Frequency::Weekly => {
                for var in week_vars {
                    model = model.with(Expression::from(var).eq(1.0));
                }
            }
            Frequency::Biweekly | Frequency::BiweeklyOdd | Frequency::BiweeklyEven => {
                let mut sum = Expression::from(0.0);
                for &var in &week_vars {
                    sum = sum + var;
                }
                model = model.with(sum.eq(1.0));
                match activity.frequency {
                    Frequency::BiweeklyOdd => {
                        model = model.with(Expression::from(week_vars[0]).eq(1.0));
                    }
                    Frequency::BiweeklyEven => {
                        model = model.with(Expression::from(week_vars[1]).eq(1.0));
                    }
                    _ => {}
                }
            }
        }
    }
    model
}

/// `y = x AND w`, linearised as `y <= x`, `y <= w`, `y >= x + w - 1`.
fn add_week_linking<M: SolverModel>(mut model: M, vm: &VarModel) -> M {
    let x_of: HashMap<(usize, usize, u32), Variable> = vm
        .placements
        .iter()
        .map(|pv| ((pv.activity, pv.room, pv.start), pv.var))
        .collect();
    let w_of: HashMap<(usize, u32), Variable> = vm
        .weeks
        .iter()
        .map(|wv| ((wv.activity, wv.week), wv.var))
        .collect();

    for av in &vm.actives {
        let x = x_of[&(av.activity, av.room, av.start)];
        let w = w_of[&(av.activity, av.week)];
        model = model.with((av.var - x).leq(0.0));
        model = model.with((av.var - w).leq(0.0));
        model = model.with((av.var - x - w).geq(-1.0));
    }
    model
}

/// At most one activity occupies a room in any (week, slot).
fn add_room_exclusivity<M: SolverModel>(mut model: M, ctx: &ConstraintContext, vm: &VarModel) -> M {
    let mut occupancy: HashMap<(u32, usize, u32), Vec<Variable>> = HashMap::new();
    for av in &vm.actives {
        let duration = ctx.activities[av.activity].duration_slots;
        for slot in covered_slots(av.start, duration) {
            occupancy
                .entry((av.week, av.room, slot))
                .or_default()
                .push(av.var);
        }
    }
    for vars in occupancy.into_values() {
        if vars.len() < 2 {
            continue;
        }
        let mut sum = Expression::from(0.0);
        for var in vars {
            sum = sum + var;
        }
        model = model.with(sum.leq(1.0));
    }
    model
}

/// At most one activity per professor in any (week, slot), regardless of
/// room. Activities without a professor are exempt.
fn add_professor_exclusivity<M: SolverModel>(
    mut model: M,
    ctx: &ConstraintContext,
    vm: &VarModel,
) -> M {
    let mut occupancy: HashMap<(u32, &str, u32), Vec<Variable>> = HashMap::new();
    for av in &vm.actives {
        let activity = &ctx.activities[av.activity];
        let Some(professor_id) = activity.professor_id.as_deref() else {
            continue;
        };
        for slot in covered_slots(av.start, activity.duration_slots) {
            occupancy
                .entry((av.week, professor_id, slot))
                .or_default()
                .push(av.var);
        }
    }
    for vars in occupancy.into_values() {
        if vars.len() < 2 {
            continue;
        }
        let mut sum = Expression::from(0.0);
        for var in vars {
            sum = sum + var;
        }
        model = model.with(sum.leq(1.0));
    }
    model
}

/// Activity indices whose group shares students with `group`.
fn conflict_set(ctx: &ConstraintContext, group: &Group) -> Vec<usize> {
    ctx.activities
        .iter()
        .enumerate()
        .filter(|(_, activity)| ctx.ancestry.conflicts(&activity.group_id, &group.id))
        .map(|(index, _)| index)
        .collect()
}

/// At most one activity from each group's conflict set in any (week, slot).
fn add_group_exclusivity<M: SolverModel>(mut model: M, ctx: &ConstraintContext, vm: &VarModel) -> M {
    for group in ctx.groups {
        let members = conflict_set(ctx, group);
        if members.is_empty() {
            continue;
        }
        let mut occupancy: HashMap<(u32, u32), Vec<Variable>> = HashMap::new();
        for av in vm.actives.iter().filter(|av| members.contains(&av.activity)) {
            let duration = ctx.activities[av.activity].duration_slots;
            for slot in covered_slots(av.start, duration) {
                occupancy.entry((av.week, slot)).or_default().push(av.var);
            }
        }
        for vars in occupancy.into_values() {
            if vars.len() < 2 {
                continue;
            }
            let mut sum = Expression::from(0.0);
            for var in vars {
                sum = sum + var;
            }
            model = model.with(sum.leq(1.0));
        }
    }
    model
}

/// Caps the covered slots attributable to a group's conflict set per
/// (week, day). An activity contributes its full duration to the day it
/// runs on, so `y` enters the sum weighted by duration.
fn add_daily_load<M: SolverModel>(mut model: M, ctx: &ConstraintContext, vm: &VarModel) -> M {
    let cap = f64::from(ctx.grid.max_timeslots_per_day_per_group);
    for group in ctx.groups {
        let members = conflict_set(ctx, group);
        if members.is_empty() {
            continue;
        }
        let mut load: HashMap<(u32, u32), Expression> = HashMap::new();
        for av in vm.actives.iter().filter(|av| members.contains(&av.activity)) {
            let duration = ctx.activities[av.activity].duration_slots;
            let day = ctx.grid.day_of_slot(av.start);
            let entry = load
                .entry((av.week, day))
                .or_insert_with(|| Expression::from(0.0));
            *entry = entry.clone() + f64::from(duration) * av.var;
        }
        for sum in load.into_values() {
            model = model.with(sum.leq(cap));
        }
    }
    model
}

/// Unit constraints for manually pinned activities: the placement must use
/// the pinned start (any eligible room), and pinned weeks fix the `w` layer
/// outright.
fn add_pins<M: SolverModel>(mut model: M, vm: &VarModel) -> M {
    for pin in &vm.pins {
        let mut sum = Expression::from(0.0);
        for pv in vm
            .placements
            .iter()
            .filter(|pv| pv.activity == pin.activity && pv.start == pin.start)
        {
            sum = sum + pv.var;
        }
        model = model.with(sum.eq(1.0));

        if let Some(active_weeks) = &pin.active_weeks {
            for wv in vm.weeks.iter().filter(|wv| wv.activity == pin.activity) {
                let pinned_on = active_weeks.contains(&wv.week);
                let value = if pinned_on { 1.0 } else { 0.0 };
                model = model.with(Expression::from(wv.var).eq(value));
            }
        }
    }
    model
}
