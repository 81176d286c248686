//! Constraint-satisfaction core for timetable generation.
//!
//! The entry point is [`solve`], a synchronous CPU-bound call over fully
//! gathered inputs. It owns no I/O: the worker plane gathers the inputs,
//! calls this from a blocking task, and persists the placements.

pub mod ancestry;
pub mod constraints;
pub mod decode;
pub mod driver;
pub mod error;
pub mod grid;
pub mod model;
pub mod rooms;

use std::collections::HashSet;

use crate::data::models::{Activity, Group, Room, TimeGridConfig};
use ancestry::AncestryMap;
use constraints::ConstraintContext;
use grid::TimeGrid;

pub use decode::Placement;
pub use driver::SolverSettings;
pub use error::{InfeasibleReason, SolveError};

/// A fully gathered timetable problem for one institution.
#[derive(Debug, Clone)]
pub struct SolveInput {
    pub grid: TimeGridConfig,
    pub activities: Vec<Activity>,
    pub rooms: Vec<Room>,
    pub groups: Vec<Group>,
}

/// Decides the timetable problem and returns one placement per activity,
/// or the typed reason no schedule exists.
pub fn solve(input: &SolveInput, settings: &SolverSettings) -> Result<Vec<Placement>, SolveError> {
    let grid = TimeGrid::from_config(&input.grid)?;
    let ancestry = AncestryMap::build(&input.groups)?;
    let known_groups: HashSet<&str> = input.groups.iter().map(|g| g.id.as_str()).collect();

    let (vars, var_model) = model::build(&grid, &input.activities, &input.rooms, &known_groups)?;
    let ctx = ConstraintContext {
        grid: &grid,
        activities: &input.activities,
        groups: &input.groups,
        ancestry: &ancestry,
    };

    let solution = driver::run(vars, &var_model, &ctx, settings)?;
    Ok(decode::decode(&solution, &var_model, &input.activities, &input.rooms))
}
