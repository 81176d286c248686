//! Backend solver invocation.
//!
//! The timetable model is a pure decision problem, so the objective is a
//! constant zero and the backend stops at the first feasible point. CBC is
//! run with a fixed seed and explicit time/thread parameters so repeated
//! runs over the same inputs classify identically.

use std::time::{Duration, Instant};

use good_lp::{Expression, ProblemVariables, ResolutionError, Solution, SolverModel, default_solver};
use tracing::{debug, info};

use crate::solver::constraints::{self, ConstraintContext};
use crate::solver::error::{InfeasibleReason, SolveError};
use crate::solver::model::VarModel;

/// Budget and parallelism for one solver invocation.
#[derive(Debug, Clone, Copy)]
pub struct SolverSettings {
    /// Wall-clock cap for the search.
    pub time_limit: Duration,
    /// Parallel search workers handed to the backend.
    pub workers: u32,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(60),
            workers: 8,
        }
    }
}

/// Assembles the constraint system and runs the backend to a verdict.
///
/// A non-feasible result whose wall clock reached the budget is reported as
/// [`SolveError::Timeout`]; the backend does not reliably distinguish
/// "stopped at the limit" from "proved unsatisfiable" through its result
/// value alone.
pub fn run(
    vars: ProblemVariables,
    vm: &VarModel,
    ctx: &ConstraintContext,
    settings: &SolverSettings,
) -> Result<impl Solution + use<>, SolveError> {
    debug!(
        placement_vars = vm.placements.len(),
        week_vars = vm.weeks.len(),
        active_vars = vm.actives.len(),
        "assembling solver model"
    );

    let mut problem = vars.minimise(Expression::from(0.0)).using(default_solver);
    problem.set_parameter("logLevel", "0");
    problem.set_parameter("randomCbcSeed", "1");
    problem.set_parameter("sec", &settings.time_limit.as_secs().to_string());
    problem.set_parameter("threads", &settings.workers.to_string());

    let problem = constraints::apply(problem, ctx, vm);

    let started = Instant::now();
    let result = problem.solve();
    let elapsed = started.elapsed();
    let out_of_budget = elapsed >= settings.time_limit;

    match result {
        Ok(solution) => {
            info!(elapsed_ms = elapsed.as_millis() as u64, "solver found a feasible schedule");
            Ok(solution)
        }
        Err(ResolutionError::Infeasible) if out_of_budget => Err(SolveError::Timeout),
        Err(ResolutionError::Infeasible) => {
            info!(elapsed_ms = elapsed.as_millis() as u64, "solver proved the model unsatisfiable");
            Err(SolveError::Infeasible(InfeasibleReason::Unsat))
        }
        Err(_) if out_of_budget => Err(SolveError::Timeout),
        Err(error) => Err(SolveError::Solver(error.to_string())),
    }
}
