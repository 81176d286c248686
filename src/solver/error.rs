//! Error types for the solver core.

/// Why a problem is unsatisfiable before or after search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfeasibleReason {
    /// No room carries every feature the activity requires.
    NoEligibleRoom { activity_id: String },
    /// A pinned timeslot falls outside the activity's legal placements.
    PinConflict { activity_id: String },
    /// The backend proved the constraint system unsatisfiable.
    Unsat,
}

#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    /// Structural input problems caught before the model is built.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The group forest contains a cycle.
    #[error("group graph contains a cycle through {group_id}")]
    InvalidGraph { group_id: String },
    #[error("no feasible schedule exists")]
    Infeasible(InfeasibleReason),
    /// The time budget elapsed without a verdict.
    #[error("solver exceeded its time budget")]
    Timeout,
    #[error("solver backend failed: {0}")]
    Solver(String),
}

impl SolveError {
    /// Short classifier recorded on a failed schedule's `error_message`.
    pub fn failure_code(&self) -> String {
        match self {
            SolveError::InvalidInput(detail) => format!("invalid_input:{detail}"),
            SolveError::InvalidGraph { .. } => "invalid_graph".to_string(),
            SolveError::Infeasible(reason) => match reason {
                InfeasibleReason::NoEligibleRoom { activity_id } => {
                    format!("infeasible:no_eligible_room:{activity_id}")
                }
                InfeasibleReason::PinConflict { activity_id } => {
                    format!("infeasible:pin_conflict:{activity_id}")
                }
                InfeasibleReason::Unsat => "infeasible".to_string(),
            },
            SolveError::Timeout => "timeout".to_string(),
            SolveError::Solver(_) => "solver_error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_codes_are_stable() {
        assert_eq!(
            SolveError::Infeasible(InfeasibleReason::NoEligibleRoom {
                activity_id: "a1".into()
            })
            .failure_code(),
            "infeasible:no_eligible_room:a1"
        );
        assert_eq!(SolveError::Timeout.failure_code(), "timeout");
        assert_eq!(
            SolveError::InvalidGraph {
                group_id: "g".into()
            }
            .failure_code(),
            "invalid_graph"
        );
        assert!(
            SolveError::InvalidInput("weeks must be positive".into())
                .failure_code()
                .starts_with("invalid_input:")
        );
    }
}
