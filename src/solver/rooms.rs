//! Room eligibility filtering.

use crate::data::models::{Activity, Room};
use crate::solver::error::{InfeasibleReason, SolveError};

/// Whether `room` carries every feature in `required`.
fn room_has_features(room: &Room, required: &[String]) -> bool {
    required.iter().all(|feature| room.features.contains(feature))
}

/// Indices into `rooms` that satisfy the activity's required features.
///
/// An activity with no eligible room can never be placed, so this fails
/// before any model is built.
pub fn eligible_rooms(activity: &Activity, rooms: &[Room]) -> Result<Vec<usize>, SolveError> {
    let eligible: Vec<usize> = rooms
        .iter()
        .enumerate()
        .filter(|(_, room)| room_has_features(room, &activity.required_room_features))
        .map(|(index, _)| index)
        .collect();
    if eligible.is_empty() {
        return Err(SolveError::Infeasible(InfeasibleReason::NoEligibleRoom {
            activity_id: activity.id.clone(),
        }));
    }
    Ok(eligible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::models::{ActivityType, Frequency};

    fn room(id: &str, features: &[&str]) -> Room {
        Room {
            id: id.to_string(),
            institution_id: "inst".to_string(),
            name: id.to_string(),
            capacity: 30,
            features: features.iter().map(|f| f.to_string()).collect(),
        }
    }

    fn activity(required: &[&str]) -> Activity {
        Activity {
            id: "a1".to_string(),
            institution_id: "inst".to_string(),
            course_id: "c1".to_string(),
            activity_type: ActivityType::Course,
            duration_slots: 2,
            group_id: "g1".to_string(),
            professor_id: None,
            required_room_features: required.iter().map(|f| f.to_string()).collect(),
            frequency: Frequency::Weekly,
            selected_timeslot: None,
        }
    }

    #[test]
    fn no_requirements_matches_every_room() {
        let rooms = vec![room("r1", &[]), room("r2", &["projector"])];
        assert_eq!(eligible_rooms(&activity(&[]), &rooms).unwrap(), vec![0, 1]);
    }

    #[test]
    fn requirements_are_a_subset_check() {
        let rooms = vec![
            room("r1", &["projector"]),
            room("r2", &["projector", "whiteboard"]),
            room("r3", &["whiteboard"]),
        ];
        assert_eq!(
            eligible_rooms(&activity(&["projector"]), &rooms).unwrap(),
            vec![0, 1]
        );
    }

    #[test]
    fn no_eligible_room_is_infeasible() {
        let rooms = vec![room("r1", &[])];
        let err = eligible_rooms(&activity(&["projector"]), &rooms).unwrap_err();
        assert!(matches!(
            err,
            SolveError::Infeasible(InfeasibleReason::NoEligibleRoom { activity_id }) if activity_id == "a1"
        ));
    }
}
