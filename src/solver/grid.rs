//! Linear slot arithmetic over a single week of the time grid.
//!
//! Slots are indexed `day * timeslots_per_day + slot_in_day`, so an index
//! carries both its day and its position within the day. Activities occupy a
//! contiguous run of slots and never straddle a day boundary.

use crate::data::models::TimeGridConfig;
use crate::solver::error::SolveError;

/// Validated view of a schedule's [`TimeGridConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeGrid {
    pub weeks: u32,
    pub days: u32,
    pub timeslots_per_day: u32,
    pub max_timeslots_per_day_per_group: u32,
}

impl TimeGrid {
    /// Checks that every grid dimension is positive.
    pub fn from_config(config: &TimeGridConfig) -> Result<Self, SolveError> {
        if config.weeks == 0
            || config.days == 0
            || config.timeslots_per_day == 0
            || config.max_timeslots_per_day_per_group == 0
        {
            return Err(SolveError::InvalidInput(
                "time grid dimensions must be positive".to_string(),
            ));
        }
        Ok(Self {
            weeks: config.weeks,
            days: config.days,
            timeslots_per_day: config.timeslots_per_day,
            max_timeslots_per_day_per_group: config.max_timeslots_per_day_per_group,
        })
    }

    /// Total slots in one week.
    pub fn slots_per_week(&self) -> u32 {
        self.days * self.timeslots_per_day
    }

    /// Linear index of `slot_in_day` on `day`.
    pub fn slot_index(&self, day: u32, slot_in_day: u32) -> u32 {
        day * self.timeslots_per_day + slot_in_day
    }

    /// Day that a linear slot index falls on.
    pub fn day_of_slot(&self, slot: u32) -> u32 {
        slot / self.timeslots_per_day
    }

    /// Every legal start index for an activity of `duration` slots.
    ///
    /// Starts are enumerated per day, so a returned start plus its covered
    /// run always stays within one day.
    pub fn allowed_starts(&self, duration: u32) -> Result<Vec<u32>, SolveError> {
        if duration == 0 {
            return Err(SolveError::InvalidInput(
                "activity duration must be at least one slot".to_string(),
            ));
        }
        if duration > self.timeslots_per_day {
            return Err(SolveError::InvalidInput(format!(
                "activity duration {duration} exceeds {} timeslots per day",
                self.timeslots_per_day
            )));
        }
        let mut starts = Vec::with_capacity((self.days * (self.timeslots_per_day - duration + 1)) as usize);
        for day in 0..self.days {
            for slot_in_day in 0..=(self.timeslots_per_day - duration) {
                starts.push(self.slot_index(day, slot_in_day));
            }
        }
        Ok(starts)
    }
}

/// Slots occupied by an activity of `duration` slots starting at `start`.
pub fn covered_slots(start: u32, duration: u32) -> impl Iterator<Item = u32> {
    start..start + duration
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(weeks: u32, days: u32, timeslots_per_day: u32) -> TimeGrid {
        TimeGrid {
            weeks,
            days,
            timeslots_per_day,
            max_timeslots_per_day_per_group: timeslots_per_day,
        }
    }

    #[test]
    fn slot_index_round_trips_through_day() {
        let g = grid(1, 5, 6);
        assert_eq!(g.slot_index(0, 0), 0);
        assert_eq!(g.slot_index(2, 3), 15);
        assert_eq!(g.day_of_slot(15), 2);
        assert_eq!(g.slots_per_week(), 30);
    }

    #[test]
    fn allowed_starts_stay_within_a_day() {
        let g = grid(1, 2, 4);
        let starts = g.allowed_starts(2).unwrap();
        assert_eq!(starts, vec![0, 1, 2, 4, 5, 6]);
        for &s in &starts {
            let last = s + 1;
            assert_eq!(g.day_of_slot(s), g.day_of_slot(last));
        }
    }

    #[test]
    fn allowed_starts_full_day_activity() {
        let g = grid(1, 3, 2);
        assert_eq!(g.allowed_starts(2).unwrap(), vec![0, 2, 4]);
    }

    #[test]
    fn allowed_starts_rejects_oversized_duration() {
        let g = grid(1, 2, 4);
        assert!(matches!(
            g.allowed_starts(5),
            Err(SolveError::InvalidInput(_))
        ));
        assert!(matches!(
            g.allowed_starts(0),
            Err(SolveError::InvalidInput(_))
        ));
    }

    #[test]
    fn covered_slots_are_contiguous() {
        let covered: Vec<u32> = covered_slots(3, 2).collect();
        assert_eq!(covered, vec![3, 4]);
    }

    #[test]
    fn from_config_rejects_zero_dimensions() {
        let config = TimeGridConfig {
            weeks: 0,
            days: 5,
            timeslots_per_day: 6,
            max_timeslots_per_day_per_group: 4,
        };
        assert!(matches!(
            TimeGrid::from_config(&config),
            Err(SolveError::InvalidInput(_))
        ));
    }
}
