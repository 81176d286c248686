//! Entity records and their wire representations.
//!
//! These types are the single schema boundary for storage and the HTTP API:
//! documents are deserialised into them on every read and serialised from
//! them on every write. Identifiers are opaque UUID-shaped strings minted on
//! first insert and stored under Mongo's `_id` key. Enum serialisations are
//! load-bearing wire strings; changing them breaks stored data.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mints a fresh opaque identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Dimensions of an institution's weekly time grid.
///
/// Copied onto every schedule at creation so later institution edits never
/// retroactively change a generated schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeGridConfig {
    pub weeks: u32,
    pub days: u32,
    pub timeslots_per_day: u32,
    pub max_timeslots_per_day_per_group: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Institution {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub time_grid_config: TimeGridConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    #[serde(rename = "_id")]
    pub id: String,
    pub institution_id: String,
    pub name: String,
    pub capacity: u32,
    #[serde(default)]
    pub features: Vec<String>,
}

/// Groups form a forest per institution via `parent_group_id`. A group
/// conflicts with its ancestors and descendants: they share students.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    #[serde(rename = "_id")]
    pub id: String,
    pub institution_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_group_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Course,
    Seminar,
    Laboratory,
    Other,
}

/// Pure grouping entity; carries no scheduling semantics of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: String,
    pub institution_id: String,
    pub name: String,
    /// Optional metadata mapping activity types to a conventional duration.
    /// Never consulted by the solver.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub activities_duration_slots: BTreeMap<ActivityType, u32>,
}

/// How an activity's active weeks are patterned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// Runs every week.
    Weekly,
    /// Runs exactly one week; the solver picks which.
    Biweekly,
    /// Runs in week 0 only.
    BiweeklyOdd,
    /// Runs in week 1 only.
    BiweeklyEven,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::BiweeklyOdd => "biweekly_odd",
            Self::BiweeklyEven => "biweekly_even",
        }
    }
}

/// A manual pin reserving a start slot (and optionally the active weeks)
/// for an activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedTimeslot {
    pub start_timeslot: u32,
    #[serde(default)]
    pub active_weeks: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "_id")]
    pub id: String,
    pub institution_id: String,
    pub course_id: String,
    pub activity_type: ActivityType,
    pub duration_slots: u32,
    pub group_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub professor_id: Option<String>,
    #[serde(default)]
    pub required_room_features: Vec<String>,
    pub frequency: Frequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_timeslot: Option<SelectedTimeslot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Student,
    Professor,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub hashed_password: String,
    /// Institution id to the roles held there.
    #[serde(default)]
    pub user_roles: BTreeMap<String, Vec<UserRole>>,
    /// Groups a student belongs to.
    #[serde(default)]
    pub group_ids: Vec<String>,
}

impl User {
    /// Whether the user holds any role at the institution.
    pub fn is_member_of(&self, institution_id: &str) -> bool {
        self.user_roles.contains_key(institution_id)
    }

    /// Whether the user holds the admin role at the institution.
    pub fn is_admin_of(&self, institution_id: &str) -> bool {
        self.user_roles
            .get(institution_id)
            .is_some_and(|roles| roles.contains(&UserRole::Admin))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Draft,
    Running,
    Completed,
    Failed,
}

impl ScheduleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(rename = "_id")]
    pub id: String,
    pub institution_id: String,
    pub time_grid_config: TimeGridConfig,
    pub timestamp: DateTime<Utc>,
    pub status: ScheduleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Set on the `Draft` to `Running` transition; the reaper uses it to
    /// find runs abandoned by a crashed worker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

impl Schedule {
    /// A fresh draft for an institution, grid copied at creation time.
    pub fn draft(institution: &Institution) -> Self {
        Self {
            id: new_id(),
            institution_id: institution.id.clone(),
            time_grid_config: institution.time_grid_config.clone(),
            timestamp: Utc::now(),
            status: ScheduleStatus::Draft,
            error_message: None,
            started_at: None,
        }
    }
}

/// One placement of a completed schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledActivity {
    #[serde(rename = "_id")]
    pub id: String,
    pub schedule_id: String,
    pub activity_id: String,
    pub room_id: String,
    pub start_timeslot: u32,
    pub active_weeks: Vec<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_wire_strings_are_exact() {
        assert_eq!(
            serde_json::to_string(&Frequency::BiweeklyOdd).unwrap(),
            "\"biweekly_odd\""
        );
        assert_eq!(
            serde_json::to_string(&ScheduleStatus::Draft).unwrap(),
            "\"draft\""
        );
        assert_eq!(
            serde_json::to_string(&ActivityType::Laboratory).unwrap(),
            "\"laboratory\""
        );
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), "\"admin\"");
        let parsed: Frequency = serde_json::from_str("\"biweekly_even\"").unwrap();
        assert_eq!(parsed, Frequency::BiweeklyEven);
    }

    #[test]
    fn id_field_maps_to_underscore_id() {
        let room = Room {
            id: "r1".to_string(),
            institution_id: "i1".to_string(),
            name: "Lab".to_string(),
            capacity: 20,
            features: vec!["projector".to_string()],
        };
        let value = serde_json::to_value(&room).unwrap();
        assert_eq!(value["_id"], "r1");
        assert!(value.get("id").is_none());
    }

    #[test]
    fn role_checks_follow_the_role_map() {
        let mut user_roles = BTreeMap::new();
        user_roles.insert("i1".to_string(), vec![UserRole::Professor]);
        user_roles.insert("i2".to_string(), vec![UserRole::Admin, UserRole::Student]);
        let user = User {
            id: "u1".to_string(),
            name: "n".to_string(),
            email: "e@example.com".to_string(),
            hashed_password: String::new(),
            user_roles,
            group_ids: Vec::new(),
        };
        assert!(user.is_member_of("i1"));
        assert!(!user.is_admin_of("i1"));
        assert!(user.is_admin_of("i2"));
        assert!(!user.is_member_of("i3"));
    }
}
