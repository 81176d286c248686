//! Storage models and collection queries.

pub mod activities;
mod context;
pub mod courses;
pub mod groups;
pub mod institutions;
pub mod jobs;
pub mod models;
pub mod rooms;
pub mod scheduled_activities;
pub mod schedules;
pub mod users;

pub use context::DbContext;
