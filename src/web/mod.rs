//! Web API module for the control plane.

pub mod activities;
pub mod auth;
pub mod courses;
pub mod error;
pub mod groups;
pub mod institutions;
pub mod middleware;
pub mod rooms;
pub mod routes;
pub mod schedules;
pub mod status;
pub mod users;

pub use routes::*;
