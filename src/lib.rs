//! University timetable generation service.
//!
//! Two planes share this crate: an axum control plane exposing entity CRUD
//! and schedule views, and a worker plane that consumes generation jobs and
//! runs the constraint-solver core in [`solver`].

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod logging;
pub mod services;
pub mod solver;
pub mod state;
pub mod web;
pub mod worker;
