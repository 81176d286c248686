//! Service lifecycle plumbing: registration, spawning, shutdown.

pub mod manager;
pub mod signals;
pub mod web;

pub use manager::{Service, ServiceManager};
