//! Command-line arguments.

use clap::{Parser, ValueEnum};

/// Services this process can run. The control plane and worker plane are
/// deployed as separate invocations in production and run together in
/// development.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ServiceName {
    Api,
    Worker,
}

impl ServiceName {
    pub fn all() -> Vec<ServiceName> {
        vec![ServiceName::Api, ServiceName::Worker]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceName::Api => "api",
            ServiceName::Worker => "worker",
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TracingFormat {
    Pretty,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "timetabler", about = "University timetable generation service")]
pub struct Args {
    /// Which services to run in this process.
    #[arg(long, value_enum, value_delimiter = ',')]
    pub services: Option<Vec<ServiceName>>,

    /// Log output format.
    #[arg(long, value_enum, default_value = "pretty")]
    pub tracing: TracingFormat,
}

impl Args {
    /// Explicitly selected services, or all of them.
    pub fn enabled_services(&self) -> Vec<ServiceName> {
        match &self.services {
            Some(services) if !services.is_empty() => services.clone(),
            _ => ServiceName::all(),
        }
    }
}
