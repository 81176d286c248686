//! Application assembly: configuration, storage, state, services.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use figment::{Figment, providers::Env};
use tracing::{error, info};

use crate::cli::ServiceName;
use crate::config::Config;
use crate::data::DbContext;
use crate::services::manager::ServiceManager;
use crate::services::web::WebService;
use crate::solver::SolverSettings;
use crate::state::AppState;
use crate::web::auth::AuthKeys;
use crate::worker::WorkerService;

/// Main application struct containing all necessary components
pub struct App {
    config: Config,
    db: DbContext,
    app_state: AppState,
    service_manager: ServiceManager,
}

impl App {
    /// Create a new App instance with all necessary components initialized
    pub async fn new() -> Result<Self, anyhow::Error> {
        let config: Config = Figment::new()
            .merge(Env::raw())
            .extract()
            .context("Failed to load config")?;

        let db = DbContext::connect(&config.mongodb_uri, &config.db_name)
            .await
            .context("Failed to create storage client")?;
        db.ping().await.context("Failed to reach storage")?;
        info!(db_name = %config.db_name, "storage connection established");

        db.ensure_indexes()
            .await
            .context("Failed to ensure storage indexes")?;

        let auth = AuthKeys::new(
            &config.secret_key,
            &config.default_algorithm,
            config.expires_delta,
        )
        .context("Failed to build auth keys")?;

        let solver_settings = SolverSettings {
            time_limit: Duration::from_secs(config.solver_time_limit),
            workers: config.solver_workers,
        };

        let app_state = AppState::new(db.clone(), auth, solver_settings);

        Ok(App {
            config,
            db,
            app_state,
            service_manager: ServiceManager::new(),
        })
    }

    /// Setup and register services based on enabled service list
    pub fn setup_services(&mut self, services: &[ServiceName]) -> Result<(), anyhow::Error> {
        if services.contains(&ServiceName::Api) {
            let web_service = Box::new(WebService::new(self.config.port, self.app_state.clone()));
            self.service_manager
                .register_service(ServiceName::Api.as_str(), web_service);
        }

        if services.contains(&ServiceName::Worker) {
            let worker_service = Box::new(WorkerService::new(
                self.db.clone(),
                self.app_state.solver_settings,
                self.config.worker_count,
                self.app_state.service_statuses.clone(),
            ));
            self.service_manager
                .register_service(ServiceName::Worker.as_str(), worker_service);
        }

        if !self.service_manager.has_services() {
            error!("No services enabled. Cannot start application.");
            return Err(anyhow::anyhow!("No services enabled"));
        }

        Ok(())
    }

    /// Start all registered services
    pub fn start_services(&mut self) {
        self.service_manager.spawn_all();
    }

    /// Run the application until a shutdown signal, then tear down.
    pub async fn run(self) -> ExitCode {
        use crate::services::signals::handle_shutdown_signals;
        let exit_code =
            handle_shutdown_signals(self.service_manager, self.config.shutdown_timeout).await;
        self.db.close().await;
        exit_code
    }
}
