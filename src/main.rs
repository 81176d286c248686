use clap::Parser;
use std::process::ExitCode;
use timetabler::app::App;
use timetabler::cli::Args;
use timetabler::config::Config;
use timetabler::logging::setup_logging;
use tracing::info;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let args = Args::parse();
    let enabled_services = args.enabled_services();

    // Load config and setup logging before App::new() so startup logs are never silently dropped
    let early_config = {
        use figment::providers::Env;
        figment::Figment::new()
            .merge(Env::raw())
            .extract::<Config>()
            .expect("Failed to load config for logging setup")
    };
    setup_logging(&early_config, args.tracing);

    // Create and initialize the application
    let mut app = App::new().await.expect("Failed to initialize application");

    info!(
        enabled_services = ?enabled_services,
        "services configuration loaded"
    );

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = if cfg!(debug_assertions) {
            "development"
        } else {
            "production"
        },
        "starting timetabler"
    );

    // Setup services (web, worker)
    app.setup_services(&enabled_services)
        .expect("Failed to setup services");

    // Start all services and run the application
    app.start_services();
    app.run().await
}
