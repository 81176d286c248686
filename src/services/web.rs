//! The HTTP control-plane service.

use async_trait::async_trait;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::info;

use crate::services::Service;
use crate::state::{AppState, ServiceStatus};
use crate::web::routes::create_router;

pub struct WebService {
    port: u16,
    state: AppState,
}

impl WebService {
    pub fn new(port: u16, state: AppState) -> Self {
        Self { port, state }
    }
}

#[async_trait]
impl Service for WebService {
    async fn run(self: Box<Self>, mut shutdown_rx: broadcast::Receiver<()>) -> anyhow::Result<()> {
        let router = create_router(self.state.clone());
        let listener = TcpListener::bind(("0.0.0.0", self.port)).await?;
        info!(port = self.port, "web service listening");
        self.state
            .service_statuses
            .set("api", ServiceStatus::Active);

        let result = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await;
        if let Err(e) = result {
            self.state.service_statuses.set("api", ServiceStatus::Error);
            return Err(e.into());
        }

        info!("web service stopped");
        Ok(())
    }
}
