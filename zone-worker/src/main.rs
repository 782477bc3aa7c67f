use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use zone_worker::api::{create_router, ApiState};
use zone_worker::{config, port, WorkerAgent};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zone_worker=info".into()),
        )
        .init();

    let config = config::from_env().context("Failed to load configuration")?;
    config.validate()?;

    info!(
        zone = %config.zone,
        controller_url = %config.controller_url,
        seed = ?config.sim.seed,
        fault_injection = config.fault.is_some(),
        "Zone worker starting..."
    );

    let (listener, port) = match config.port {
        Some(port) => {
            let listener = TcpListener::bind((config.host.as_str(), port))
                .await
                .with_context(|| format!("Failed to bind port {}", port))?;
            (listener, port)
        }
        None => {
            let range = port::port_range(config.controller_port());
            port::bind_first_free(&config.host, range)
                .await
                .context("Failed to find a free worker port")?
        }
    };

    let advertised_url = config
        .advertised_url
        .clone()
        .unwrap_or_else(|| format!("http://localhost:{}", port));

    let agent = Arc::new(WorkerAgent::new(&config, advertised_url));
    info!(
        zone = %agent.zone(),
        instance_id = %agent.instance_id(),
        vehicles = agent.vehicle_count(),
        port = port,
        "Zone populated, worker API listening"
    );

    let router = create_router(ApiState {
        agent: Arc::clone(&agent),
    });
    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!(error = %e, "Worker API server error");
        }
    });

    // Fatal on exhaustion: exit non-zero
    agent
        .register()
        .await
        .context("Could not register with controller")?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl_c signal")?;
    info!(steps = agent.steps(), "Shutdown signal received");

    server_handle.abort();
    info!("Zone worker stopped");

    Ok(())
}
