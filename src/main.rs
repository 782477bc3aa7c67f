use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use trafficgrid::api::{create_router, AppState};
use trafficgrid::broadcast::Broadcaster;
use trafficgrid::config;
use trafficgrid::coordinator::{HttpStepTransport, StepCoordinator};
use trafficgrid::state::ControllerState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trafficgrid=info".into()),
        )
        .init();

    info!("Traffic grid controller starting...");

    let config = config::from_env().context("Failed to load configuration")?;

    let state = Arc::new(ControllerState::new(config.broadcast.history_capacity));
    let broadcaster = Broadcaster::new(
        Arc::clone(&state),
        Duration::from_millis(config.broadcast.interval_ms),
    );

    // HTTP API
    let router = create_router(AppState {
        state: Arc::clone(&state),
        broadcaster,
    });
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind controller API on {}", addr))?;
    info!(addr = %addr, "Controller API listening");

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!(error = %e, "Controller API server error");
        }
    });

    // Step coordinator
    let headless = config.coordinator.headless;
    let coordinator = StepCoordinator::new(
        Arc::clone(&state),
        Arc::new(HttpStepTransport::new()),
        config.coordinator.clone(),
    );
    let mut coordinator_handle = tokio::spawn(async move { coordinator.run().await });

    tokio::select! {
        joined = &mut coordinator_handle => {
            let summary = joined
                .context("Coordinator task panicked")?
                .context("Simulation could not start")?;

            if headless {
                match summary.mean_cycle {
                    Some(mean) => info!(
                        cycles = summary.cycles,
                        avg_step_time = %format!("{:.4}", mean.as_secs_f64()),
                        "Performance metrics"
                    ),
                    None => info!("Performance metrics: no cycles recorded"),
                }
                server_handle.abort();
                return Ok(());
            }

            // Keep serving the final state until interrupted
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for ctrl_c signal")?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for ctrl_c signal")?;
            coordinator_handle.abort();
        }
    }

    info!("Shutdown signal received");
    server_handle.abort();
    info!("Traffic grid controller stopped");

    Ok(())
}
