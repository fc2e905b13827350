use std::sync::Arc;

use anyhow::Context;

use solarwatch_api::app::{self, poller::FleetPoller, services};
use solarwatch_api::config::ApiConfig;
use solarwatch_observability::TracingConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = ApiConfig::from_env();

    solarwatch_observability::tracing::init_with(
        &TracingConfig::default().with_format(config.log_format),
    );

    let services = Arc::new(services::build_services(&config).context("building services")?);

    let poller = config.poll_interval.map(|interval| {
        FleetPoller::new(services.clone(), interval, config.poller_session.clone())
    });
    let poller_shutdown = poller.as_ref().map(FleetPoller::shutdown_handle);
    let poller_task = poller.map(FleetPoller::start);

    let app = app::build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await
        .context("server error")?;

    if let Some(shutdown) = poller_shutdown {
        shutdown.notify_one();
    }
    if let Some(task) = poller_task {
        let _ = task.await;
    }
    Ok(())
}
