use crate::config::Config;
use crate::model::OrtModel;
use crate::pipeline::InferencePipeline;
use crate::readiness::ModelState;
use crate::server::{HttpServer, SharedState};
use crate::telemetry::Metrics;

use std::{error::Error, sync::Arc};
use tokio::{signal, sync::broadcast};

pub async fn start_app(config: Config) -> Result<(), Box<dyn Error>> {
    let metrics = Arc::new(Metrics::new());
    let model_state = Arc::new(ModelState::new());

    // A missing or broken artifact keeps the service up but unready; /health
    // reports 503 until a model is attached.
    match OrtModel::new(&config.model.get_model_path()) {
        Ok(model) => {
            model_state.set_ready(Arc::new(model));
            tracing::info!("Model loaded from {:?}", config.model.get_model_path());
        }
        Err(e) => {
            tracing::error!(
                "Failed to load model from {:?}, starting unready: {:?}",
                config.model.get_model_path(),
                e
            );
        }
    }
    metrics.set_model_loaded(model_state.is_ready());

    let pipeline = Arc::new(InferencePipeline::new(
        model_state.clone(),
        metrics.clone(),
    ));

    let state = SharedState {
        pipeline,
        model_state,
        metrics,
    };

    let server = HttpServer::new(state, &config).await?;

    let (shutdown_tx, _) = broadcast::channel(1);
    let server_shutdown_rx = shutdown_tx.subscribe();

    let server_handle = server.run(server_shutdown_rx).await?;

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown.");

    let _ = shutdown_tx.send(());
    let _ = server_handle.await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
