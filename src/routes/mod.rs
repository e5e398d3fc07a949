mod health;
mod index;
mod metrics;
mod predict;

pub use health::healthcheck;
pub use index::index;
pub use metrics::metrics_handler;
pub use predict::{predict, PredictMetadata, PredictRequestError, PredictResponse};

use crate::server::SharedState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(healthcheck))
        .route("/metrics", get(metrics_handler))
        .route("/predict", post(predict))
}
