use crate::server::SharedState;
use axum::{extract::State, response::IntoResponse};

pub async fn metrics_handler(State(state): State<SharedState>) -> impl IntoResponse {
    // The gauge mirrors readiness at scrape time.
    state
        .metrics
        .set_model_loaded(state.model_state.is_ready());

    state.metrics.render().into_response()
}
