use crate::{pipeline::PredictError, preprocess::INPUT_SIZE, server::SharedState};
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum PredictRequestError {
    #[error("Missing `image` field in multipart form")]
    MissingImage,
    #[error("Failed to read multipart body: {0}")]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Pipeline(#[from] PredictError),
    #[error("Inference task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl PredictRequestError {
    fn status_code(&self) -> StatusCode {
        match self {
            PredictRequestError::MissingImage | PredictRequestError::Multipart(_) => {
                StatusCode::BAD_REQUEST
            }
            PredictRequestError::Pipeline(PredictError::ModelUnavailable) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            // Decode failures map to 500, matching the established contract
            // of this endpoint.
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PredictRequestError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Predict request failed: {}", self);
        }

        (
            status,
            Json(json!({ "status": "error", "message": self.to_string() })),
        )
            .into_response()
    }
}

#[derive(Serialize, Deserialize)]
pub struct PredictResponse {
    pub status: String,
    pub mask_base64: String,
    pub metadata: PredictMetadata,
}

#[derive(Serialize, Deserialize)]
pub struct PredictMetadata {
    pub output_size: [u32; 2],
    pub latency_seconds: f64,
}

#[instrument(skip(state, multipart))]
pub async fn predict(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<PredictResponse>, PredictRequestError> {
    let mut image_data: Option<Bytes> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("image") {
            image_data = Some(field.bytes().await?);
            break;
        }
    }
    let image_data = image_data.ok_or(PredictRequestError::MissingImage)?;

    // Decode and inference are CPU-bound; keep them off the async workers.
    let pipeline = state.pipeline.clone();
    let prediction = tokio::task::spawn_blocking(move || pipeline.predict(&image_data)).await??;

    Ok(Json(PredictResponse {
        status: "success".into(),
        mask_base64: prediction.mask_base64,
        metadata: PredictMetadata {
            output_size: [INPUT_SIZE, INPUT_SIZE],
            latency_seconds: prediction.latency_seconds,
        },
    }))
}
