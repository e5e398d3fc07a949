use crate::{
    encode::{self, EncodeError},
    model::ModelError,
    postprocess,
    preprocess::{self, PreprocessError},
    readiness::ModelState,
    telemetry::Metrics,
};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("Failed to decode uploaded image: {0}")]
    Decode(#[from] PreprocessError),
    #[error("No model is currently loaded")]
    ModelUnavailable,
    #[error("Inference failed: {0}")]
    Inference(#[from] ModelError),
    #[error("Failed to encode mask: {0}")]
    Encode(#[from] EncodeError),
}

impl PredictError {
    /// Label used for the per-outcome prediction counter.
    pub fn outcome(&self) -> &'static str {
        match self {
            PredictError::Decode(_) => "decode_error",
            PredictError::ModelUnavailable => "model_unavailable",
            PredictError::Inference(_) => "inference_error",
            PredictError::Encode(_) => "encode_error",
        }
    }
}

pub struct Prediction {
    pub mask_base64: String,
    /// Wall-clock seconds from pipeline entry to postprocessing completion.
    pub latency_seconds: f64,
}

/// Orchestrates one request: decode → readiness check → infer → threshold →
/// encode. Metrics are updated exactly once per call, whatever the outcome.
pub struct InferencePipeline {
    model_state: Arc<ModelState>,
    metrics: Arc<Metrics>,
}

impl InferencePipeline {
    pub fn new(model_state: Arc<ModelState>, metrics: Arc<Metrics>) -> Self {
        Self {
            model_state,
            metrics,
        }
    }

    pub fn predict(&self, image_data: &[u8]) -> Result<Prediction, PredictError> {
        let result = self.run(image_data);

        match &result {
            Ok(prediction) => {
                self.metrics.record_outcome("success");
                self.metrics.record_latency(prediction.latency_seconds);
            }
            Err(err) => {
                self.metrics.record_outcome(err.outcome());
            }
        }

        result
    }

    fn run(&self, image_data: &[u8]) -> Result<Prediction, PredictError> {
        let started = Instant::now();

        let input = preprocess::decode_and_normalize(image_data)?;

        // Readiness is checked after decode but before any model call; an
        // unloaded model never receives a tensor.
        let model = self
            .model_state
            .model()
            .ok_or(PredictError::ModelUnavailable)?;

        let logits = model.infer(input.view())?;
        let mask = postprocess::to_binary_mask(&logits);
        let latency_seconds = started.elapsed().as_secs_f64();

        let mask_base64 = encode::mask_to_base64(&mask)?;

        Ok(Prediction {
            mask_base64,
            latency_seconds,
        })
    }
}
