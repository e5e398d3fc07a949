use ndarray::{Array4, ArrayView4, Ix4};
use ort::{
    ep::CUDA as CUDAExecutionProvider,
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};
use parking_lot::Mutex;
use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("ONNX runtime error: {0}")]
    Session(#[from] ort::Error),
    #[error("Invalid output tensor shape: {0}")]
    OutputShape(#[from] ndarray::ShapeError),
    #[error("Model produced output of shape {0:?}, expected (1, 1, 512, 512)")]
    UnexpectedOutput(Vec<usize>),
}

/// Capability interface over the loaded segmentation model.
///
/// Implementations take a (1, 3, 512, 512) tensor and return a
/// (1, 1, 512, 512) logit map. Inference is deterministic and keeps no
/// request-to-request state. Implementations must be callable from multiple
/// request handlers at once; `OrtModel` serializes concurrent calls
/// internally.
pub trait SegmentationModel: Send + Sync + 'static {
    fn infer(&self, input: ArrayView4<f32>) -> Result<Array4<f32>, ModelError>;
}

pub struct OrtModel {
    session: Mutex<Session>,
    output_name: String,
}

impl OrtModel {
    pub fn new(model_path: &Path) -> Result<Self, ModelError> {
        ort::init()
            .with_execution_providers([CUDAExecutionProvider::default().build()])
            .commit();

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(ort::Error::from)?
            .commit_from_file(model_path)?;

        let output_name = session.outputs()[0].name().to_string();
        tracing::info!(
            "Loaded ONNX session from {:?} (output `{}`)",
            model_path,
            output_name
        );

        Ok(Self {
            session: Mutex::new(session),
            output_name,
        })
    }
}

impl SegmentationModel for OrtModel {
    fn infer(&self, input: ArrayView4<f32>) -> Result<Array4<f32>, ModelError> {
        // The ort session is not verified reentrant; calls are serialized.
        let mut session = self.session.lock();

        let owned_buffer;
        let input_view = if input.is_standard_layout() {
            input
        } else {
            owned_buffer = input.to_owned();
            owned_buffer.view()
        };

        let tensor_ref = TensorRef::from_array_view(input_view)?;
        let outputs = session.run(ort::inputs![tensor_ref])?;

        let (shape, data) = outputs[self.output_name.as_str()].try_extract_tensor::<f32>()?;
        let dims: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
        let logits = ndarray::ArrayD::from_shape_vec(shape.to_ixdyn(), data.to_vec())?
            .into_dimensionality::<Ix4>()
            .map_err(|_| ModelError::UnexpectedOutput(dims))?;

        if logits.shape() != [1, 1, 512, 512] {
            return Err(ModelError::UnexpectedOutput(logits.shape().to_vec()));
        }

        Ok(logits)
    }
}
