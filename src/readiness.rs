use crate::model::SegmentationModel;
use parking_lot::RwLock;
use std::sync::Arc;

/// Process-wide readiness state: whether a usable model is attached.
///
/// Set once at startup when the model finishes loading and cleared only
/// explicitly (hot swap, test teardown). Reads never block on inference;
/// callers clone the `Arc` out of the lock before running the model.
#[derive(Default)]
pub struct ModelState {
    model: RwLock<Option<Arc<dyn SegmentationModel>>>,
}

impl ModelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_ready(&self, model: Arc<dyn SegmentationModel>) {
        *self.model.write() = Some(model);
    }

    pub fn clear(&self) {
        *self.model.write() = None;
    }

    pub fn is_ready(&self) -> bool {
        self.model.read().is_some()
    }

    pub fn model(&self) -> Option<Arc<dyn SegmentationModel>> {
        self.model.read().clone()
    }
}
