//! Feature vector to labelled prediction.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::{GestureError, Result};
use crate::labels::{GestureLabel, LABEL_COUNT};
use crate::types::{FeatureVector, Prediction};

/// A loaded classifier. Read-only after construction.
pub trait GestureModel: Send + Sync {
    /// Width of the output vector as declared by the model, when it declares one.
    fn output_width(&self) -> Option<usize>;

    /// Forward pass returning one probability per label.
    fn infer(&self, features: &FeatureVector) -> Result<Vec<f32>>;
}

enum ModelState {
    Ready(Arc<dyn GestureModel>),
    Unavailable(String),
}

/// Maps model output positions onto the label table.
///
/// Cloning is cheap and clones share the model, so one predictor can serve several
/// frame threads.
#[derive(Clone)]
pub struct GesturePredictor {
    state: Arc<ModelState>,
}

impl GesturePredictor {
    /// Wraps a loaded model after checking its output width against the label table.
    pub fn new(model: Arc<dyn GestureModel>) -> Result<Self> {
        match model.output_width() {
            Some(width) if width != LABEL_COUNT => {
                return Err(GestureError::LabelMismatch {
                    expected: LABEL_COUNT,
                    actual: width,
                })
            }
            Some(_) => {}
            None => warn!("classifier does not declare its output width, checking per call"),
        }
        info!(labels = LABEL_COUNT, "gesture predictor ready");
        Ok(Self {
            state: Arc::new(ModelState::Ready(model)),
        })
    }

    /// A predictor whose model failed to load. Every `predict` fails fast.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        error!(%reason, "gesture predictor unavailable");
        Self {
            state: Arc::new(ModelState::Unavailable(reason)),
        }
    }

    /// Runs `load` once; a failure yields an unavailable predictor instead of an error.
    pub fn load_or_unavailable<F>(load: F) -> Self
    where
        F: FnOnce() -> Result<Arc<dyn GestureModel>>,
    {
        match load().and_then(Self::new) {
            Ok(p) => p,
            Err(e) => Self::unavailable(e.to_string()),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(*self.state, ModelState::Ready(_))
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction> {
        let model = match &*self.state {
            ModelState::Ready(m) => m,
            ModelState::Unavailable(reason) => {
                return Err(GestureError::ModelUnavailable(reason.clone()))
            }
        };
        let probs = model.infer(features)?;
        decode(&probs)
    }

    /// Accepts raw values; anything but 63 of them is rejected before inference.
    pub fn predict_slice(&self, values: &[f32]) -> Result<Prediction> {
        let features = FeatureVector::from_slice(values)?;
        self.predict(&features)
    }
}

/// Argmax over the distribution, failing closed on degenerate output.
pub fn decode(probs: &[f32]) -> Result<Prediction> {
    if probs.is_empty() || probs.iter().any(|p| !p.is_finite()) || probs.iter().all(|&p| p == 0.0) {
        warn!(len = probs.len(), "degenerate classifier output");
        return Ok(Prediction::unknown());
    }
    if probs.len() != LABEL_COUNT {
        return Err(GestureError::LabelMismatch {
            expected: LABEL_COUNT,
            actual: probs.len(),
        });
    }

    let probs = if probs.iter().any(|&p| !(0.0..=1.0).contains(&p)) {
        softmax(probs)
    } else {
        probs.to_vec()
    };

    // first maximum wins, matching numpy argmax
    let (index, confidence) = probs
        .iter()
        .copied()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, p)| if p > best.1 { (i, p) } else { best });

    match GestureLabel::from_index(index) {
        Some(label) => Ok(Prediction::new(label, confidence.clamp(0.0, 1.0))),
        None => Ok(Prediction::unknown()),
    }
}

/// Classifiers exported without their final activation emit logits.
fn softmax(logits: &[f32]) -> Vec<f32> {
    let max_logit = logits.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max_logit).exp()).collect();
    let sum_exps: f32 = exps.iter().sum();
    exps.iter().map(|&x| x / sum_exps).collect()
}
