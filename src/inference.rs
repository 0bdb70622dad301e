//! ONNX Runtime backends for the hand landmark detector and the gesture classifier.

use anyhow::{Context, Result};
use image::{imageops::FilterType, ImageBuffer, Rgb};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

use crate::error::GestureError;
use crate::landmarks::{HandCandidate, HandDetector};
use crate::predictor::GestureModel;
use crate::types::{FeatureVector, HandLandmarkSet, FEATURE_LEN, FEATURE_SHAPE};

const LANDMARK_INPUT: u32 = 224;

pub fn build_session(model_path: &Path, intra_threads: usize) -> Result<Session> {
    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(intra_threads)?
        .with_execution_providers([
            ort::execution_providers::CPUExecutionProvider::default().build(),
        ])?
        .commit_from_file(model_path)
        .with_context(|| format!("Failed to load ONNX model {}", model_path.display()))?;
    Ok(session)
}

fn load(model_path: &Path, intra_threads: usize) -> Result<Session, GestureError> {
    build_session(model_path, intra_threads).map_err(|e| GestureError::ModelLoad {
        path: model_path.display().to_string(),
        reason: format!("{:#}", e),
    })
}

/// Single-hand landmark regressor (MediaPipe hand landmark topology).
///
/// Input is a 224x224 RGB crop in NHWC layout scaled to 0..1. Output 0 carries
/// 63 values in input-pixel units, output 1 the hand presence score.
pub struct OnnxHandDetector {
    session: Session,
}

impl OnnxHandDetector {
    pub fn new(model_path: &Path, intra_threads: usize) -> Result<Self, GestureError> {
        info!(path = %model_path.display(), "loading hand landmark model");
        Ok(Self {
            session: load(model_path, intra_threads)?,
        })
    }

    fn preprocess(image: &ImageBuffer<Rgb<u8>, Vec<u8>>) -> Vec<f32> {
        let resized = image::imageops::resize(image, LANDMARK_INPUT, LANDMARK_INPUT, FilterType::Triangle);
        let mut input_data = Vec::with_capacity((LANDMARK_INPUT * LANDMARK_INPUT * 3) as usize);
        for pixel in resized.pixels() {
            input_data.push(pixel[0] as f32 / 255.0);
            input_data.push(pixel[1] as f32 / 255.0);
            input_data.push(pixel[2] as f32 / 255.0);
        }
        input_data
    }
}

/// Presence heads are exported either with or without the final sigmoid.
fn presence_probability(raw: f32) -> f32 {
    if (0.0..=1.0).contains(&raw) {
        raw
    } else {
        1.0 / (1.0 + (-raw).exp())
    }
}

impl HandDetector for OnnxHandDetector {
    fn detect(&mut self, image: &ImageBuffer<Rgb<u8>, Vec<u8>>) -> Result<Vec<HandCandidate>, GestureError> {
        let side = LANDMARK_INPUT as i64;
        let input = Tensor::from_array((vec![1, side, side, 3], Self::preprocess(image)))
            .map_err(|e| GestureError::Detection(e.to_string()))?;
        let outputs = self
            .session
            .run(ort::inputs![input])
            .map_err(|e| GestureError::Detection(e.to_string()))?;

        if outputs.len() < 2 {
            return Err(GestureError::Detection(format!(
                "expected landmark and presence outputs, model produced {}",
                outputs.len()
            )));
        }

        let (_, coords) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| GestureError::Detection(e.to_string()))?;
        let (_, presence) = outputs[1]
            .try_extract_tensor::<f32>()
            .map_err(|e| GestureError::Detection(e.to_string()))?;

        if coords.len() < FEATURE_LEN || presence.is_empty() {
            return Err(GestureError::Detection(format!(
                "landmark output has {} values",
                coords.len()
            )));
        }

        let scale = LANDMARK_INPUT as f32;
        let normalized: Vec<f32> = coords[..FEATURE_LEN].iter().map(|v| v / scale).collect();
        let score = presence_probability(presence[0]);
        debug!(score, "hand presence");

        Ok(vec![HandCandidate {
            landmarks: HandLandmarkSet::from_flat(&normalized)?,
            score,
        }])
    }
}

/// Gesture classifier taking a (1, 21, 3, 1) tensor and producing 15 probabilities.
///
/// `Session::run` needs exclusive access, so the session sits behind a mutex to keep
/// `predict` callable from several frame threads at once.
pub struct OnnxGestureModel {
    session: Mutex<Session>,
    output_width: Option<usize>,
}

impl OnnxGestureModel {
    pub fn new(model_path: &Path, intra_threads: usize) -> Result<Self, GestureError> {
        info!(path = %model_path.display(), "loading gesture classifier");
        let session = load(model_path, intra_threads)?;
        let output_width = session
            .outputs
            .first()
            .and_then(|o| o.output_type.tensor_shape())
            .and_then(|shape| shape.last().copied())
            .filter(|&w| w > 0)
            .map(|w| w as usize);
        debug!(?output_width, "classifier output width");
        Ok(Self {
            session: Mutex::new(session),
            output_width,
        })
    }
}

impl GestureModel for OnnxGestureModel {
    fn output_width(&self) -> Option<usize> {
        self.output_width
    }

    fn infer(&self, features: &FeatureVector) -> Result<Vec<f32>, GestureError> {
        let input = Tensor::from_array((FEATURE_SHAPE.to_vec(), features.to_vec()))
            .map_err(|e| GestureError::Inference(e.to_string()))?;
        let mut session = self
            .session
            .lock()
            .map_err(|_| GestureError::Inference("classifier session lock poisoned".into()))?;
        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| GestureError::Inference(e.to_string()))?;
        let (_, probs) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| GestureError::Inference(e.to_string()))?;
        Ok(probs.to_vec())
    }
}
