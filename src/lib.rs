//! Real-time hand gesture recognition: camera frames in, labelled gestures out.

pub mod annotate;
pub mod camera;
pub mod config;
pub mod error;
pub mod font;
pub mod inference;
pub mod knowledge;
pub mod labels;
pub mod landmarks;
pub mod log;
pub mod pipeline;
pub mod predictor;
pub mod quiz;
pub mod scoring;
pub mod session;
pub mod types;

pub use error::{GestureError, Result};
pub use labels::{GestureLabel, LABELS};
pub use types::{FeatureVector, Frame, HandLandmarkSet, Prediction};
