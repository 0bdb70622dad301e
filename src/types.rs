use image::{ImageBuffer, Rgb};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{GestureError, Result};
use crate::labels::GestureLabel;

pub type RgbFrame = ImageBuffer<Rgb<u8>, Vec<u8>>;

pub const LANDMARK_COUNT: usize = 21;
pub const FEATURE_LEN: usize = LANDMARK_COUNT * 3;

/// Tensor shape the classifier consumes: batch, landmark, coordinate, channel.
pub const FEATURE_SHAPE: [i64; 4] = [1, LANDMARK_COUNT as i64, 3, 1];

/// Represents a single 3D point
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

/// Byte order of the three colour channels in a raw frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

/// One video frame. Pixels are stored as captured; `to_rgb` normalizes the order.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbFrame,
    pub order: ChannelOrder,
}

impl Frame {
    pub fn rgb(image: RgbFrame) -> Self {
        Self {
            image,
            order: ChannelOrder::Rgb,
        }
    }

    /// Wraps a packed `height * width * 3` buffer.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>, order: ChannelOrder) -> Result<Self> {
        let got = data.len();
        let image = ImageBuffer::from_raw(width, height, data).ok_or_else(|| {
            GestureError::FrameDecode(format!(
                "{}x{} frame needs {} bytes, got {}",
                width,
                height,
                width as usize * height as usize * 3,
                got
            ))
        })?;
        Ok(Self { image, order })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn to_rgb(&self) -> RgbFrame {
        match self.order {
            ChannelOrder::Rgb => self.image.clone(),
            ChannelOrder::Bgr => {
                let mut out = self.image.clone();
                for p in out.pixels_mut() {
                    p.0.swap(0, 2);
                }
                out
            }
        }
    }
}

/// The 21 landmarks of one detected hand, in the standard hand-model order.
///
/// x and y are normalized to the frame (0..1), z is depth relative to the wrist.
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarkSet {
    points: [Point3D; LANDMARK_COUNT],
}

impl HandLandmarkSet {
    pub fn new(points: [Point3D; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Builds a set from 63 interleaved x, y, z values. Non-finite values are a
    /// detection failure.
    pub fn from_flat(values: &[f32]) -> Result<Self> {
        if values.len() != FEATURE_LEN {
            return Err(GestureError::FeatureShape(values.len()));
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(GestureError::Detection(format!(
                "landmark value {} is {}",
                i, values[i]
            )));
        }
        let mut points = [Point3D::default(); LANDMARK_COUNT];
        for (i, p) in points.iter_mut().enumerate() {
            *p = Point3D {
                x: values[i * 3],
                y: values[i * 3 + 1],
                z: values[i * 3 + 2],
            };
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point3D; LANDMARK_COUNT] {
        &self.points
    }

    /// Bounding box of the x/y coordinates, in normalized units.
    pub fn bounds(&self) -> Rect {
        let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
        let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        for p in &self.points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    pub fn features(&self) -> FeatureVector {
        let mut values = [0.0f32; FEATURE_LEN];
        for (i, p) in self.points.iter().enumerate() {
            values[i * 3] = p.x;
            values[i * 3 + 1] = p.y;
            values[i * 3 + 2] = p.z;
        }
        FeatureVector(values)
    }
}

/// Classifier input. Always exactly 63 values laid out as (1, 21, 3, 1).
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector([f32; FEATURE_LEN]);

impl FeatureVector {
    pub fn from_slice(values: &[f32]) -> Result<Self> {
        let arr: [f32; FEATURE_LEN] = values
            .try_into()
            .map_err(|_| GestureError::FeatureShape(values.len()))?;
        Ok(Self(arr))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.0.to_vec()
    }
}

/// Top-1 classifier output. `label == None` is the fail-closed "unknown" result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: Option<GestureLabel>,
    pub confidence: f32,
}

impl Prediction {
    pub fn new(label: GestureLabel, confidence: f32) -> Self {
        Self {
            label: Some(label),
            confidence,
        }
    }

    pub fn unknown() -> Self {
        Self {
            label: None,
            confidence: 0.0,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.label.is_none()
    }

    pub fn is_confident(&self, threshold: f32) -> bool {
        self.label.is_some() && self.confidence > threshold
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label {
            Some(label) => write!(f, "{} ({:.2}%)", label, self.confidence * 100.0),
            None => write!(f, "Unknown ({:.2}%)", self.confidence * 100.0),
        }
    }
}
