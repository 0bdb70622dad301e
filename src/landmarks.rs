//! Frame to hand landmarks.

use image::{ImageBuffer, Rgb};
use tracing::{debug, trace};

use crate::config::DetectionConfig;
use crate::error::{GestureError, Result};
use crate::types::{Frame, HandLandmarkSet, Point3D, Rect, LANDMARK_COUNT};

/// Padding added around the previous hand when cropping for the next frame.
const TRACKING_PAD: f32 = 0.25;

/// One hand found by a detector, coordinates normalized to the image it was given.
#[derive(Debug, Clone)]
pub struct HandCandidate {
    pub landmarks: HandLandmarkSet,
    pub score: f32,
}

/// External hand-tracking capability. Receives RGB pixels, returns hands best first.
pub trait HandDetector: Send {
    fn detect(&mut self, image: &ImageBuffer<Rgb<u8>, Vec<u8>>) -> Result<Vec<HandCandidate>>;
}

/// Wraps a [`HandDetector`] with single-hand detection/tracking thresholds.
///
/// While a hand is tracked, the next frame is searched only around its last
/// position and accepted against `min_tracking_confidence`; otherwise the full frame
/// is searched and accepted against `min_detection_confidence`.
pub struct LandmarkExtractor<D: HandDetector> {
    detector: D,
    config: DetectionConfig,
    tracked: Option<Rect>,
}

impl<D: HandDetector> LandmarkExtractor<D> {
    pub fn new(detector: D, config: DetectionConfig) -> Self {
        Self {
            detector,
            config: config.single_hand(),
            tracked: None,
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.tracked.is_some()
    }

    /// `Ok(None)` means no hand in view. Errors are per-frame and recoverable.
    pub fn extract(&mut self, frame: &Frame) -> Result<Option<HandLandmarkSet>> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(GestureError::FrameDecode("empty frame".into()));
        }
        let rgb = frame.to_rgb();

        if let Some(roi) = self.tracked.take() {
            if let Some(hand) = self.track(&rgb, roi)? {
                return Ok(Some(hand));
            }
            debug!("lost tracked hand, falling back to detection");
        }

        let best = self.detector.detect(&rgb)?.into_iter().next();
        match best {
            Some(c) if c.score >= self.config.min_detection_confidence => {
                self.tracked = Some(padded_roi(&c.landmarks));
                Ok(Some(c.landmarks))
            }
            Some(c) => {
                trace!(score = c.score, "hand below detection threshold");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn track(&mut self, rgb: &ImageBuffer<Rgb<u8>, Vec<u8>>, roi: Rect) -> Result<Option<HandLandmarkSet>> {
        let (w, h) = (rgb.width() as f32, rgb.height() as f32);
        let x = (roi.x * w) as u32;
        let y = (roi.y * h) as u32;
        let cw = ((roi.width * w) as u32).max(1);
        let ch = ((roi.height * h) as u32).max(1);
        let crop = image::imageops::crop_imm(rgb, x, y, cw, ch).to_image();

        // crop_imm clamps to the image, so recompute the region actually used
        let used = Rect::new(
            x as f32 / w,
            y as f32 / h,
            crop.width() as f32 / w,
            crop.height() as f32 / h,
        );

        let best = self.detector.detect(&crop)?.into_iter().next();
        match best {
            Some(c) if c.score >= self.config.min_tracking_confidence => {
                let hand = to_frame_space(&c.landmarks, used);
                self.tracked = Some(padded_roi(&hand));
                Ok(Some(hand))
            }
            _ => Ok(None),
        }
    }
}

/// Maps landmarks normalized to `roi` back to whole-frame normalized coordinates.
fn to_frame_space(hand: &HandLandmarkSet, roi: Rect) -> HandLandmarkSet {
    let mut points = [Point3D::default(); LANDMARK_COUNT];
    for (out, p) in points.iter_mut().zip(hand.points()) {
        *out = Point3D {
            x: roi.x + p.x * roi.width,
            y: roi.y + p.y * roi.height,
            z: p.z * roi.width,
        };
    }
    HandLandmarkSet::new(points)
}

fn padded_roi(hand: &HandLandmarkSet) -> Rect {
    let b = hand.bounds();
    let side = b.width.max(b.height) * (1.0 + 2.0 * TRACKING_PAD);
    let cx = b.x + b.width / 2.0;
    let cy = b.y + b.height / 2.0;

    // Clip to frame
    let x = (cx - side / 2.0).clamp(0.0, 1.0);
    let y = (cy - side / 2.0).clamp(0.0, 1.0);
    let w = side.min(1.0 - x);
    let h = side.min(1.0 - y);
    Rect::new(x, y, w, h)
}
