//! End to end through the public API with a scripted detector and a fixed classifier,
//! so no model files or camera are needed.

use image::{ImageBuffer, Rgb, RgbImage};
use std::sync::Arc;
use std::time::{Duration, Instant};

use signsight::annotate::FrameAnnotator;
use signsight::config::{AppConfig, DetectionConfig};
use signsight::knowledge::{KnowledgeMatcher, FALLBACK_RESPONSE};
use signsight::landmarks::{HandCandidate, HandDetector, LandmarkExtractor};
use signsight::log::{parse_csv, GestureObservation};
use signsight::pipeline::{FrameSource, GesturePipeline, RecognitionLoop, StopSignal};
use signsight::predictor::{GestureModel, GesturePredictor};
use signsight::scoring::score;
use signsight::session::RecognitionSession;
use signsight::types::{ChannelOrder, FEATURE_LEN};
use signsight::{FeatureVector, Frame, GestureError, GestureLabel, HandLandmarkSet, Result, LABELS};

/// Finds a hand on every other call. A miss while tracking falls back to a full-frame
/// search within the same frame, which then hits.
struct AlternatingDetector {
    calls: usize,
}

impl HandDetector for AlternatingDetector {
    fn detect(&mut self, _image: &RgbImage) -> Result<Vec<HandCandidate>> {
        self.calls += 1;
        if self.calls % 2 == 0 {
            return Ok(vec![]);
        }
        let values: Vec<f32> = (0..FEATURE_LEN).map(|i| 0.35 + (i % 3) as f32 * 0.1).collect();
        Ok(vec![HandCandidate {
            landmarks: HandLandmarkSet::from_flat(&values)?,
            score: 0.97,
        }])
    }
}

/// Picks the label from the first feature value so different hands give different labels.
struct FirstValueModel;

impl GestureModel for FirstValueModel {
    fn output_width(&self) -> Option<usize> {
        Some(LABELS.len())
    }

    fn infer(&self, features: &FeatureVector) -> Result<Vec<f32>> {
        let index = ((features.as_slice()[0] * 10.0) as usize).min(LABELS.len() - 1);
        let mut probs = vec![0.01; LABELS.len()];
        probs[index] = 0.86;
        Ok(probs)
    }
}

struct Clip {
    remaining: usize,
}

impl FrameSource for Clip {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        let raw: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(64, 48, Rgb([90, 60, 30]));
        Ok(Some(Frame::from_raw(64, 48, raw.into_raw(), ChannelOrder::Bgr)?))
    }
}

fn pipeline() -> GesturePipeline<AlternatingDetector> {
    let extractor = LandmarkExtractor::new(AlternatingDetector { calls: 0 }, DetectionConfig::default());
    let predictor = GesturePredictor::new(Arc::new(FirstValueModel)).unwrap();
    GesturePipeline::new(extractor, predictor)
}

#[test]
fn live_session_confirms_and_exports() {
    let config = AppConfig::default();
    let mut session = RecognitionSession::new(config.recognition.clone());
    let annotator = FrameAnnotator::new(&config.ui);
    let mut lp = RecognitionLoop::new(pipeline(), config.recognition.max_consecutive_failures);

    let mut hands = 0;
    let stats = lp
        .run(&mut Clip { remaining: 6 }, &StopSignal::new(), |result| {
            let shown = annotator.annotate(&result.frame, result.landmarks.as_ref(), result.prediction.as_ref());
            assert_eq!(shown.width(), 64);

            session.observe(result.prediction);
            let p = result.prediction.unwrap();
            hands += 1;
            assert_eq!(p.label, Some(GestureLabel::Help));
            assert_eq!(session.analysis().unwrap().to_string().lines().count(), 4);
            session.confirm_current().unwrap();
        })
        .unwrap();

    assert_eq!(stats.processed, 6);
    assert_eq!(stats.skipped, 0);
    assert_eq!(hands, 6);

    let csv = session.confirmed().export_csv().unwrap();
    let rows: Vec<GestureObservation> = parse_csv(&csv).unwrap();
    assert_eq!(rows.len(), session.confirmed().len());
    assert!(rows.iter().all(|r| r.gesture == GestureLabel::Help));
    assert!(rows.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[test]
fn missing_classifier_fails_fast() {
    let predictor = GesturePredictor::load_or_unavailable(|| {
        Err(GestureError::ModelLoad {
            path: "nowhere.onnx".into(),
            reason: "no such file".into(),
        })
    });
    let err = predictor.predict_slice(&[0.0; FEATURE_LEN]).unwrap_err();
    assert!(matches!(err, GestureError::ModelUnavailable(_)));
}

#[test]
fn scoring_and_knowledge_examples() {
    let t = Instant::now();
    assert_eq!(score(t, t + Duration::from_secs(5), 8, 8), 950);
    assert_eq!(score(t, t + Duration::from_secs(100), 1, 8), 0);

    let kb = KnowledgeMatcher::default();
    assert!(kb.answer("what is sign language").starts_with("Sign language is a complete"));
    assert_eq!(kb.answer("xyz completely unrelated"), FALLBACK_RESPONSE);
}
