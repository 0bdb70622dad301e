use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{GestureError, Result};
use crate::landmarks::{HandDetector, LandmarkExtractor};
use crate::predictor::GesturePredictor;
use crate::types::{Frame, HandLandmarkSet, Prediction};

/// Anything that yields video frames. `Ok(None)` means the source is exhausted.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// Shared flag checked between frames.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What one frame produced. `landmarks == None` means no hand was in view.
#[derive(Debug, Clone)]
pub struct FrameResult {
    pub index: u64,
    pub frame: Frame,
    pub landmarks: Option<HandLandmarkSet>,
    pub prediction: Option<Prediction>,
}

pub trait Pipeline {
    fn name(&self) -> String;
    fn process(&mut self, frame: Frame) -> Result<FrameResult>;
}

/// Landmark extraction followed by classification.
pub struct GesturePipeline<D: HandDetector> {
    extractor: LandmarkExtractor<D>,
    predictor: GesturePredictor,
    frames: u64,
}

impl<D: HandDetector> GesturePipeline<D> {
    pub fn new(extractor: LandmarkExtractor<D>, predictor: GesturePredictor) -> Self {
        Self {
            extractor,
            predictor,
            frames: 0,
        }
    }

    pub fn predictor(&self) -> &GesturePredictor {
        &self.predictor
    }
}

impl<D: HandDetector> Pipeline for GesturePipeline<D> {
    fn name(&self) -> String {
        if self.predictor.is_available() {
            "Hand Gesture".to_string()
        } else {
            "Hand Landmarks (classifier unavailable)".to_string()
        }
    }

    fn process(&mut self, frame: Frame) -> Result<FrameResult> {
        let index = self.frames;
        self.frames += 1;

        let landmarks = self.extractor.extract(&frame)?;
        let prediction = match &landmarks {
            Some(hand) => Some(self.predictor.predict(&hand.features())?),
            None => None,
        };
        debug!(index, hand = landmarks.is_some(), ?prediction, "frame processed");

        Ok(FrameResult {
            index,
            frame,
            landmarks,
            prediction,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub processed: u64,
    pub skipped: u64,
}

/// Pull, process, hand over, repeat; until stopped, the source runs dry, or the frame
/// limit is reached.
pub struct RecognitionLoop<P: Pipeline> {
    pipeline: P,
    max_consecutive_failures: u32,
    frame_limit: Option<u64>,
}

impl<P: Pipeline> RecognitionLoop<P> {
    pub fn new(pipeline: P, max_consecutive_failures: u32) -> Self {
        Self {
            pipeline,
            max_consecutive_failures: max_consecutive_failures.max(1),
            frame_limit: None,
        }
    }

    pub fn with_frame_limit(mut self, limit: Option<u64>) -> Self {
        self.frame_limit = limit;
        self
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Recoverable per-frame errors are logged and skipped. Anything else, or too many
    /// failures in a row, ends the run with an error.
    pub fn run<S, F>(&mut self, source: &mut S, stop: &StopSignal, mut on_result: F) -> Result<RunStats>
    where
        S: FrameSource + ?Sized,
        F: FnMut(FrameResult),
    {
        info!(pipeline = %self.pipeline.name(), "recognition loop started");
        let mut stats = RunStats::default();
        let mut consecutive = 0u32;

        while !stop.is_stopped() {
            if self.frame_limit.is_some_and(|limit| stats.processed >= limit) {
                break;
            }

            let outcome = match source.next_frame() {
                Ok(Some(frame)) => self.pipeline.process(frame),
                Ok(None) => {
                    info!("frame source exhausted");
                    break;
                }
                Err(e) => Err(e),
            };

            match outcome {
                Ok(result) => {
                    consecutive = 0;
                    stats.processed += 1;
                    on_result(result);
                }
                Err(e) if e.is_recoverable() => {
                    consecutive += 1;
                    stats.skipped += 1;
                    warn!(error = %e, consecutive, "skipping frame");
                    if consecutive >= self.max_consecutive_failures {
                        return Err(GestureError::Capture(format!(
                            "{} consecutive frames failed, last error: {}",
                            consecutive, e
                        )));
                    }
                }
                Err(e) => return Err(e),
            }
        }

        info!(processed = stats.processed, skipped = stats.skipped, "recognition loop stopped");
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectionConfig;
    use crate::labels::GestureLabel;
    use crate::landmarks::tests::{candidate, ScriptedDetector};
    use crate::predictor::tests::FixedModel;
    use image::{ImageBuffer, Rgb};
    use std::collections::VecDeque;

    struct QueuedFrames(VecDeque<Result<Option<Frame>>>);

    impl FrameSource for QueuedFrames {
        fn next_frame(&mut self) -> Result<Option<Frame>> {
            self.0.pop_front().unwrap_or(Ok(None))
        }
    }

    fn frame() -> Frame {
        Frame::rgb(ImageBuffer::from_pixel(32, 32, Rgb([5, 5, 5])))
    }

    fn frames(n: usize) -> QueuedFrames {
        QueuedFrames((0..n).map(|_| Ok(Some(frame()))).collect())
    }

    fn pipeline(detections: Vec<Result<Vec<crate::landmarks::HandCandidate>>>) -> GesturePipeline<ScriptedDetector> {
        let extractor = LandmarkExtractor::new(ScriptedDetector::new(detections), DetectionConfig::default());
        let predictor = GesturePredictor::new(Arc::new(FixedModel::peaked(2, 0.9))).unwrap();
        GesturePipeline::new(extractor, predictor)
    }

    #[test]
    fn hands_are_classified_and_empty_frames_are_not() {
        let mut p = pipeline(vec![Ok(vec![]), Ok(vec![candidate(0.9)])]);

        let r = p.process(frame()).unwrap();
        assert!(r.landmarks.is_none() && r.prediction.is_none());

        let r = p.process(frame()).unwrap();
        assert_eq!(r.index, 1);
        assert_eq!(r.prediction.unwrap().label, Some(GestureLabel::Hello));
    }

    #[test]
    fn loop_skips_bad_frames_and_runs_to_exhaustion() {
        let mut source = QueuedFrames(
            vec![
                Ok(Some(frame())),
                Ok(Some(frame())),
                Ok(Some(frame())),
            ]
            .into(),
        );
        let detections = vec![
            Ok(vec![candidate(0.9)]),
            Err(GestureError::Detection("corrupt".into())),
            Ok(vec![]),
        ];
        let mut lp = RecognitionLoop::new(pipeline(detections), 5);
        let mut seen = Vec::new();
        let stats = lp.run(&mut source, &StopSignal::new(), |r| seen.push(r.prediction)).unwrap();

        assert_eq!(stats, RunStats { processed: 2, skipped: 1 });
        assert!(seen[0].is_some());
        assert!(seen[1].is_none());
    }

    #[test]
    fn too_many_failures_in_a_row_abort() {
        let detections = (0..3).map(|_| Err(GestureError::Detection("x".into()))).collect();
        let mut lp = RecognitionLoop::new(pipeline(detections), 3);
        let err = lp.run(&mut frames(10), &StopSignal::new(), |_| {}).unwrap_err();
        assert!(matches!(err, GestureError::Capture(_)));
    }

    #[test]
    fn capture_failures_count_as_skipped_frames() {
        let mut source = QueuedFrames(
            vec![
                Err(GestureError::Capture("usb hiccup".into())),
                Ok(Some(frame())),
            ]
            .into(),
        );
        let mut lp = RecognitionLoop::new(pipeline(vec![]), 3);
        let stats = lp.run(&mut source, &StopSignal::new(), |_| {}).unwrap();
        assert_eq!(stats, RunStats { processed: 1, skipped: 1 });
    }

    #[test]
    fn stop_signal_is_checked_between_frames() {
        let stop = StopSignal::new();
        let mut lp = RecognitionLoop::new(pipeline(vec![]), 3);
        let mut count = 0;
        let stats = lp
            .run(&mut frames(10), &stop.clone(), |_| {
                count += 1;
                if count == 4 {
                    stop.stop();
                }
            })
            .unwrap();
        assert_eq!(stats.processed, 4);
    }

    #[test]
    fn frame_limit_bounds_the_run() {
        let mut lp = RecognitionLoop::new(pipeline(vec![]), 3).with_frame_limit(Some(2));
        let stats = lp.run(&mut frames(10), &StopSignal::new(), |_| {}).unwrap();
        assert_eq!(stats.processed, 2);
    }

    #[test]
    fn unavailable_classifier_is_fatal() {
        let extractor = LandmarkExtractor::new(
            ScriptedDetector::new(vec![Ok(vec![candidate(0.9)])]),
            DetectionConfig::default(),
        );
        let mut lp = RecognitionLoop::new(
            GesturePipeline::new(extractor, GesturePredictor::unavailable("no file")),
            3,
        );
        assert!(lp.pipeline().name().contains("unavailable"));
        let err = lp.run(&mut frames(2), &StopSignal::new(), |_| {}).unwrap_err();
        assert!(matches!(err, GestureError::ModelUnavailable(_)));
    }
}
