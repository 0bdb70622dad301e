//! Per-user recognition state. Nothing here is shared between sessions.

use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::RecognitionConfig;
use crate::labels::GestureLabel;
use crate::log::{ConfirmedGestureLog, FeedbackEntry, FeedbackLog, GestureObservation};
use crate::quiz::{Leaderboard, QuizOutcome, SignResult, SpeedGestureQuiz, SpeedSignQuiz};
use crate::types::Prediction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stability {
    Good,
    NeedsImprovement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Pacing {
    Appropriate,
    TooFastOrSlow,
}

/// Quick feedback on the gesture currently in view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub gesture: GestureLabel,
    pub confidence: f32,
    pub stability: Stability,
    pub pacing: Pacing,
}

impl AnalysisReport {
    /// `None` for unknown predictions.
    pub fn from_prediction(prediction: &Prediction, config: &RecognitionConfig) -> Option<Self> {
        let gesture = prediction.label?;
        let c = prediction.confidence;
        Some(Self {
            gesture,
            confidence: c,
            stability: if c > config.stability_confidence {
                Stability::Good
            } else {
                Stability::NeedsImprovement
            },
            pacing: if c > config.pacing_confidence {
                Pacing::Appropriate
            } else {
                Pacing::TooFastOrSlow
            },
        })
    }
}

impl fmt::Display for Stability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stability::Good => "Good",
            Stability::NeedsImprovement => "Needs Improvement",
        })
    }
}

impl fmt::Display for Pacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Pacing::Appropriate => "Appropriate",
            Pacing::TooFastOrSlow => "Too Fast/Slow",
        })
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Gesture: {}", self.gesture)?;
        writeln!(f, "Confidence: {:.2}%", self.confidence * 100.0)?;
        writeln!(f, "Hand Stability: {}", self.stability)?;
        write!(f, "Speed: {}", self.pacing)
    }
}

pub struct RecognitionSession {
    config: RecognitionConfig,
    current: Option<Prediction>,
    confirmed: ConfirmedGestureLog,
    feedback: FeedbackLog,
    leaderboard: Leaderboard,
    sign_quiz: Option<SpeedSignQuiz>,
    gesture_quiz: Option<SpeedGestureQuiz>,
}

impl RecognitionSession {
    pub fn new(config: RecognitionConfig) -> Self {
        Self {
            config,
            current: None,
            confirmed: ConfirmedGestureLog::new(),
            feedback: FeedbackLog::new(),
            leaderboard: Leaderboard::default(),
            sign_quiz: None,
            gesture_quiz: None,
        }
    }

    /// Latest frame's prediction; `None` clears it (no hand in view).
    ///
    /// A running gesture quiz sees every prediction. Returns true when it advanced.
    pub fn observe(&mut self, prediction: Option<Prediction>) -> bool {
        self.current = prediction;
        match (&mut self.gesture_quiz, prediction) {
            (Some(quiz), Some(p)) => {
                let hit = quiz.observe(&p);
                if hit {
                    debug!(progress = ?quiz.progress(), "quiz target matched");
                }
                hit
            }
            _ => false,
        }
    }

    pub fn current(&self) -> Option<&Prediction> {
        self.current.as_ref()
    }

    pub fn analysis(&self) -> Option<AnalysisReport> {
        self.current
            .as_ref()
            .and_then(|p| AnalysisReport::from_prediction(p, &self.config))
    }

    /// Logs the current prediction as correct.
    pub fn confirm_current(&mut self) -> Option<&GestureObservation> {
        let p = self.current?;
        let obs = self.confirmed.confirm(&p)?;
        info!(gesture = %obs.gesture, confidence = obs.confidence, "gesture confirmed");
        Some(obs)
    }

    /// Logs the current prediction as wrong.
    pub fn mark_incorrect(&mut self) -> Option<&FeedbackEntry> {
        let p = self.current?;
        let entry = self.feedback.mark_incorrect(&p)?;
        info!(predicted = %entry.predicted, "prediction marked incorrect");
        Some(entry)
    }

    pub fn confirmed(&self) -> &ConfirmedGestureLog {
        &self.confirmed
    }

    pub fn confirmed_mut(&mut self) -> &mut ConfirmedGestureLog {
        &mut self.confirmed
    }

    pub fn feedback(&self) -> &FeedbackLog {
        &self.feedback
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    fn record_outcome(&mut self, outcome: &QuizOutcome) {
        debug!(mode = ?outcome.mode, score = outcome.score, "quiz recorded");
        self.leaderboard.record(outcome);
    }

    /// Starts (or restarts) a speed sign quiz.
    pub fn start_sign_quiz<R: Rng + ?Sized>(&mut self, rng: &mut R, now: Instant) {
        self.sign_quiz = Some(SpeedSignQuiz::new(rng, now));
    }

    pub fn sign_quiz(&self) -> Option<&SpeedSignQuiz> {
        self.sign_quiz.as_ref()
    }

    /// False when no sign quiz is running or `index` is not one of its prompts.
    pub fn answer_sign(&mut self, index: usize, choice: impl Into<String>) -> bool {
        match self.sign_quiz.as_mut() {
            Some(quiz) => quiz.answer(index, choice),
            None => false,
        }
    }

    /// Scores and records the running sign quiz. `None` if none was started.
    pub fn submit_sign_quiz(&mut self, now: Instant) -> Option<(QuizOutcome, Vec<SignResult>)> {
        let (outcome, results) = self.sign_quiz.take()?.submit(now);
        self.record_outcome(&outcome);
        Some((outcome, results))
    }

    /// Starts (or restarts) a speed gesture quiz.
    pub fn start_gesture_quiz<R: Rng + ?Sized>(&mut self, rng: &mut R, now: Instant) {
        self.gesture_quiz = Some(SpeedGestureQuiz::new(rng, self.config.quiz_pass_confidence, now));
    }

    pub fn gesture_quiz(&self) -> Option<&SpeedGestureQuiz> {
        self.gesture_quiz.as_ref()
    }

    pub fn skip_gesture(&mut self) {
        if let Some(quiz) = self.gesture_quiz.as_mut() {
            quiz.skip();
        }
    }

    /// Scores and records the quiz once every target has been matched or skipped.
    pub fn finish_gesture_quiz(&mut self, now: Instant) -> Option<QuizOutcome> {
        let quiz = self.gesture_quiz.take()?;
        match quiz.finish(now) {
            Ok(outcome) => {
                self.record_outcome(&outcome);
                Some(outcome)
            }
            Err(unfinished) => {
                self.gesture_quiz = Some(unfinished);
                None
            }
        }
    }
}
