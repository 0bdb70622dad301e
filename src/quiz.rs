//! Timed quiz sessions. Both modes score through [`crate::scoring::score`].

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;
use tracing::info;

use crate::labels::{GestureLabel, LABELS};
use crate::scoring;
use crate::types::Prediction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum QuizMode {
    SpeedSign,
    SpeedGesture,
}

/// Result of one finished quiz.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizOutcome {
    pub mode: QuizMode,
    pub correct: usize,
    pub total: usize,
    pub score: u32,
}

const SIGN_DECK: [(&str, &str); 8] = [
    ("hello", "Wave your hand in greeting"),
    ("thank you", "Touch your chin with your fingertips and move forward"),
    ("love you", "Show ILY hand sign"),
    ("yes", "Nod your fist up and down"),
    ("no", "Shake your index finger side to side"),
    ("help", "One hand resting on the other, both palms up"),
    ("want", "Hands in pulling motion towards chest"),
    ("more", "Fingers together, tap fingertips multiple times"),
];

#[derive(Debug, Clone)]
pub struct SignPrompt {
    pub sign: &'static str,
    pub description: &'static str,
    /// Every sign in the deck, shuffled per prompt.
    pub options: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignResult {
    pub sign: &'static str,
    pub answer: Option<String>,
    pub correct: bool,
}

/// Multiple choice: match each description to its sign, then submit everything at once.
#[derive(Debug)]
pub struct SpeedSignQuiz {
    prompts: Vec<SignPrompt>,
    answers: Vec<Option<String>>,
    started: Instant,
}

impl SpeedSignQuiz {
    pub fn new<R: Rng + ?Sized>(rng: &mut R, started: Instant) -> Self {
        let mut deck = SIGN_DECK.to_vec();
        deck.shuffle(rng);
        let signs: Vec<&'static str> = SIGN_DECK.iter().map(|(s, _)| *s).collect();
        let prompts: Vec<SignPrompt> = deck
            .into_iter()
            .map(|(sign, description)| {
                let mut options = signs.clone();
                options.shuffle(rng);
                SignPrompt {
                    sign,
                    description,
                    options,
                }
            })
            .collect();
        let answers = vec![None; prompts.len()];
        Self {
            prompts,
            answers,
            started,
        }
    }

    pub fn prompts(&self) -> &[SignPrompt] {
        &self.prompts
    }

    /// Records (or replaces) the answer for prompt `index`. False if there is no such prompt.
    pub fn answer(&mut self, index: usize, choice: impl Into<String>) -> bool {
        match self.answers.get_mut(index) {
            Some(slot) => {
                *slot = Some(choice.into());
                true
            }
            None => false,
        }
    }

    pub fn submit(self, finished: Instant) -> (QuizOutcome, Vec<SignResult>) {
        let results: Vec<SignResult> = self
            .prompts
            .iter()
            .zip(self.answers)
            .map(|(p, answer)| SignResult {
                sign: p.sign,
                correct: answer.as_deref() == Some(p.sign),
                answer,
            })
            .collect();
        let correct = results.iter().filter(|r| r.correct).count();
        let total = self.prompts.len();
        let outcome = QuizOutcome {
            mode: QuizMode::SpeedSign,
            correct,
            total,
            score: scoring::score(self.started, finished, correct, total),
        };
        info!(correct, total, score = outcome.score, "speed sign quiz submitted");
        (outcome, results)
    }
}

/// Perform each label in turn on camera; a confident match advances, `skip` gives up on one.
#[derive(Debug)]
pub struct SpeedGestureQuiz {
    targets: Vec<GestureLabel>,
    current: usize,
    correct: usize,
    pass_confidence: f32,
    started: Instant,
}

impl SpeedGestureQuiz {
    pub fn new<R: Rng + ?Sized>(rng: &mut R, pass_confidence: f32, started: Instant) -> Self {
        let mut targets = LABELS.to_vec();
        targets.shuffle(rng);
        Self {
            targets,
            current: 0,
            correct: 0,
            pass_confidence,
            started,
        }
    }

    pub fn current_target(&self) -> Option<GestureLabel> {
        self.targets.get(self.current).copied()
    }

    /// 1-based position and total, for "3/15" style progress.
    pub fn progress(&self) -> (usize, usize) {
        ((self.current + 1).min(self.targets.len()), self.targets.len())
    }

    pub fn correct(&self) -> usize {
        self.correct
    }

    pub fn is_finished(&self) -> bool {
        self.current >= self.targets.len()
    }

    /// Feeds one live prediction. Returns true when it matched and the quiz advanced.
    pub fn observe(&mut self, prediction: &Prediction) -> bool {
        match self.current_target() {
            Some(target)
                if prediction.label == Some(target)
                    && prediction.is_confident(self.pass_confidence) =>
            {
                self.correct += 1;
                self.current += 1;
                true
            }
            _ => false,
        }
    }

    pub fn skip(&mut self) {
        if !self.is_finished() {
            self.current += 1;
        }
    }

    /// Scores a finished quiz; an unfinished one is handed back.
    pub fn finish(self, finished: Instant) -> Result<QuizOutcome, Self> {
        if !self.is_finished() {
            return Err(self);
        }
        let total = self.targets.len();
        let outcome = QuizOutcome {
            mode: QuizMode::SpeedGesture,
            correct: self.correct,
            total,
            score: scoring::score(self.started, finished, self.correct, total),
        };
        info!(correct = self.correct, total, score = outcome.score, "speed gesture quiz finished");
        Ok(outcome)
    }
}

/// In-memory high scores per quiz mode.
#[derive(Debug, Clone, Default)]
pub struct Leaderboard {
    scores: HashMap<QuizMode, Vec<u32>>,
}

impl Leaderboard {
    pub fn record(&mut self, outcome: &QuizOutcome) {
        self.scores.entry(outcome.mode).or_default().push(outcome.score);
    }

    /// Scores in the order they were achieved.
    pub fn scores(&self, mode: QuizMode) -> &[u32] {
        self.scores.get(&mode).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn top(&self, mode: QuizMode, n: usize) -> Vec<u32> {
        let mut sorted = self.scores(mode).to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        sorted.truncate(n);
        sorted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn sign_quiz_offers_every_sign_each_prompt() {
        let quiz = SpeedSignQuiz::new(&mut rng(), Instant::now());
        assert_eq!(quiz.prompts().len(), 8);
        for p in quiz.prompts() {
            let mut opts = p.options.clone();
            opts.sort_unstable();
            let mut all: Vec<_> = SIGN_DECK.iter().map(|(s, _)| *s).collect();
            all.sort_unstable();
            assert_eq!(opts, all);
            assert!(p.options.contains(&p.sign));
        }
    }

    #[test]
    fn sign_quiz_all_correct_in_five_seconds() {
        let t = Instant::now();
        let mut quiz = SpeedSignQuiz::new(&mut rng(), t);
        let signs: Vec<_> = quiz.prompts().iter().map(|p| p.sign).collect();
        for (i, s) in signs.iter().enumerate() {
            assert!(quiz.answer(i, *s));
        }
        assert!(!quiz.answer(8, "hello"));

        let (outcome, results) = quiz.submit(t + Duration::from_secs(5));
        assert_eq!(outcome.correct, 8);
        assert_eq!(outcome.score, 950);
        assert!(results.iter().all(|r| r.correct));
    }

    #[test]
    fn unanswered_prompts_are_wrong() {
        let t = Instant::now();
        let mut quiz = SpeedSignQuiz::new(&mut rng(), t);
        let first = quiz.prompts()[0].sign;
        quiz.answer(0, first);
        quiz.answer(1, "definitely not a sign");
        let (outcome, results) = quiz.submit(t + Duration::from_secs(100));
        assert_eq!(outcome.correct, 1);
        assert_eq!(outcome.score, 0);
        assert_eq!(results[1].answer.as_deref(), Some("definitely not a sign"));
        assert!(results[2].answer.is_none());
    }

    #[test]
    fn gesture_quiz_requires_confident_match() {
        let t = Instant::now();
        let mut quiz = SpeedGestureQuiz::new(&mut rng(), 0.8, t);
        let target = quiz.current_target().unwrap();

        assert!(!quiz.observe(&Prediction::new(target, 0.8)));
        assert!(!quiz.observe(&Prediction::unknown()));
        assert!(quiz.observe(&Prediction::new(target, 0.81)));
        assert_eq!(quiz.correct(), 1);
        assert_eq!(quiz.progress(), (2, 15));
    }

    #[test]
    fn gesture_quiz_scores_through_shared_scorer() {
        let t = Instant::now();
        let mut quiz = SpeedGestureQuiz::new(&mut rng(), 0.8, t);
        let quiz_back = quiz.finish(t).unwrap_err();
        quiz = quiz_back;

        while let Some(target) = quiz.current_target() {
            if target.index() % 2 == 0 {
                quiz.observe(&Prediction::new(target, 0.95));
            } else {
                quiz.skip();
            }
        }
        assert!(quiz.is_finished());
        quiz.skip();

        let outcome = quiz.finish(t + Duration::from_secs(12)).unwrap();
        assert_eq!(outcome.correct, 8);
        assert_eq!(outcome.total, 15);
        assert_eq!(
            outcome.score,
            scoring::score(t, t + Duration::from_secs(12), 8, 15)
        );
    }

    #[test]
    fn leaderboard_keeps_modes_apart() {
        let mut board = Leaderboard::default();
        for (mode, score) in [
            (QuizMode::SpeedSign, 400),
            (QuizMode::SpeedSign, 900),
            (QuizMode::SpeedGesture, 10),
            (QuizMode::SpeedSign, 650),
        ] {
            board.record(&QuizOutcome {
                mode,
                correct: 1,
                total: 1,
                score,
            });
        }
        assert_eq!(board.scores(QuizMode::SpeedSign), &[400, 900, 650]);
        assert_eq!(board.top(QuizMode::SpeedSign, 2), vec![900, 650]);
        assert_eq!(board.scores(QuizMode::SpeedGesture), &[10]);
    }
}
