//! The single scoring rule shared by every quiz mode, so leaderboards stay comparable.

use std::time::{Duration, Instant};

pub const BASE_SCORE: f64 = 1000.0;
pub const PENALTY_PER_SECOND: f64 = 10.0;

/// `max(0, round(1000 * correct / total - 10 * elapsed_seconds))`.
///
/// # Panics
///
/// When `total` is zero. A quiz with no prompts is a caller bug.
pub fn score(start: Instant, end: Instant, correct: usize, total: usize) -> u32 {
    score_elapsed(end.saturating_duration_since(start), correct, total)
}

/// Exact halves round to the even neighbour (banker's rounding), so 992.5 scores 992.
pub fn score_elapsed(elapsed: Duration, correct: usize, total: usize) -> u32 {
    assert!(total > 0, "score requires at least one prompt");
    let accuracy = correct as f64 / total as f64;
    let raw = (BASE_SCORE * accuracy - PENALTY_PER_SECOND * elapsed.as_secs_f64()).round_ties_even();
    raw.max(0.0) as u32
}
