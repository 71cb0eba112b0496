//! Scoring.
//!
//! A win is worth 100 points minus a fixed cost for every wrong attempt
//! before it, where the cost is `100 / attempt_limit`. Guesses that do not
//! win never change the score.

use crate::game::evaluate::GuessOutcome;

/// Points for a first-attempt win.
pub const MAX_AWARD: f64 = 100.0;

/// Points lost per wrong attempt before a win.
pub fn cost_per_wrong_attempt(attempt_limit: u32) -> f64 {
    MAX_AWARD / f64::from(attempt_limit.max(1))
}

/// Points awarded for winning on `attempt_number` (1-based).
pub fn win_award(attempt_number: u32, attempt_limit: u32) -> f64 {
    let wrong_attempts = f64::from(attempt_number.saturating_sub(1));
    (MAX_AWARD - wrong_attempts * cost_per_wrong_attempt(attempt_limit)).max(0.0)
}

/// New running score after a guess.
pub fn score_for(
    current_score: f64,
    outcome: GuessOutcome,
    attempt_number: u32,
    attempt_limit: u32,
) -> f64 {
    if outcome.is_win() {
        current_score + win_award(attempt_number, attempt_limit)
    } else {
        current_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_first_guess_win_is_full_score() {
        assert_eq!(score_for(0.0, GuessOutcome::Win, 1, 8), 100.0);
        assert_eq!(score_for(0.0, GuessOutcome::Win, 1, 6), 100.0);
    }

    #[test]
    fn test_score_depletes_per_wrong_attempt() {
        // 12.5 per wrong attempt with 8 attempts
        let first = score_for(0.0, GuessOutcome::Win, 1, 8);
        let fifth = score_for(0.0, GuessOutcome::Win, 5, 8);
        assert_eq!(fifth, 100.0 - 4.0 * 12.5);
        assert!(fifth < first);
    }

    #[test]
    fn test_score_other_limit() {
        assert_eq!(score_for(0.0, GuessOutcome::Win, 3, 5), 60.0);
    }

    #[test]
    fn test_hard_third_attempt() {
        let score = score_for(0.0, GuessOutcome::Win, 3, 6);
        assert!(approx_eq(score, 100.0 - 2.0 * (100.0 / 6.0)));
        assert!((score - 66.67).abs() < 0.01);
    }

    #[test]
    fn test_award_clamped_at_zero() {
        assert_eq!(win_award(9, 8), 0.0);
        assert_eq!(win_award(20, 6), 0.0);
    }

    #[test]
    fn test_non_win_keeps_score() {
        assert_eq!(score_for(50.0, GuessOutcome::TooHigh, 2, 8), 50.0);
        assert_eq!(score_for(0.0, GuessOutcome::TooLow, 8, 8), 0.0);
    }

    proptest! {
        #[test]
        fn prop_first_attempt_always_100(limit in 1u32..1000) {
            prop_assert_eq!(score_for(0.0, GuessOutcome::Win, 1, limit), 100.0);
        }

        #[test]
        fn prop_win_formula(attempt in 1u32..50, limit in 1u32..50) {
            let expected = (100.0 - f64::from(attempt - 1) * (100.0 / f64::from(limit))).max(0.0);
            prop_assert!(approx_eq(score_for(0.0, GuessOutcome::Win, attempt, limit), expected));
        }

        #[test]
        fn prop_non_win_is_identity(
            current in 0.0f64..10_000.0,
            attempt in 0u32..50,
            limit in 1u32..50,
            high in any::<bool>(),
        ) {
            let outcome = if high { GuessOutcome::TooHigh } else { GuessOutcome::TooLow };
            prop_assert_eq!(score_for(current, outcome, attempt, limit), current);
        }
    }
}
