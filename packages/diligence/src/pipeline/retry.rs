//! Retry control.
//!
//! A run is a small state machine:
//!
//! ```text
//! Attempting(0) ─┬─ completeness >= target ─────────────▶ Satisfied
//!                ├─ below target, n < max_retries ──────▶ Attempting(n + 1)
//!                └─ below target, n == max_retries ─────▶ Exhausted
//! ```
//!
//! The best attempt so far is folded with [`pick_better`], so its
//! completeness never decreases. An attempt that finds no evidence ends the
//! run early.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::extract::ExtractionMethod;
use crate::types::completeness::CompletenessScore;
use crate::types::config::RetryConfig;

/// One full search-score-extract-evaluate pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryAttempt<R> {
    /// Zero-based.
    pub attempt_number: u32,
    pub record: R,
    pub completeness: CompletenessScore,
    pub method: ExtractionMethod,
    /// Evidence URLs the record was extracted from.
    pub sources: Vec<String>,
}

/// What a single attempt produced.
#[derive(Debug, Clone)]
pub enum AttemptOutcome<R> {
    Extracted(RetryAttempt<R>),
    /// Search found nothing that cleared the scorer.
    NoEvidence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Attempting(u32),
    Satisfied,
    Exhausted,
}

/// How a run ended.
#[derive(Debug, Clone)]
pub enum RunOutcome<R> {
    /// An attempt reached the completeness target.
    Satisfied(RetryAttempt<R>),
    /// Budget spent (or evidence ran out) below target; best effort.
    BelowThreshold(RetryAttempt<R>),
    /// No attempt found any evidence.
    NoEvidence,
}

/// Outcome of a run plus its trace.
#[derive(Debug, Clone)]
pub struct RunReport<R> {
    pub outcome: RunOutcome<R>,
    /// Full attempts executed.
    pub attempts: u32,
    /// Best completeness after each extracted attempt.
    pub best_history: Vec<f64>,
}

impl<R> RunReport<R> {
    /// The chosen attempt, if any.
    pub fn best(&self) -> Option<&RetryAttempt<R>> {
        match &self.outcome {
            RunOutcome::Satisfied(a) | RunOutcome::BelowThreshold(a) => Some(a),
            RunOutcome::NoEvidence => None,
        }
    }

    pub fn is_satisfied(&self) -> bool {
        matches!(self.outcome, RunOutcome::Satisfied(_))
    }
}

/// Keep whichever attempt has strictly higher completeness; ties keep the
/// earlier one.
pub fn pick_better<R>(best: Option<RetryAttempt<R>>, attempt: RetryAttempt<R>) -> RetryAttempt<R> {
    match best {
        Some(best) if attempt.completeness.percent <= best.completeness.percent => best,
        _ => attempt,
    }
}

/// Runs one attempt on the controller's behalf.
#[async_trait]
pub trait AttemptRunner<R: Send>: Send {
    /// `strengthened` is set on every retry; the extractor should then push
    /// for inferred values instead of leaving fields unfilled.
    async fn attempt(&mut self, attempt_number: u32, strengthened: bool) -> AttemptOutcome<R>;
}

/// Drives attempts until the target is met or the budget is spent.
#[derive(Debug, Clone)]
pub struct RetryController {
    config: RetryConfig,
}

impl RetryController {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// State after attempt `n` scored `completeness`.
    pub fn transition(&self, n: u32, completeness: &CompletenessScore) -> RetryState {
        if completeness.meets(self.config.target_percent) {
            RetryState::Satisfied
        } else if n < self.config.max_retries {
            RetryState::Attempting(n + 1)
        } else {
            RetryState::Exhausted
        }
    }

    pub async fn drive<R, A>(&self, runner: &mut A) -> RunReport<R>
    where
        R: Send,
        A: AttemptRunner<R> + ?Sized,
    {
        let mut best: Option<RetryAttempt<R>> = None;
        let mut best_history = Vec::new();
        let mut attempts = 0;
        let mut state = RetryState::Attempting(0);

        while let RetryState::Attempting(n) = state {
            attempts += 1;
            let attempt = match runner.attempt(n, n > 0).await {
                AttemptOutcome::Extracted(attempt) => attempt,
                AttemptOutcome::NoEvidence => {
                    tracing::warn!(attempt = n, "No evidence found, ending run");
                    break;
                }
            };

            let score = attempt.completeness;
            state = self.transition(n, &score);
            tracing::info!(
                attempt = n,
                completeness = score.percent,
                target = self.config.target_percent,
                method = ?attempt.method,
                "Attempt evaluated"
            );

            if state == RetryState::Satisfied {
                best_history.push(score.percent);
                return RunReport {
                    outcome: RunOutcome::Satisfied(attempt),
                    attempts,
                    best_history,
                };
            }

            let kept = pick_better(best.take(), attempt);
            best_history.push(kept.completeness.percent);
            best = Some(kept);
        }

        let outcome = match best {
            Some(best) => {
                tracing::info!(
                    completeness = best.completeness.percent,
                    attempts,
                    "Retry budget exhausted, returning best attempt"
                );
                RunOutcome::BelowThreshold(best)
            }
            None => RunOutcome::NoEvidence,
        };

        RunReport {
            outcome,
            attempts,
            best_history,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::VecDeque;

    /// Replays scripted completeness values; `None` means no evidence.
    struct Scripted {
        script: VecDeque<Option<u32>>,
        strengthened: Vec<bool>,
    }

    impl Scripted {
        fn new(values: &[Option<u32>]) -> Self {
            Self {
                script: values.iter().copied().collect(),
                strengthened: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl AttemptRunner<u32> for Scripted {
        async fn attempt(&mut self, attempt_number: u32, strengthened: bool) -> AttemptOutcome<u32> {
            self.strengthened.push(strengthened);
            match self.script.pop_front().flatten() {
                Some(filled) => AttemptOutcome::Extracted(RetryAttempt {
                    attempt_number,
                    record: filled,
                    completeness: CompletenessScore::new(filled, 100),
                    method: ExtractionMethod::Llm,
                    sources: vec![],
                }),
                None => AttemptOutcome::NoEvidence,
            }
        }
    }

    fn controller(max_retries: u32, target: f64) -> RetryController {
        RetryController::new(RetryConfig {
            max_retries,
            target_percent: target,
        })
    }

    #[tokio::test]
    async fn test_best_so_far_never_regresses_and_halts_at_target() {
        let mut runner = Scripted::new(&[Some(40), Some(70), Some(55), Some(90), Some(99)]);
        let report = controller(5, 90.0).drive(&mut runner).await;

        assert_eq!(report.best_history, vec![40.0, 70.0, 70.0, 90.0]);
        assert_eq!(report.attempts, 4);
        assert!(report.is_satisfied());
        assert_eq!(report.best().unwrap().record, 90);
        assert_eq!(runner.strengthened, vec![false, true, true, true]);
    }

    #[tokio::test]
    async fn test_exhausted_returns_best_attempt() {
        let mut runner = Scripted::new(&[Some(82), Some(88), Some(85)]);
        let report = controller(2, 95.0).drive(&mut runner).await;

        assert_eq!(report.attempts, 3);
        match report.outcome {
            RunOutcome::BelowThreshold(best) => {
                assert_eq!(best.record, 88);
                assert_eq!(best.attempt_number, 1);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_evidence_first_attempt_is_terminal() {
        let mut runner = Scripted::new(&[None, Some(99)]);
        let report = controller(2, 95.0).drive(&mut runner).await;

        assert!(matches!(report.outcome, RunOutcome::NoEvidence));
        assert_eq!(report.attempts, 1);
    }

    #[tokio::test]
    async fn test_no_evidence_after_progress_keeps_best() {
        let mut runner = Scripted::new(&[Some(60), None]);
        let report = controller(2, 95.0).drive(&mut runner).await;

        assert_eq!(report.attempts, 2);
        assert!(matches!(report.outcome, RunOutcome::BelowThreshold(ref a) if a.record == 60));
    }

    #[test]
    fn test_pick_better_prefers_earlier_on_tie() {
        let make = |n, filled| RetryAttempt {
            attempt_number: n,
            record: (),
            completeness: CompletenessScore::new(filled, 10),
            method: ExtractionMethod::Llm,
            sources: vec![],
        };
        let kept = pick_better(Some(make(0, 5)), make(1, 5));
        assert_eq!(kept.attempt_number, 0);
        let kept = pick_better(Some(make(0, 5)), make(1, 6));
        assert_eq!(kept.attempt_number, 1);
    }

    proptest! {
        #[test]
        fn prop_history_is_non_decreasing_and_bounded(
            values in prop::collection::vec(0u32..=100, 1..8),
            max_retries in 0u32..6,
        ) {
            let script: Vec<_> = values.iter().copied().map(Some).collect();
            let mut runner = Scripted::new(&script);
            let report = tokio_test::block_on(controller(max_retries, 95.0).drive(&mut runner));

            prop_assert!(report.attempts <= max_retries + 1);
            prop_assert!(report.best_history.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}
