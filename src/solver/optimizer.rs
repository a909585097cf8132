use std::sync::atomic::{AtomicU32, Ordering};

use log::{debug, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::config::EngineConfig;

use super::attempt::{AttemptResult, run_attempt};
use super::context::AttemptContext;
use super::score;
use super::week::Week;

/// Result of the strict search.
#[derive(Debug, Clone)]
pub enum Outcome {
    Solved {
        context: AttemptContext,
        score: i64,
        attempts: u32,
    },
    /// Every attempt hit a slot without candidates.
    Infeasible { attempts: u32 },
}

/// Best-of-N randomized greedy search.
///
/// Attempt `i` draws from stream `i` of a ChaCha generator keyed by the run
/// seed, so attempts are independent of each other and of scheduling order.
#[derive(Debug, Clone)]
pub struct Optimizer {
    max_attempts: u32,
    parallel: bool,
}

impl Optimizer {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            parallel: false,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            parallel: config.parallel,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn run(&self, week: &Week<'_>, seed: u64) -> Outcome {
        info!(
            "Optimizing {} slots for {} employees (up to {} attempts)",
            week.slots().len(),
            week.participant_count(),
            self.max_attempts
        );
        let base = AttemptContext::seeded(week);

        let (best, attempts) = if self.parallel {
            self.run_parallel(week, &base, seed)
        } else {
            self.run_sequential(week, &base, seed)
        };

        match best {
            Some((score, attempt, context)) => {
                info!("Best score {} from attempt {} of {}", score, attempt, attempts);
                Outcome::Solved {
                    context,
                    score,
                    attempts,
                }
            }
            None => {
                info!("No complete assignment in {} attempts", attempts);
                Outcome::Infeasible { attempts }
            }
        }
    }

    fn run_sequential(
        &self,
        week: &Week<'_>,
        base: &AttemptContext,
        seed: u64,
    ) -> (Option<(i64, u32, AttemptContext)>, u32) {
        let mut best: Option<(i64, u32, AttemptContext)> = None;
        let mut attempts = 0;

        for attempt in 0..self.max_attempts {
            attempts += 1;
            let Some((score, context)) = scored_attempt(week, base, seed, attempt) else {
                continue;
            };
            if best.as_ref().is_none_or(|(best_score, _, _)| score < *best_score) {
                best = Some((score, attempt, context));
            }
            if score == 0 {
                break;
            }
        }

        (best, attempts)
    }

    /// Attempts above the lowest perfect index seen so far are skipped, so the
    /// lowest perfect attempt always runs and the result matches sequential mode.
    fn run_parallel(
        &self,
        week: &Week<'_>,
        base: &AttemptContext,
        seed: u64,
    ) -> (Option<(i64, u32, AttemptContext)>, u32) {
        let first_perfect = AtomicU32::new(u32::MAX);

        let best = (0..self.max_attempts)
            .into_par_iter()
            .filter_map(|attempt| {
                if attempt > first_perfect.load(Ordering::Relaxed) {
                    return None;
                }
                let (score, context) = scored_attempt(week, base, seed, attempt)?;
                if score == 0 {
                    first_perfect.fetch_min(attempt, Ordering::Relaxed);
                }
                Some((score, attempt, context))
            })
            .min_by_key(|(score, attempt, _)| (*score, *attempt));

        let attempts = match first_perfect.into_inner() {
            u32::MAX => self.max_attempts,
            perfect => perfect + 1,
        };
        (best, attempts)
    }
}

fn scored_attempt(
    week: &Week<'_>,
    base: &AttemptContext,
    seed: u64,
    attempt: u32,
) -> Option<(i64, AttemptContext)> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(u64::from(attempt));

    match run_attempt(week, base, &mut rng) {
        AttemptResult::Complete(context) => {
            let score = score::evaluate(week, &context);
            debug!("Attempt {}: score {}", attempt, score);
            Some((score, context))
        }
        AttemptResult::Failed { slot } => {
            debug!("Attempt {}: no candidates for {}", attempt, slot);
            None
        }
    }
}
