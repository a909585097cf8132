use std::ops::Range;

use chrono::Utc;
use log::{info, warn};

use crate::config::EngineConfig;
use crate::data::{
    DAYS_IN_WEEK, Day, GenerationRequest, GenerationResult, SATURDAY, Schedule, Slot, Strategy,
    default_creator,
};
use crate::error::EngineError;
use crate::ids::{IdGenerator, UuidGenerator};
use crate::validation;

pub mod attempt;
pub mod candidate;
pub mod constraints;
pub mod context;
pub mod fallback;
pub mod optimizer;
pub mod score;
pub mod week;

use context::AttemptContext;
use fallback::FallbackAssigner;
use optimizer::{Optimizer, Outcome};
use week::Week;

/// What one strategy handed back to the generator.
struct Produced {
    context: AttemptContext,
    days: Range<Day>,
    strategy: Strategy,
    score: Option<i64>,
    unassigned: Vec<Slot>,
    attempts: u32,
}

/// Runs the optimizer, falls back when it is infeasible, and wraps the
/// outcome into a schedule with its warnings.
pub struct ScheduleGenerator {
    config: EngineConfig,
    ids: Box<dyn IdGenerator>,
}

impl ScheduleGenerator {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ids: Box::new(UuidGenerator),
        }
    }

    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        let week = match Week::new(request) {
            Ok(week) => week,
            Err(error) => {
                warn!("Generation rejected: {}", error);
                return GenerationResult::rejected(error.into(), Vec::new(), 0);
            }
        };

        let mut warnings = validation::preflight(&week);
        let seed = request
            .seed
            .or(self.config.seed)
            .unwrap_or_else(rand::random);
        info!(
            "Generating week of {} for {} employees, {} slots, {} pinned (seed {})",
            week.start(),
            week.participant_count(),
            week.slots().len(),
            week.pins().len(),
            seed
        );

        let produced = match self.search(&week, seed) {
            Ok(produced) => produced,
            Err((error, attempts)) => {
                warn!("Generation failed after {} attempts: {}", attempts, error);
                return GenerationResult::rejected(error.into(), warnings, attempts);
            }
        };

        warnings.extend(validation::unassigned_warnings(&week, &produced.unassigned));
        warnings.extend(validation::review(&week, &produced.context));

        let assignments = produced.context.to_assignments(&week, produced.days.clone());
        let schedule = match &request.existing_schedule {
            Some(existing) => Schedule {
                assignments,
                ..existing.clone()
            },
            None => Schedule {
                id: self.ids.next_id(),
                week_start: week.start(),
                assignments,
                locked_assignments: None,
                frozen_assignments: None,
                created_at: Utc::now(),
                created_by: request.created_by.clone().unwrap_or_else(default_creator),
            },
        };
        info!(
            "Schedule {} ready: {} of {} slots filled, {} warnings",
            schedule.id,
            schedule.assignments.filled_count(),
            week.slots().len(),
            warnings.len()
        );

        GenerationResult {
            schedule: Some(schedule),
            errors: Vec::new(),
            warnings,
            attempts: produced.attempts,
            optimization_score: produced.score,
            strategy: Some(produced.strategy),
            unassigned_shifts: produced.unassigned,
        }
    }

    fn search(&self, week: &Week<'_>, seed: u64) -> Result<Produced, (EngineError, u32)> {
        match Optimizer::from_config(&self.config).run(week, seed) {
            Outcome::Solved {
                context,
                score,
                attempts,
            } => Ok(Produced {
                context,
                days: 0..SATURDAY,
                strategy: Strategy::Optimized,
                score: Some(score),
                unassigned: Vec::new(),
                attempts,
            }),
            Outcome::Infeasible { attempts } => {
                warn!(
                    "Optimizer found no complete schedule in {} attempts, using fallback",
                    attempts
                );
                let plan = FallbackAssigner::from_config(&self.config)
                    .run(week, seed)
                    .ok_or((EngineError::NoFeasibleSolution, attempts))?;
                Ok(Produced {
                    context: plan.context,
                    days: 0..DAYS_IN_WEEK,
                    strategy: Strategy::Fallback,
                    score: None,
                    unassigned: plan.unassigned,
                    attempts: attempts + plan.attempts,
                })
            }
        }
    }
}

impl Default for ScheduleGenerator {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
