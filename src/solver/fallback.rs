//! Permissive assignment used when the optimizer finds no complete schedule.
//!
//! Slots are filled chronologically under the same hard rules; a slot that
//! nobody can take stays empty instead of aborting the attempt.

use log::{debug, info};
use rand::Rng;
use rand::SeedableRng;
use rand::seq::IndexedRandom;
use rand_chacha::ChaCha8Rng;

use crate::config::EngineConfig;
use crate::data::{ShiftType, Slot};

use super::constraints;
use super::context::{AttemptContext, ShiftCounts};
use super::week::{Member, Week};

/// Fallback attempts draw from streams above the optimizer's.
const STREAM_OFFSET: u64 = 1 << 32;

const UNASSIGNED_SLOT: f64 = 100.0;
const TOTAL_DEVIATION: f64 = 5.0;
const HAS_MORNING: f64 = 10.0;
const HAS_EVENING: f64 = 5.0;
const HAS_NIGHT: f64 = 5.0;
const MORNINGS_SOFT_CAP: u32 = 3;
const EVENINGS_SOFT_CAP: u32 = 2;
const NIGHTS_SOFT_CAP: u32 = 2;

#[derive(Debug, Clone)]
pub struct FallbackPlan {
    pub context: AttemptContext,
    /// Slots left empty, chronologically ordered.
    pub unassigned: Vec<Slot>,
    pub attempts: u32,
    /// Higher is better.
    pub balance: f64,
}

#[derive(Debug, Clone)]
pub struct FallbackAssigner {
    attempts: u32,
    redistribution_limit: usize,
}

impl FallbackAssigner {
    pub fn new(attempts: u32, redistribution_limit: usize) -> Self {
        Self {
            attempts,
            redistribution_limit,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.fallback_attempts, config.redistribution_limit)
    }

    /// Best of the configured attempts, `None` only when attempts are disabled.
    pub fn run(&self, week: &Week<'_>, seed: u64) -> Option<FallbackPlan> {
        if self.attempts == 0 {
            return None;
        }
        let base = AttemptContext::seeded(week);
        let mut best: Option<FallbackPlan> = None;
        let mut attempts = 0;

        for attempt in 0..self.attempts {
            attempts += 1;
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            rng.set_stream(STREAM_OFFSET + u64::from(attempt));

            let (context, unassigned) = self.attempt(week, &base, &mut rng);
            let balance = balance_score(week, &context, unassigned.len());
            debug!(
                "Fallback attempt {}: {} unassigned, balance {:.1}",
                attempt,
                unassigned.len(),
                balance
            );

            let complete = unassigned.is_empty();
            if complete || best.as_ref().is_none_or(|b| balance > b.balance) {
                best = Some(FallbackPlan {
                    context,
                    unassigned,
                    attempts: 0,
                    balance,
                });
            }
            if complete {
                break;
            }
        }

        best.map(|mut plan| {
            plan.attempts = attempts;
            info!(
                "Fallback kept a schedule with {} unassigned slots after {} attempts",
                plan.unassigned.len(),
                attempts
            );
            plan
        })
    }

    fn attempt<R: Rng + ?Sized>(
        &self,
        week: &Week<'_>,
        base: &AttemptContext,
        rng: &mut R,
    ) -> (AttemptContext, Vec<Slot>) {
        let mut ctx = base.clone();
        let mut stranded = Vec::new();

        for slot in week.calendar_slots() {
            if week.is_pinned(slot) {
                continue;
            }
            match pick(week, &ctx, slot, None, rng) {
                Some(member) => ctx.assign(slot, member),
                None => stranded.push(slot),
            }
        }

        let mut unassigned = Vec::new();
        for (i, slot) in stranded.into_iter().enumerate() {
            if i < self.redistribution_limit && relocate(week, &mut ctx, slot, rng) {
                debug!("Redistributed to fill {}", slot);
                continue;
            }
            unassigned.push(slot);
        }
        (ctx, unassigned)
    }
}

/// Lowest priority wins. Mornings go to employees without one when possible.
fn pick<R: Rng + ?Sized>(
    week: &Week<'_>,
    ctx: &AttemptContext,
    slot: Slot,
    excluded: Option<Member>,
    rng: &mut R,
) -> Option<Member> {
    let eligible: Vec<Member> = week
        .participants()
        .filter(|&m| Some(m) != excluded)
        .filter(|&m| constraints::is_eligible(week, ctx, m, slot))
        .collect();

    let mut pool = eligible.clone();
    if slot.shift_type == ShiftType::Morning {
        pool.retain(|&m| ctx.counts(m).morning == 0);
        if pool.is_empty() {
            pool = eligible;
        }
    }

    let lowest = pool.iter().map(|&m| priority(ctx.counts(m), slot.shift_type)).min()?;
    let tied: Vec<Member> = pool
        .into_iter()
        .filter(|&m| priority(ctx.counts(m), slot.shift_type) == lowest)
        .collect();
    tied.choose(rng).copied()
}

pub fn priority(counts: ShiftCounts, shift_type: ShiftType) -> i64 {
    let total = i64::from(counts.total) * 10;
    let held = i64::from(counts.of(shift_type));
    let by_type = match shift_type {
        ShiftType::Morning if held == 0 => -50,
        ShiftType::Morning => held * 20,
        _ if held == 0 => -30,
        _ => held * 15,
    };
    total + by_type
}

/// Fills `slot` by moving in an employee who is blocked only by another
/// shift on the same day, when someone else can take the shift they leave.
fn relocate<R: Rng + ?Sized>(
    week: &Week<'_>,
    ctx: &mut AttemptContext,
    slot: Slot,
    rng: &mut R,
) -> bool {
    for member in week.participants() {
        if !week.allows(member, slot) || week.on_vacation(member, slot.day) {
            continue;
        }
        let Some(held) = ctx.shift_on(member, slot.day) else {
            continue;
        };
        if week.is_pinned(held) {
            continue;
        }

        ctx.unassign(held);
        if constraints::is_eligible(week, ctx, member, slot) {
            ctx.assign(slot, member);
            if let Some(replacement) = pick(week, ctx, held, Some(member), rng) {
                ctx.assign(held, replacement);
                return true;
            }
            ctx.unassign(slot);
        }
        ctx.assign(held, member);
    }
    false
}

/// Balance heuristic of a fallback attempt. Higher is better.
pub fn balance_score(week: &Week<'_>, ctx: &AttemptContext, unassigned: usize) -> f64 {
    let counts: Vec<ShiftCounts> = week.participants().map(|m| ctx.counts(m)).collect();
    let n = counts.len().max(1) as f64;
    let mean = counts.iter().map(|c| f64::from(c.total)).sum::<f64>() / n;

    let mut score = -(unassigned as f64) * UNASSIGNED_SLOT;
    for c in &counts {
        score -= (f64::from(c.total) - mean).abs() * TOTAL_DEVIATION;
        if c.morning > 0 {
            score += HAS_MORNING;
        }
        if c.evening > 0 {
            score += HAS_EVENING;
        }
        if c.night > 0 {
            score += HAS_NIGHT;
        }
        score -= f64::from(c.morning.saturating_sub(MORNINGS_SOFT_CAP)) * 10.0;
        score -= f64::from(c.evening.saturating_sub(EVENINGS_SOFT_CAP)) * 5.0;
        score -= f64::from(c.night.saturating_sub(NIGHTS_SOFT_CAP)) * 5.0;
    }
    score
}
