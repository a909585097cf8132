//! Greedy choice among the eligible employees of a slot.
//!
//! Lower desirability is better. The weights push towards an even total,
//! at least one morning per employee (employees who offered only one or two
//! mornings go first) and an even spread of each shift type.

use rand::Rng;

use crate::data::{ShiftType, Slot};

use super::context::AttemptContext;
use super::week::{Member, Week};

const BELOW_AVERAGE_TOTAL: f64 = 500.0;
const FIRST_MORNING: f64 = 1000.0;
const ONLY_ONE_MORNING_OFFERED: f64 = 5000.0;
const ONLY_TWO_MORNINGS_OFFERED: f64 = 3000.0;
const BELOW_AVERAGE_TYPE: f64 = 300.0;
const SHORT_TURNAROUND: f64 = 50.0;
const JITTER: f64 = 5.0;

/// Participant averages at the moment a slot is filled.
#[derive(Debug, Clone, Copy, Default)]
pub struct Averages {
    pub total: f64,
    pub morning: f64,
    pub evening: f64,
    pub night: f64,
}

impl Averages {
    pub fn of(week: &Week<'_>, ctx: &AttemptContext) -> Self {
        let n = week.participant_count().max(1) as f64;
        let mut sums = Averages::default();
        for member in week.participants() {
            let counts = ctx.counts(member);
            sums.total += f64::from(counts.total);
            sums.morning += f64::from(counts.morning);
            sums.evening += f64::from(counts.evening);
            sums.night += f64::from(counts.night);
        }
        Averages {
            total: sums.total / n,
            morning: sums.morning / n,
            evening: sums.evening / n,
            night: sums.night / n,
        }
    }

    fn of_type(&self, shift_type: ShiftType) -> f64 {
        match shift_type {
            ShiftType::Morning => self.morning,
            ShiftType::Evening => self.evening,
            ShiftType::Night => self.night,
        }
    }
}

/// Heuristic score of giving `slot` to `member`, without jitter.
pub fn desirability(
    week: &Week<'_>,
    ctx: &AttemptContext,
    averages: &Averages,
    member: Member,
    slot: Slot,
) -> f64 {
    let counts = ctx.counts(member);
    let mut score = 0.0;

    let total = f64::from(counts.total);
    if total < averages.total {
        score -= (averages.total - total) * BELOW_AVERAGE_TOTAL;
    }

    if slot.shift_type == ShiftType::Morning && counts.morning == 0 {
        score -= FIRST_MORNING;
        match week.offered_mornings(member) {
            1 => score -= ONLY_ONE_MORNING_OFFERED,
            2 => score -= ONLY_TWO_MORNINGS_OFFERED,
            _ => {}
        }
    }

    if f64::from(counts.of(slot.shift_type)) < averages.of_type(slot.shift_type) {
        score -= BELOW_AVERAGE_TYPE;
    }

    score + SHORT_TURNAROUND * short_turnarounds(ctx, member, slot) as f64
}

/// Back-to-back pairs that taking `slot` would create for `member`.
fn short_turnarounds(ctx: &AttemptContext, member: Member, slot: Slot) -> u32 {
    let day = slot.day;
    let before = |shift| day > 0 && ctx.holds(member, day - 1, shift);
    let after = |shift| ctx.holds(member, day + 1, shift);

    let pairs = match slot.shift_type {
        ShiftType::Morning => [before(ShiftType::Evening), false],
        ShiftType::Evening => [before(ShiftType::Night), after(ShiftType::Morning)],
        ShiftType::Night => [after(ShiftType::Evening), false],
    };
    pairs.iter().filter(|&&created| created).count() as u32
}

/// Picks the most desirable candidate; `None` only when `candidates` is empty.
pub fn select_best<R: Rng + ?Sized>(
    week: &Week<'_>,
    ctx: &AttemptContext,
    slot: Slot,
    candidates: &[Member],
    rng: &mut R,
) -> Option<Member> {
    let averages = Averages::of(week, ctx);
    candidates
        .iter()
        .map(|&member| {
            let jitter = rng.random::<f64>() * JITTER;
            (member, desirability(week, ctx, &averages, member, slot) + jitter)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(member, _)| member)
}
