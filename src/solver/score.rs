//! Penalty score of a completed attempt. Lower is better, zero is perfect.

use itertools::{Itertools, MinMaxResult};

use crate::data::ShiftType;

use super::context::{AttemptContext, ShiftCounts};
use super::week::Week;

const UNFILLED_SLOT: i64 = 10_000;
const NO_MORNING: i64 = 2_000;
const UNDER_MINIMUM: i64 = 800;
const OVER_MAXIMUM: i64 = 600;
const TYPE_RANGE: i64 = 80;
const BACK_TO_BACK: i64 = 30;

pub const MIN_SHIFTS: u32 = 3;
pub const MAX_SHIFTS: u32 = 5;

/// The score split by objective, mostly for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub unfilled: i64,
    pub fairness: i64,
    pub morning_coverage: i64,
    pub load: i64,
    pub type_balance: i64,
    pub back_to_back: i64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> i64 {
        self.unfilled
            + self.fairness
            + self.morning_coverage
            + self.load
            + self.type_balance
            + self.back_to_back
    }
}

pub fn evaluate(week: &Week<'_>, ctx: &AttemptContext) -> i64 {
    breakdown(week, ctx).total()
}

pub fn breakdown(week: &Week<'_>, ctx: &AttemptContext) -> ScoreBreakdown {
    let counts: Vec<ShiftCounts> = week.participants().map(|m| ctx.counts(m)).collect();

    let unfilled = week
        .slots()
        .iter()
        .filter(|&&slot| ctx.occupant(slot).is_none())
        .count() as i64;

    let gap = range(counts.iter().map(|c| c.total));
    let fairness = match gap {
        g if g > 2 => g * 1_000,
        2 => 2 * 500,
        g => g * 100,
    };

    let morning_coverage = week
        .participants()
        .filter(|&m| ctx.counts(m).morning == 0 && week.offered_mornings(m) > 0)
        .count() as i64
        * NO_MORNING;

    let load = counts
        .iter()
        .map(|c| {
            let under = i64::from(MIN_SHIFTS.saturating_sub(c.total)) * UNDER_MINIMUM;
            let over = i64::from(c.total.saturating_sub(MAX_SHIFTS)) * OVER_MAXIMUM;
            under + over
        })
        .sum();

    let type_balance = ShiftType::ALL
        .iter()
        .map(|&shift| range(counts.iter().map(|c| c.of(shift))))
        .sum::<i64>()
        * TYPE_RANGE;

    let back_to_back = week
        .participants()
        .map(|m| ctx.back_to_back(m) as i64)
        .sum::<i64>()
        * BACK_TO_BACK;

    ScoreBreakdown {
        unfilled: unfilled * UNFILLED_SLOT,
        fairness,
        morning_coverage,
        load,
        type_balance,
        back_to_back,
    }
}

/// max - min, zero for fewer than two values.
pub(crate) fn range(values: impl Iterator<Item = u32>) -> i64 {
    match values.minmax() {
        MinMaxResult::MinMax(min, max) => i64::from(max - min),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Availability, AvailabilityStatus, Slot};
    use crate::solver::week::fixtures::{request, sunday};

    fn fill(ctx: &mut AttemptContext, cells: &[(u8, ShiftType, usize)]) {
        for &(day, shift, member) in cells {
            ctx.assign(Slot::new(day, shift), member);
        }
    }

    #[test]
    fn test_empty_grid_penalizes_every_slot() {
        let req = request(&["Dana"]);
        let week = Week::new(&req).unwrap();
        let ctx = AttemptContext::seeded(&week);

        let score = breakdown(&week, &ctx);
        assert_eq!(score.unfilled, 16 * 10_000);
        assert_eq!(score.load, 3 * 800);
        assert_eq!(score.fairness, 0);
    }

    #[test]
    fn test_fairness_tiers() {
        let req = request(&["Dana", "Noa"]);
        let week = Week::new(&req).unwrap();

        let mut ctx = AttemptContext::seeded(&week);
        fill(&mut ctx, &[(0, ShiftType::Evening, 0), (1, ShiftType::Evening, 0)]);
        assert_eq!(breakdown(&week, &ctx).fairness, 1_000);

        fill(&mut ctx, &[(3, ShiftType::Evening, 0)]);
        assert_eq!(breakdown(&week, &ctx).fairness, 3_000);

        let mut one = AttemptContext::seeded(&week);
        fill(&mut one, &[(0, ShiftType::Evening, 0)]);
        assert_eq!(breakdown(&week, &one).fairness, 100);
    }

    #[test]
    fn test_missing_morning_only_counts_when_offered() {
        let mut req = request(&["Dana", "Noa"]);
        req.availabilities = vec![
            Availability::new("e1", sunday())
                .with_status(2, ShiftType::Morning, AvailabilityStatus::Available),
        ];
        let week = Week::new(&req).unwrap();
        let ctx = AttemptContext::seeded(&week);

        assert_eq!(breakdown(&week, &ctx).morning_coverage, 2_000);
    }

    #[test]
    fn test_load_and_balance_penalties() {
        let req = request(&["Dana", "Noa"]);
        let week = Week::new(&req).unwrap();
        let mut ctx = AttemptContext::seeded(&week);
        fill(
            &mut ctx,
            &[
                (0, ShiftType::Evening, 0),
                (1, ShiftType::Morning, 0),
                (3, ShiftType::Night, 0),
                (4, ShiftType::Evening, 0),
                (5, ShiftType::Morning, 1),
            ],
        );

        let score = breakdown(&week, &ctx);
        // Dana: 4 shifts, Noa: 1 shift
        assert_eq!(score.load, 2 * 800);
        // morning 1-1, evening 2-0, night 1-0
        assert_eq!(score.type_balance, (0 + 2 + 1) * 80);
        // evening->morning on days 0-1, night->evening on days 3-4
        assert_eq!(score.back_to_back, 2 * 30);
        assert_eq!(score.fairness, 3 * 1_000);
    }

    #[test]
    fn test_range_of_single_value_is_zero() {
        assert_eq!(range([4].into_iter()), 0);
        assert_eq!(range([4, 1, 6].into_iter()), 5);
    }
}
