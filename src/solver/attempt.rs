use log::trace;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::data::Slot;

use super::candidate;
use super::constraints;
use super::context::AttemptContext;
use super::week::{Member, Week};

#[derive(Debug, Clone)]
pub enum AttemptResult {
    Complete(AttemptContext),
    /// No employee could legally take `slot`; nothing of the attempt is kept.
    Failed { slot: Slot },
}

/// One full pass over the open slots of the week, in random order.
///
/// `base` holds the pinned cells and is cloned, never modified.
pub fn run_attempt<R: Rng + ?Sized>(week: &Week<'_>, base: &AttemptContext, rng: &mut R) -> AttemptResult {
    let mut ctx = base.clone();

    let mut open: Vec<Slot> = week
        .slots()
        .iter()
        .copied()
        .filter(|&slot| !week.is_pinned(slot))
        .collect();
    open.shuffle(rng);

    for slot in open {
        let candidates: Vec<Member> = week
            .participants()
            .filter(|&member| constraints::is_eligible(week, &ctx, member, slot))
            .collect();

        let Some(chosen) = candidate::select_best(week, &ctx, slot, &candidates, rng) else {
            return AttemptResult::Failed { slot };
        };
        trace!(
            "{} -> {} ({} candidates)",
            slot,
            week.member(chosen).id,
            candidates.len()
        );
        ctx.assign(slot, chosen);
    }

    AttemptResult::Complete(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Availability, AvailabilityStatus, ShiftType};
    use crate::solver::week::fixtures::{request, sunday};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const TEAM: [&str; 8] = ["Dana", "Noa", "Omer", "Lior", "Yael", "Tal", "Gil", "Maya"];

    #[test]
    fn test_complete_attempt_fills_every_slot() {
        let req = request(&TEAM);
        let week = Week::new(&req).unwrap();
        let base = AttemptContext::seeded(&week);

        let mut completed = 0;
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            if let AttemptResult::Complete(ctx) = run_attempt(&week, &base, &mut rng) {
                completed += 1;
                for &slot in week.slots() {
                    assert!(ctx.occupant(slot).is_some());
                }
            }
        }
        assert!(completed > 0);
    }

    #[test]
    fn test_three_employees_cannot_cover_five_full_days() {
        // Sunday..Thursday each need three different people, which would
        // put everyone on five days in a row
        let req = request(&TEAM[..3]);
        let week = Week::new(&req).unwrap();
        let base = AttemptContext::seeded(&week);

        for seed in 0..10 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            assert!(matches!(
                run_attempt(&week, &base, &mut rng),
                AttemptResult::Failed { .. }
            ));
        }
    }

    #[test]
    fn test_attempt_fails_when_a_slot_has_no_candidate() {
        let mut req = request(&["Dana"]);
        req.availabilities = vec![
            Availability::new("e1", sunday())
                .with_status(0, ShiftType::Morning, AvailabilityStatus::Unavailable),
        ];
        let week = Week::new(&req).unwrap();
        let base = AttemptContext::seeded(&week);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        assert!(matches!(
            run_attempt(&week, &base, &mut rng),
            AttemptResult::Failed { .. }
        ));
    }

    #[test]
    fn test_same_seed_same_attempt() {
        let req = request(&["Dana", "Noa", "Omer", "Lior"]);
        let week = Week::new(&req).unwrap();
        let base = AttemptContext::seeded(&week);

        let first = run_attempt(&week, &base, &mut ChaCha8Rng::seed_from_u64(11));
        let second = run_attempt(&week, &base, &mut ChaCha8Rng::seed_from_u64(11));
        match (first, second) {
            (AttemptResult::Complete(a), AttemptResult::Complete(b)) => {
                for &slot in week.slots() {
                    assert_eq!(a.occupant(slot), b.occupant(slot));
                }
            }
            (AttemptResult::Failed { slot: a }, AttemptResult::Failed { slot: b }) => assert_eq!(a, b),
            _ => panic!("same seed produced different outcomes"),
        }
    }
}
