//! Pre-flight and post-generation warnings.
//!
//! Nothing here blocks a schedule; every diagnostic is a warning that the
//! caller shows next to the result.

use log::debug;

use crate::data::{Diagnostic, DiagnosticKind, Slot};
use crate::solver::context::AttemptContext;
use crate::solver::score::MIN_SHIFTS;
use crate::solver::week::{Member, Week};

const MIN_USABLE_SLOTS: usize = 3;
const MAX_FAIR_GAP: u32 = 2;
/// Employees away this many days are not expected to offer a morning.
const VACATION_EXEMPTION_DAYS: usize = 3;

fn about(week: &Week<'_>, member: Member, diagnostic: Diagnostic) -> Diagnostic {
    let staff = week.member(member);
    diagnostic.about(staff.id, staff.name)
}

fn describe(week: &Week<'_>, slot: Slot) -> String {
    format!("{} ({})", slot, week.date_of(slot.day))
}

/// Checks the inputs before any search runs.
pub fn preflight(week: &Week<'_>) -> Vec<Diagnostic> {
    let mut warnings = Vec::new();

    for member in week.participants() {
        let name = week.member(member).name;
        if !week.has_submission(member) {
            warnings.push(about(
                week,
                member,
                Diagnostic::warning(
                    DiagnosticKind::MissingAvailability,
                    format!("{} has not submitted availability for this week", name),
                ),
            ));
            continue;
        }

        let usable = week
            .slots()
            .iter()
            .filter(|&&slot| week.allows(member, slot) && !week.on_vacation(member, slot.day))
            .count();
        if usable < MIN_USABLE_SLOTS {
            warnings.push(about(
                week,
                member,
                Diagnostic::warning(
                    DiagnosticKind::FewAvailableShifts,
                    format!(
                        "{} is available for only {} shifts (fewer than {})",
                        name, usable, MIN_USABLE_SLOTS
                    ),
                ),
            ));
        }

        if week.offered_mornings(member) == 0 && week.vacation_days(member) < VACATION_EXEMPTION_DAYS {
            warnings.push(about(
                week,
                member,
                Diagnostic::warning(
                    DiagnosticKind::NoMorningOffered,
                    format!("{} did not mark any morning shift as available", name),
                ),
            ));
        }
    }

    for &slot in week.slots() {
        if week.is_pinned(slot) {
            continue;
        }
        let covered = week
            .participants()
            .any(|m| week.allows(m, slot) && !week.on_vacation(m, slot.day));
        if !covered {
            warnings.push(Diagnostic::warning(
                DiagnosticKind::UncoveredShift,
                format!("Nobody is available for {}", describe(week, slot)),
            ));
        }
    }

    debug!("Pre-flight produced {} warnings", warnings.len());
    warnings
}

/// One warning per slot left empty by the fallback.
pub fn unassigned_warnings(week: &Week<'_>, slots: &[Slot]) -> Vec<Diagnostic> {
    slots
        .iter()
        .map(|&slot| {
            Diagnostic::warning(
                DiagnosticKind::UnassignedShift,
                format!("No employee could be assigned to {}", describe(week, slot)),
            )
        })
        .collect()
}

/// Quality review of the final assignment, whichever strategy produced it.
pub fn review(week: &Week<'_>, ctx: &AttemptContext) -> Vec<Diagnostic> {
    let mut warnings = Vec::new();

    for member in week.participants() {
        let name = week.member(member).name;
        let counts = ctx.counts(member);

        if counts.morning == 0 && week.offered_mornings(member) > 0 {
            warnings.push(about(
                week,
                member,
                Diagnostic::warning(
                    DiagnosticKind::NoMorningAssigned,
                    format!("{} got no morning shift despite offering mornings", name),
                ),
            ));
        }
        if counts.total < MIN_SHIFTS {
            warnings.push(about(
                week,
                member,
                Diagnostic::warning(
                    DiagnosticKind::BelowMinimumShifts,
                    format!(
                        "{} has only {} shifts (fewer than {})",
                        name, counts.total, MIN_SHIFTS
                    ),
                ),
            ));
        } else if counts.morning == counts.total {
            warnings.push(about(
                week,
                member,
                Diagnostic::warning(
                    DiagnosticKind::MorningsOnly,
                    format!("{} has only morning shifts ({})", name, counts.total),
                ),
            ));
        }
    }

    let most = week.participants().max_by_key(|&m| (ctx.counts(m).total, std::cmp::Reverse(m)));
    let least = week.participants().min_by_key(|&m| (ctx.counts(m).total, m));
    if let (Some(most), Some(least)) = (most, least) {
        let (max, min) = (ctx.counts(most).total, ctx.counts(least).total);
        if max - min > MAX_FAIR_GAP {
            warnings.push(Diagnostic::warning(
                DiagnosticKind::FairnessGap,
                format!(
                    "Shift gap: {} has {} shifts, {} has {} shifts",
                    week.member(most).name,
                    max,
                    week.member(least).name,
                    min
                ),
            ));
        }
    }

    for member in week.participants() {
        let count = ctx.back_to_back(member);
        if count > 0 {
            warnings.push(about(
                week,
                member,
                Diagnostic::warning(
                    DiagnosticKind::BackToBack,
                    format!(
                        "{} has {} back-to-back shifts",
                        week.member(member).name,
                        count
                    ),
                ),
            ));
        }
    }

    warnings
}
