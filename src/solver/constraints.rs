//! Hard rules deciding whether an employee may take a slot.
//!
//! All checks are pure functions of the week snapshot and the attempt's
//! partial assignment.

use crate::data::{Day, FRIDAY, ShiftType, Slot};

use super::context::AttemptContext;
use super::week::{Member, Week};

/// The first hard rule a candidate fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligibility {
    NotParticipant,
    Unavailable,
    OnVacation,
    SameDay,
    MorningAfterNight,
    NightBeforeMorning,
    ThirdConsecutiveDay,
}

pub fn check(
    week: &Week<'_>,
    ctx: &AttemptContext,
    member: Member,
    slot: Slot,
) -> Result<(), Ineligibility> {
    if !week.is_participant(member) {
        return Err(Ineligibility::NotParticipant);
    }
    if !week.allows(member, slot) {
        return Err(Ineligibility::Unavailable);
    }
    if week.on_vacation(member, slot.day) {
        return Err(Ineligibility::OnVacation);
    }
    // one shift per day, pinned cells included
    if ctx.works_on(member, slot.day, 0) {
        return Err(Ineligibility::SameDay);
    }
    check_rest(ctx, member, slot)?;
    if completes_three_day_run(ctx, member, slot.day) {
        return Err(Ineligibility::ThirdConsecutiveDay);
    }
    Ok(())
}

pub fn is_eligible(week: &Week<'_>, ctx: &AttemptContext, member: Member, slot: Slot) -> bool {
    check(week, ctx, member, slot).is_ok()
}

/// Night runs until the next morning starts, so night on `d` and morning on
/// `d + 1` cannot both be held.
fn check_rest(ctx: &AttemptContext, member: Member, slot: Slot) -> Result<(), Ineligibility> {
    match slot.shift_type {
        ShiftType::Morning if slot.day > 0 && ctx.holds(member, slot.day - 1, ShiftType::Night) => {
            Err(Ineligibility::MorningAfterNight)
        }
        ShiftType::Night if slot.day < FRIDAY && ctx.holds(member, slot.day + 1, ShiftType::Morning) => {
            Err(Ineligibility::NightBeforeMorning)
        }
        _ => Ok(()),
    }
}

/// Taking `day` would give `member` three working days in a row.
///
/// Every window containing `day` is checked, so the rule holds no matter in
/// which order the slots are filled.
pub fn completes_three_day_run(ctx: &AttemptContext, member: Member, day: Day) -> bool {
    let worked = |offset: i8| ctx.works_on(member, day, offset);
    (worked(-2) && worked(-1)) || (worked(-1) && worked(1)) || (worked(1) && worked(2))
}
