//! Read-only snapshot of one generation run.
//!
//! Employees are addressed by index ("member") inside the engine. The
//! participating employees come first, followed by any outsiders that only
//! appear as occupants of pinned cells (e.g. an employee deactivated after a
//! cell was locked). Outsiders keep their cells but are never candidates.

use std::collections::{HashMap, HashSet};
use std::ops::Range;

use chrono::{Days, NaiveDate};
use log::{debug, warn};

use crate::data::{
    Availability, CellFlags, DAYS_IN_WEEK, Day, Employee, FRIDAY, GenerationRequest, HolidayKind,
    SATURDAY, ShiftType, Slot,
};
use crate::error::EngineError;

pub type Member = usize;

#[derive(Debug, Clone)]
pub struct StaffMember<'a> {
    pub id: &'a str,
    pub name: &'a str,
}

/// A cell carried over from the existing schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pin {
    pub slot: Slot,
    pub member: Member,
    /// Frozen pins leave their owner in rotation; locked pins are plain carry-overs.
    pub frozen: bool,
}

#[derive(Debug)]
pub struct Week<'a> {
    start: NaiveDate,
    staff: Vec<StaffMember<'a>>,
    participants: usize,
    availability: Vec<Option<&'a Availability>>,
    vacations: Vec<HashSet<NaiveDate>>,
    offered_mornings: Vec<usize>,
    holidays: HashMap<NaiveDate, HolidayKind>,
    slots: Vec<Slot>,
    pins: Vec<Pin>,
}

impl<'a> Week<'a> {
    pub fn new(request: &'a GenerationRequest) -> Result<Self, EngineError> {
        let start = request.week_start;

        if let Some(existing) = &request.existing_schedule {
            if existing.week_start != start {
                return Err(EngineError::WeekMismatch {
                    expected: start,
                    found: existing.week_start,
                });
            }
        }

        let mut seen = HashSet::new();
        let employees: Vec<&Employee> = request
            .employees
            .iter()
            .filter(|e| e.participates())
            .filter(|e| {
                let fresh = seen.insert(e.id.as_str());
                if !fresh {
                    warn!("Duplicate employee id '{}' ignored", e.id);
                }
                fresh
            })
            .collect();

        if employees.is_empty() {
            return Err(EngineError::NoActiveEmployees);
        }

        let mut staff: Vec<StaffMember<'a>> = employees
            .iter()
            .map(|e| StaffMember {
                id: &e.id,
                name: &e.name,
            })
            .collect();
        let participants = staff.len();
        let mut index: HashMap<&'a str, Member> =
            staff.iter().enumerate().map(|(i, m)| (m.id, i)).collect();

        let availability_by_id: HashMap<&str, &Availability> = request
            .availabilities
            .iter()
            .filter(|a| {
                let current = a.week_start == start;
                if !current {
                    debug!(
                        "Ignoring availability of '{}' for week {}",
                        a.employee_id, a.week_start
                    );
                }
                current
            })
            .map(|a| (a.employee_id.as_str(), a))
            .collect();

        let holidays: HashMap<NaiveDate, HolidayKind> =
            request.holidays.iter().map(|h| (h.date, h.kind)).collect();

        let mut week = Week {
            start,
            staff: Vec::new(),
            participants,
            availability: Vec::new(),
            vacations: Vec::new(),
            offered_mornings: Vec::new(),
            holidays,
            slots: Vec::new(),
            pins: Vec::new(),
        };
        week.slots = week.structural_slots(0..SATURDAY);

        let pins = match &request.existing_schedule {
            Some(existing) => {
                let mut pins = Vec::new();
                let locked = existing.locked_assignments.as_ref();
                let frozen = existing.frozen_assignments.as_ref();
                for (slot, occupant) in existing.assignments.filled() {
                    let is_locked = locked.is_some_and(|flags| flag_set(flags, slot));
                    let is_frozen = frozen.is_some_and(|flags| flag_set(flags, slot));
                    if !is_locked && !is_frozen {
                        continue;
                    }
                    if !week.is_structural(slot) {
                        warn!("Dropping pinned {} ({}): slot is closed this week", slot, occupant);
                        continue;
                    }
                    let member = *index.entry(occupant).or_insert_with(|| {
                        staff.push(StaffMember {
                            id: occupant,
                            name: occupant,
                        });
                        staff.len() - 1
                    });
                    let pin = Pin {
                        slot,
                        member,
                        frozen: is_frozen && !is_locked,
                    };
                    debug!(
                        "Keeping {} cell {} for {}",
                        if pin.frozen { "frozen" } else { "locked" },
                        slot,
                        occupant
                    );
                    pins.push(pin);
                }
                pins
            }
            None => Vec::new(),
        };

        let mut vacations = vec![HashSet::new(); staff.len()];
        for vacation in &request.vacations {
            if let Some(&member) = index.get(vacation.employee_id.as_str()) {
                vacations[member].insert(vacation.date);
            }
        }

        week.availability = staff
            .iter()
            .map(|m| availability_by_id.get(m.id).copied())
            .collect();
        week.offered_mornings = week
            .availability
            .iter()
            .map(|a| a.map_or(0, |a| a.offered_mornings()))
            .collect();
        week.vacations = vacations;
        week.staff = staff;
        week.pins = pins;

        Ok(week)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn date_of(&self, day: Day) -> NaiveDate {
        self.start + Days::new(u64::from(day))
    }

    /// Whether a slot exists at all this week.
    ///
    /// Saturday never has slots, Friday only has a morning, holidays close
    /// all or part of their date.
    pub fn is_structural(&self, slot: Slot) -> bool {
        if slot.day >= SATURDAY {
            return false;
        }
        if slot.day == FRIDAY && slot.shift_type != ShiftType::Morning {
            return false;
        }
        match self.holidays.get(&self.date_of(slot.day)) {
            Some(kind) => !kind.blocks(slot.shift_type),
            None => true,
        }
    }

    /// Structural slots of `days`, chronologically ordered.
    pub fn structural_slots(&self, days: Range<Day>) -> Vec<Slot> {
        days.flat_map(|day| ShiftType::ALL.iter().map(move |&shift| Slot::new(day, shift)))
            .filter(|&slot| self.is_structural(slot))
            .collect()
    }

    /// Structural slots searched by the optimizer (Sunday to Friday).
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Structural slots over the full calendar week, Saturday included.
    pub fn calendar_slots(&self) -> Vec<Slot> {
        self.structural_slots(0..DAYS_IN_WEEK)
    }

    pub fn participants(&self) -> Range<Member> {
        0..self.participants
    }

    pub fn participant_count(&self) -> usize {
        self.participants
    }

    pub fn is_participant(&self, member: Member) -> bool {
        member < self.participants
    }

    pub fn staff_count(&self) -> usize {
        self.staff.len()
    }

    pub fn member(&self, member: Member) -> &StaffMember<'a> {
        &self.staff[member]
    }

    pub fn has_submission(&self, member: Member) -> bool {
        self.availability[member].is_some()
    }

    /// Submitted availability only. A member without a submission is available everywhere.
    pub fn allows(&self, member: Member, slot: Slot) -> bool {
        self.availability[member].is_none_or(|a| a.allows(slot.day, slot.shift_type))
    }

    pub fn on_vacation(&self, member: Member, day: Day) -> bool {
        self.vacations[member].contains(&self.date_of(day))
    }

    /// Vacation or sick days falling inside this calendar week.
    pub fn vacation_days(&self, member: Member) -> usize {
        let end = self.date_of(SATURDAY);
        self.vacations[member]
            .iter()
            .filter(|&&date| date >= self.start && date <= end)
            .count()
    }

    /// Mornings explicitly marked available in the member's submission.
    pub fn offered_mornings(&self, member: Member) -> usize {
        self.offered_mornings[member]
    }

    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }

    pub fn is_pinned(&self, slot: Slot) -> bool {
        self.pins.iter().any(|pin| pin.slot == slot)
    }
}

fn flag_set(flags: &CellFlags, slot: Slot) -> bool {
    flags
        .get(&slot.day)
        .and_then(|shifts| shifts.get(&slot.shift_type))
        .copied()
        .unwrap_or(false)
}


#[cfg(test)]
mod tests {
    use super::fixtures::{request, sunday};
    use super::*;
    use crate::data::{
        AvailabilityStatus, Holiday, Schedule, VacationDay, WeekAssignments,
    };
    use chrono::Utc;

    #[test]
    fn test_structural_slots_without_holidays() {
        let req = request(&["Dana"]);
        let week = Week::new(&req).unwrap();

        assert_eq!(week.slots().len(), 16);
        assert!(week.slots().iter().all(|s| s.day < SATURDAY));
        assert!(!week.is_structural(Slot::new(5, ShiftType::Evening)));
        assert!(!week.is_structural(Slot::new(6, ShiftType::Morning)));
        assert_eq!(week.calendar_slots(), week.slots().to_vec());
    }

    #[test]
    fn test_holidays_close_slots() {
        let mut req = request(&["Dana"]);
        req.holidays = vec![
            Holiday {
                date: sunday() + Days::new(1),
                name: "Closed".into(),
                kind: HolidayKind::NoWork,
            },
            Holiday {
                date: sunday() + Days::new(3),
                name: "Short day".into(),
                kind: HolidayKind::MorningOnly,
            },
        ];
        let week = Week::new(&req).unwrap();

        assert_eq!(week.slots().len(), 16 - 3 - 2);
        assert!(!week.is_structural(Slot::new(1, ShiftType::Morning)));
        assert!(week.is_structural(Slot::new(3, ShiftType::Morning)));
        assert!(!week.is_structural(Slot::new(3, ShiftType::Night)));
    }

    #[test]
    fn test_no_participants_is_an_error() {
        let mut req = request(&["Dana"]);
        req.employees[0].is_active = false;
        assert_eq!(Week::new(&req).unwrap_err(), EngineError::NoActiveEmployees);
    }

    #[test]
    fn test_other_week_availability_is_ignored() {
        let mut req = request(&["Dana"]);
        req.availabilities = vec![
            Availability::new("e1", sunday() + Days::new(7))
                .with_status(0, ShiftType::Morning, AvailabilityStatus::Unavailable),
        ];
        let week = Week::new(&req).unwrap();

        assert!(!week.has_submission(0));
        assert!(week.allows(0, Slot::new(0, ShiftType::Morning)));
    }

    #[test]
    fn test_vacation_lookup_by_date() {
        let mut req = request(&["Dana", "Noa"]);
        req.vacations = vec![
            VacationDay::new("e2", sunday() + Days::new(2)),
            VacationDay::new("e2", sunday() + Days::new(9)),
        ];
        let week = Week::new(&req).unwrap();

        assert!(week.on_vacation(1, 2));
        assert!(!week.on_vacation(0, 2));
        assert_eq!(week.vacation_days(1), 1);
    }

    #[test]
    fn test_pins_from_existing_schedule() {
        let mut req = request(&["Dana", "Noa"]);
        let mut assignments = WeekAssignments::empty(0..6);
        assignments.set(Slot::new(0, ShiftType::Morning), Some("e2".into()));
        assignments.set(Slot::new(1, ShiftType::Night), Some("gone".into()));
        assignments.set(Slot::new(5, ShiftType::Night), Some("e1".into()));
        assignments.set(Slot::new(2, ShiftType::Evening), Some("e1".into()));

        let mut locked = CellFlags::new();
        locked.entry(0).or_default().insert(ShiftType::Morning, true);
        locked.entry(5).or_default().insert(ShiftType::Night, true);
        let mut frozen = CellFlags::new();
        frozen.entry(1).or_default().insert(ShiftType::Night, true);

        req.existing_schedule = Some(Schedule {
            id: "s1".into(),
            week_start: sunday(),
            assignments,
            locked_assignments: Some(locked),
            frozen_assignments: Some(frozen),
            created_at: Utc::now(),
            created_by: "manager".into(),
        });
        let week = Week::new(&req).unwrap();

        assert_eq!(week.pins().len(), 2);
        assert_eq!(
            week.pins()[0],
            Pin {
                slot: Slot::new(0, ShiftType::Morning),
                member: 1,
                frozen: false
            }
        );
        let outsider = week.pins()[1].member;
        assert!(week.pins()[1].frozen);
        assert!(!week.is_participant(outsider));
        assert_eq!(week.member(outsider).id, "gone");
        assert!(!week.is_pinned(Slot::new(2, ShiftType::Evening)));
    }

    #[test]
    fn test_existing_schedule_of_other_week_is_rejected() {
        let mut req = request(&["Dana"]);
        req.existing_schedule = Some(Schedule {
            id: "s1".into(),
            week_start: sunday() + Days::new(7),
            assignments: WeekAssignments::empty(0..6),
            locked_assignments: None,
            frozen_assignments: None,
            created_at: Utc::now(),
            created_by: "manager".into(),
        });

        assert!(matches!(
            Week::new(&req).unwrap_err(),
            EngineError::WeekMismatch { .. }
        ));
    }
}
