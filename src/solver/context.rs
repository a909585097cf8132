use crate::data::{DAYS_IN_WEEK, Day, ShiftType, Slot, WeekAssignments};

use super::week::{Member, Week};

type Grid = [[Option<Member>; 3]; DAYS_IN_WEEK as usize];

/// Running per-employee tally of one attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShiftCounts {
    pub morning: u32,
    pub evening: u32,
    pub night: u32,
    pub total: u32,
}

impl ShiftCounts {
    pub fn of(&self, shift_type: ShiftType) -> u32 {
        match shift_type {
            ShiftType::Morning => self.morning,
            ShiftType::Evening => self.evening,
            ShiftType::Night => self.night,
        }
    }

    fn slot_mut(&mut self, shift_type: ShiftType) -> &mut u32 {
        match shift_type {
            ShiftType::Morning => &mut self.morning,
            ShiftType::Evening => &mut self.evening,
            ShiftType::Night => &mut self.night,
        }
    }

    fn add(&mut self, shift_type: ShiftType) {
        *self.slot_mut(shift_type) += 1;
        self.total += 1;
    }

    fn remove(&mut self, shift_type: ShiftType) {
        *self.slot_mut(shift_type) -= 1;
        self.total -= 1;
    }
}

/// The in-progress state of a single attempt.
///
/// Every attempt works on its own value, so attempts never observe each
/// other's partial assignments.
#[derive(Debug, Clone)]
pub struct AttemptContext {
    grid: Grid,
    counts: Vec<ShiftCounts>,
}

impl AttemptContext {
    /// A context with the week's pinned cells already in place.
    pub fn seeded(week: &Week<'_>) -> Self {
        let mut context = Self {
            grid: [[None; 3]; DAYS_IN_WEEK as usize],
            counts: vec![ShiftCounts::default(); week.staff_count()],
        };
        for pin in week.pins() {
            context.assign(pin.slot, pin.member);
        }
        context
    }

    pub fn occupant(&self, slot: Slot) -> Option<Member> {
        self.grid[usize::from(slot.day)][slot.shift_type.index()]
    }

    pub fn assign(&mut self, slot: Slot, member: Member) {
        if let Some(previous) = self.occupant(slot) {
            self.counts[previous].remove(slot.shift_type);
        }
        self.grid[usize::from(slot.day)][slot.shift_type.index()] = Some(member);
        self.counts[member].add(slot.shift_type);
    }

    pub fn unassign(&mut self, slot: Slot) -> Option<Member> {
        let previous = self.grid[usize::from(slot.day)][slot.shift_type.index()].take();
        if let Some(member) = previous {
            self.counts[member].remove(slot.shift_type);
        }
        previous
    }

    pub fn counts(&self, member: Member) -> ShiftCounts {
        self.counts[member]
    }

    pub fn holds(&self, member: Member, day: Day, shift_type: ShiftType) -> bool {
        day < DAYS_IN_WEEK && self.grid[usize::from(day)][shift_type.index()] == Some(member)
    }

    /// Whether `member` holds any shift on `day` shifted by `offset` days.
    /// Days outside the week are never worked.
    pub fn works_on(&self, member: Member, day: Day, offset: i8) -> bool {
        match day.checked_add_signed(offset) {
            Some(d) if d < DAYS_IN_WEEK => {
                self.grid[usize::from(d)].iter().any(|cell| *cell == Some(member))
            }
            _ => false,
        }
    }

    /// The slot `member` holds on `day`, if any.
    pub fn shift_on(&self, member: Member, day: Day) -> Option<Slot> {
        ShiftType::ALL
            .iter()
            .find(|&&shift| self.holds(member, day, shift))
            .map(|&shift| Slot::new(day, shift))
    }

    /// Evening followed by next-day morning, or night followed by next-day evening.
    pub fn back_to_back(&self, member: Member) -> usize {
        (0..DAYS_IN_WEEK - 1)
            .map(|day| {
                let short_turnaround = self.holds(member, day, ShiftType::Evening)
                    && self.holds(member, day + 1, ShiftType::Morning);
                let late_turnaround = self.holds(member, day, ShiftType::Night)
                    && self.holds(member, day + 1, ShiftType::Evening);
                usize::from(short_turnaround) + usize::from(late_turnaround)
            })
            .sum()
    }

    /// Converts to the wire grid; every shift of `days` is present.
    pub fn to_assignments(&self, week: &Week<'_>, days: std::ops::Range<Day>) -> WeekAssignments {
        let mut assignments = WeekAssignments::empty(days.clone());
        for day in days {
            for shift in ShiftType::ALL {
                let slot = Slot::new(day, shift);
                if let Some(member) = self.occupant(slot) {
                    assignments.set(slot, Some(week.member(member).id.to_string()));
                }
            }
        }
        assignments
    }
}
