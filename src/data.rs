use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// Type aliases for clarity
pub type EmployeeId = String;
/// Day index within the week, 0 = Sunday.
pub type Day = u8;
/// Per-cell boolean flags, used for locked and frozen cells.
pub type CellFlags = BTreeMap<Day, BTreeMap<ShiftType, bool>>;

pub const DAYS_IN_WEEK: Day = 7;
pub const FRIDAY: Day = 5;
pub const SATURDAY: Day = 6;

/// One of the three daily shifts, in chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftType {
    Morning,
    Evening,
    Night,
}

impl ShiftType {
    pub const ALL: [ShiftType; 3] = [ShiftType::Morning, ShiftType::Evening, ShiftType::Night];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShiftType::Morning => "morning",
            ShiftType::Evening => "evening",
            ShiftType::Night => "night",
        }
    }
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single assignable cell of the weekly grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub day: Day,
    pub shift_type: ShiftType,
}

impl Slot {
    pub fn new(day: Day, shift_type: ShiftType) -> Self {
        Self { day, shift_type }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "day {} {}", self.day, self.shift_type)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Employee,
    Manager,
}

/// Represents a staff member that may be placed on shifts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub role: Role,
}

fn default_active() -> bool {
    true
}

impl Employee {
    pub fn new(id: impl Into<EmployeeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_active: true,
            role: Role::Employee,
        }
    }

    /// Only active employees with the employee role are scheduled.
    pub fn participates(&self) -> bool {
        self.is_active && self.role == Role::Employee
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityStatus {
    Available,
    Unavailable,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShiftAvailability {
    pub status: AvailabilityStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// An employee's submitted availability for one week.
///
/// The map is sparse: a missing day or shift counts as available.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub employee_id: EmployeeId,
    pub week_start: NaiveDate,
    #[serde(default)]
    pub shifts: BTreeMap<Day, BTreeMap<ShiftType, ShiftAvailability>>,
}

impl Availability {
    pub fn new(employee_id: impl Into<EmployeeId>, week_start: NaiveDate) -> Self {
        Self {
            employee_id: employee_id.into(),
            week_start,
            shifts: BTreeMap::new(),
        }
    }

    pub fn with_status(mut self, day: Day, shift_type: ShiftType, status: AvailabilityStatus) -> Self {
        self.shifts.entry(day).or_default().insert(
            shift_type,
            ShiftAvailability {
                status,
                comment: None,
            },
        );
        self
    }

    pub fn status(&self, day: Day, shift_type: ShiftType) -> Option<AvailabilityStatus> {
        self.shifts
            .get(&day)
            .and_then(|shifts| shifts.get(&shift_type))
            .map(|entry| entry.status)
    }

    /// True unless the cell is explicitly marked unavailable.
    pub fn allows(&self, day: Day, shift_type: ShiftType) -> bool {
        self.status(day, shift_type) != Some(AvailabilityStatus::Unavailable)
    }

    /// Mornings from Sunday to Friday explicitly marked available.
    pub fn offered_mornings(&self) -> usize {
        (0..=FRIDAY)
            .filter(|&day| self.status(day, ShiftType::Morning) == Some(AvailabilityStatus::Available))
            .count()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VacationKind {
    #[default]
    Vacation,
    Sick,
}

/// A single day an employee is away.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VacationDay {
    pub employee_id: EmployeeId,
    pub date: NaiveDate,
    #[serde(rename = "type", default)]
    pub kind: VacationKind,
}

impl VacationDay {
    pub fn new(employee_id: impl Into<EmployeeId>, date: NaiveDate) -> Self {
        Self {
            employee_id: employee_id.into(),
            date,
            kind: VacationKind::Vacation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HolidayKind {
    NoWork,
    MorningOnly,
}

impl HolidayKind {
    pub fn blocks(self, shift_type: ShiftType) -> bool {
        match self {
            HolidayKind::NoWork => true,
            HolidayKind::MorningOnly => shift_type != ShiftType::Morning,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Holiday {
    pub date: NaiveDate,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: HolidayKind,
}

/// The `day -> shift -> employee` grid of a schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct WeekAssignments(pub BTreeMap<Day, BTreeMap<ShiftType, Option<EmployeeId>>>);

impl WeekAssignments {
    /// A grid with every shift of `days` present and empty.
    pub fn empty(days: std::ops::Range<Day>) -> Self {
        let grid = days
            .map(|day| (day, ShiftType::ALL.iter().map(|&shift| (shift, None)).collect()))
            .collect();
        Self(grid)
    }

    pub fn get(&self, slot: Slot) -> Option<&str> {
        self.0
            .get(&slot.day)
            .and_then(|shifts| shifts.get(&slot.shift_type))
            .and_then(|occupant| occupant.as_deref())
    }

    pub fn set(&mut self, slot: Slot, employee_id: Option<EmployeeId>) {
        self.0.entry(slot.day).or_default().insert(slot.shift_type, employee_id);
    }

    /// Filled cells in chronological order.
    pub fn filled(&self) -> impl Iterator<Item = (Slot, &str)> + '_ {
        self.0.iter().flat_map(|(&day, shifts)| {
            shifts.iter().filter_map(move |(&shift, occupant)| {
                occupant.as_deref().map(|id| (Slot::new(day, shift), id))
            })
        })
    }

    pub fn filled_count(&self) -> usize {
        self.filled().count()
    }

    pub fn days(&self) -> impl Iterator<Item = Day> + '_ {
        self.0.keys().copied()
    }
}

/// A weekly schedule as stored by the caller.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: String,
    pub week_start: NaiveDate,
    pub assignments: WeekAssignments,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_assignments: Option<CellFlags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frozen_assignments: Option<CellFlags>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_creator")]
    pub created_by: String,
}

pub(crate) fn default_creator() -> String {
    "system".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Machine-readable category of a diagnostic. Not serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    NoActiveEmployees,
    WeekMismatch,
    NoFeasibleSolution,
    MissingAvailability,
    NoMorningOffered,
    FewAvailableShifts,
    UncoveredShift,
    UnassignedShift,
    BelowMinimumShifts,
    NoMorningAssigned,
    MorningsOnly,
    FairnessGap,
    BackToBack,
}

/// Describes an error or a quality warning attached to a generation result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    #[serde(rename = "type")]
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<EmployeeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,
    #[serde(skip)]
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            employee_id: None,
            employee_name: None,
            kind,
        }
    }

    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(kind, message)
        }
    }

    pub fn about(mut self, employee_id: &str, employee_name: &str) -> Self {
        self.employee_id = Some(employee_id.to_string());
        self.employee_name = Some(employee_name.to_string());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "[{}] {}", label, self.message)
    }
}

/// The complete input of one generation run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub availabilities: Vec<Availability>,
    #[serde(default)]
    pub vacations: Vec<VacationDay>,
    #[serde(default)]
    pub holidays: Vec<Holiday>,
    pub week_start: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_schedule: Option<Schedule>,
    /// Pins the random stream; a fresh seed is drawn when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl GenerationRequest {
    pub fn new(week_start: NaiveDate, employees: Vec<Employee>) -> Self {
        Self {
            employees,
            availabilities: Vec::new(),
            vacations: Vec::new(),
            holidays: Vec::new(),
            week_start,
            existing_schedule: None,
            seed: None,
            created_by: None,
        }
    }
}

/// Which strategy produced the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Optimized,
    Fallback,
}

/// The final output of the engine.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub schedule: Option<Schedule>,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimization_score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
    pub unassigned_shifts: Vec<Slot>,
}

impl GenerationResult {
    pub fn rejected(error: Diagnostic, warnings: Vec<Diagnostic>, attempts: u32) -> Self {
        Self {
            schedule: None,
            errors: vec![error],
            warnings,
            attempts,
            optimization_score: None,
            strategy: None,
            unassigned_shifts: Vec::new(),
        }
    }

    pub fn warnings_of(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn week_start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 2).unwrap()
    }

    #[test]
    fn test_missing_availability_entries_default_to_available() {
        let availability = Availability::new("e1", week_start())
            .with_status(0, ShiftType::Night, AvailabilityStatus::Unavailable)
            .with_status(1, ShiftType::Morning, AvailabilityStatus::Available);

        assert!(!availability.allows(0, ShiftType::Night));
        assert!(availability.allows(0, ShiftType::Morning));
        assert!(availability.allows(1, ShiftType::Morning));
        assert!(availability.allows(4, ShiftType::Evening));
        assert_eq!(availability.offered_mornings(), 1);
    }

    #[test]
    fn test_inactive_or_manager_does_not_participate() {
        let mut inactive = Employee::new("e1", "Dana");
        inactive.is_active = false;
        let mut manager = Employee::new("e2", "Noa");
        manager.role = Role::Manager;

        assert!(Employee::new("e3", "Omer").participates());
        assert!(!inactive.participates());
        assert!(!manager.participates());
    }

    #[test]
    fn test_holiday_blocks() {
        assert!(HolidayKind::NoWork.blocks(ShiftType::Morning));
        assert!(!HolidayKind::MorningOnly.blocks(ShiftType::Morning));
        assert!(HolidayKind::MorningOnly.blocks(ShiftType::Night));
    }

    #[test]
    fn test_request_parses_wire_format() {
        let json = r#"{
            "employees": [{"id": "e1", "name": "Dana", "isActive": true, "role": "employee"}],
            "availabilities": [{
                "employeeId": "e1",
                "weekStart": "2025-03-02",
                "shifts": {"0": {"morning": {"status": "unavailable", "comment": "exam"}}}
            }],
            "vacations": [{"employeeId": "e1", "date": "2025-03-04", "type": "sick"}],
            "holidays": [{"date": "2025-03-05", "name": "Purim", "type": "morning-only"}],
            "weekStart": "2025-03-02",
            "existingSchedule": {
                "id": "s1",
                "weekStart": "2025-03-02",
                "assignments": {"0": {"morning": "e1", "evening": null, "night": null}},
                "lockedAssignments": {"0": {"morning": true}},
                "createdAt": "2025-02-28T10:00:00Z",
                "createdBy": "manager"
            }
        }"#;

        let request: GenerationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.employees.len(), 1);
        assert!(!request.availabilities[0].allows(0, ShiftType::Morning));
        assert_eq!(request.vacations[0].kind, VacationKind::Sick);
        assert_eq!(request.holidays[0].kind, HolidayKind::MorningOnly);

        let existing = request.existing_schedule.unwrap();
        assert_eq!(existing.assignments.get(Slot::new(0, ShiftType::Morning)), Some("e1"));
        assert_eq!(existing.locked_assignments.unwrap()[&0][&ShiftType::Morning], true);
    }

    #[test]
    fn test_diagnostic_serializes_without_kind() {
        let diagnostic = Diagnostic::warning(DiagnosticKind::BackToBack, "Dana has 1 back-to-back shift")
            .about("e1", "Dana");
        let value = serde_json::to_value(&diagnostic).unwrap();

        assert_eq!(value["type"], "warning");
        assert_eq!(value["employeeId"], "e1");
        assert!(value.get("kind").is_none());
        assert_eq!(diagnostic.to_string(), "[warning] Dana has 1 back-to-back shift");
    }

    #[test]
    fn test_empty_grid_has_every_shift() {
        let grid = WeekAssignments::empty(0..6);
        assert_eq!(grid.days().count(), 6);
        assert_eq!(grid.filled_count(), 0);

        let value = serde_json::to_value(&grid).unwrap();
        assert!(value["5"]["night"].is_null());
    }
}
