use chrono::NaiveDate;
use thiserror::Error;

use crate::data::{Diagnostic, DiagnosticKind};

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Conditions that stop a run from producing any schedule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("No active employees to schedule")]
    NoActiveEmployees,

    #[error("Existing schedule belongs to the week of {found}, not {expected}")]
    WeekMismatch { expected: NaiveDate, found: NaiveDate },

    #[error("No feasible solution found. Add availability or relax constraints.")]
    NoFeasibleSolution,
}

impl EngineError {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            EngineError::NoActiveEmployees => DiagnosticKind::NoActiveEmployees,
            EngineError::WeekMismatch { .. } => DiagnosticKind::WeekMismatch,
            EngineError::NoFeasibleSolution => DiagnosticKind::NoFeasibleSolution,
        }
    }
}

impl From<EngineError> for Diagnostic {
    fn from(error: EngineError) -> Self {
        Diagnostic::error(error.kind(), error.to_string())
    }
}
