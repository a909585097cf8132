//! Weekly shift assignment engine.
//!
//! [`solver::ScheduleGenerator`] turns a [`data::GenerationRequest`] into a
//! [`data::GenerationResult`]; [`server`] exposes it over HTTP.

pub mod config;
pub mod data;
pub mod error;
pub mod ids;
pub mod server;
pub mod solver;
pub mod validation;
