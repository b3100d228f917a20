//! Scenario layer: min/max result bands for the five trade variables.

mod bounds;
mod config;
mod runner;

pub use bounds::{Band, BoundColumn, ScenarioBounds, ScenarioResults, Variable};
pub use config::ScenarioConfig;
pub use runner::ScenarioRunner;
