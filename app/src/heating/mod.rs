mod boiler;
mod config;
mod controller;
mod demand;
mod stats;
mod temperature;
mod trv;

#[cfg(test)]
pub(crate) mod tests;

pub use boiler::{ActuationOutcome, BoilerDecision};
pub use config::{BoilerMode, HeatingConfig};
pub use controller::{CycleReport, HeatingController};
pub use demand::{DemandPolicy, DemandSnapshot};
pub use stats::{CycleStats, Stat, StatName, StatValue};
pub use trv::TrvReading;
