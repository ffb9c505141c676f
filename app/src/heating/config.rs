use serde::{Deserialize, Serialize};

use crate::core::EntityId;
use crate::core::unit::{DegreeCelsius, Percent};

use super::DemandPolicy;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum BoilerMode {
    /// Manual target-temperature override on a climate entity.
    #[default]
    #[display("thermostat")]
    Thermostat,
    /// Plain on/off switch.
    #[display("toggle")]
    Toggle,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeatingConfig {
    #[serde(default)]
    pub trv_entities: Vec<EntityId>,
    #[serde(default, alias = "boiler_thermostat_entity")]
    pub boiler_entity: Option<EntityId>,
    #[serde(default)]
    pub boiler_mode: BoilerMode,
    #[serde(default = "default_on_temperature")]
    pub manual_on_temperature: f64,
    #[serde(default = "default_off_temperature")]
    pub manual_off_temperature: f64,
    #[serde(default = "default_true")]
    pub check_valve_state: bool,
    #[serde(default)]
    pub ignore_hvac_action: bool,
    #[serde(default)]
    pub min_valve_position_threshold: f64,
    #[serde(default = "default_min_trvs_heating")]
    pub min_trvs_heating: usize,
    #[serde(default)]
    pub use_dynamic_temperature: bool,
    #[serde(default = "default_polling_interval")]
    pub polling_interval: u64,
}

fn default_on_temperature() -> f64 {
    21.0
}

fn default_off_temperature() -> f64 {
    14.0
}

fn default_true() -> bool {
    true
}

fn default_min_trvs_heating() -> usize {
    1
}

fn default_polling_interval() -> u64 {
    300
}

impl Default for HeatingConfig {
    fn default() -> Self {
        Self {
            trv_entities: vec![],
            boiler_entity: None,
            boiler_mode: BoilerMode::default(),
            manual_on_temperature: default_on_temperature(),
            manual_off_temperature: default_off_temperature(),
            check_valve_state: true,
            ignore_hvac_action: false,
            min_valve_position_threshold: 0.0,
            min_trvs_heating: default_min_trvs_heating(),
            use_dynamic_temperature: false,
            polling_interval: default_polling_interval(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum InvalidHeatingConfig {
    #[display("manual_on_temperature ({on}) must not be below manual_off_temperature ({off})")]
    TemperatureBounds { on: f64, off: f64 },
    #[display("min_valve_position_threshold ({value}) must be within 0..=100")]
    ValvePositionThreshold { value: f64 },
    #[display("min_trvs_heating must be at least 1")]
    MinTrvsHeating,
    #[display("polling_interval must be at least one second")]
    PollingInterval,
}

impl HeatingConfig {
    pub fn validate(&self) -> Result<(), InvalidHeatingConfig> {
        if self.manual_on_temperature < self.manual_off_temperature {
            return Err(InvalidHeatingConfig::TemperatureBounds {
                on: self.manual_on_temperature,
                off: self.manual_off_temperature,
            });
        }

        if !(0.0..=100.0).contains(&self.min_valve_position_threshold) {
            return Err(InvalidHeatingConfig::ValvePositionThreshold {
                value: self.min_valve_position_threshold,
            });
        }

        if self.min_trvs_heating == 0 {
            return Err(InvalidHeatingConfig::MinTrvsHeating);
        }

        if self.polling_interval == 0 {
            return Err(InvalidHeatingConfig::PollingInterval);
        }

        Ok(())
    }

    /// The add-on writes an empty string when no boiler is configured.
    pub fn boiler(&self) -> Option<&EntityId> {
        self.boiler_entity.as_ref().filter(|id| !id.is_empty())
    }

    pub fn on_temperature(&self) -> DegreeCelsius {
        DegreeCelsius(self.manual_on_temperature)
    }

    pub fn off_temperature(&self) -> DegreeCelsius {
        DegreeCelsius(self.manual_off_temperature)
    }

    pub fn polling_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.polling_interval)
    }

    pub fn demand_policy(&self) -> DemandPolicy {
        let min_valve_position = Percent(self.min_valve_position_threshold);

        if self.ignore_hvac_action {
            DemandPolicy::PositionOnly { min_valve_position }
        } else {
            DemandPolicy::HvacAction {
                check_valve_state: self.check_valve_state,
                min_valve_position,
            }
        }
    }

    pub fn log_summary(&self) {
        tracing::info!("Configured with {} TRV entities", self.trv_entities.len());
        for trv in &self.trv_entities {
            tracing::debug!("  TRV: {}", trv);
        }
        tracing::info!(
            "Boiler entity: {}",
            self.boiler().map_or_else(|| "Not configured".to_owned(), |id| id.to_string())
        );
        tracing::info!("Boiler mode: {}", self.boiler_mode);
        if self.boiler_mode == BoilerMode::Thermostat {
            tracing::info!("Manual ON temperature: {}", self.on_temperature());
            tracing::info!("Manual OFF temperature: {}", self.off_temperature());
            tracing::info!("Dynamic temperature: {}", self.use_dynamic_temperature);
        }
        tracing::info!("Demand policy: {:?}", self.demand_policy());
        tracing::info!("Minimum TRVs heating: {}", self.min_trvs_heating);
        tracing::info!("Polling interval: {} seconds", self.polling_interval);

        if self.trv_entities.is_empty() {
            tracing::warn!("No TRV entities configured!");
        }

        if self.boiler().is_none() {
            tracing::warn!("No boiler entity configured - boiler control disabled");
        }
    }
}
