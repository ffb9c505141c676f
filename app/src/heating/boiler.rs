use crate::core::unit::DegreeCelsius;
use crate::core::{EntityId, EntityState, ServiceCall};
use crate::port::ServiceCallAccess;

use super::temperature::{TemperatureBounds, dynamic_target};
use super::{BoilerMode, DemandSnapshot, HeatingConfig};

const PRESET_SCHEDULE: &str = "schedule";
const DEMAND_PRESETS: &[&str] = &["none", "manual", "away"];
const IDLE_PRESETS: &[&str] = &["none", "manual"];

#[derive(Debug, Clone, PartialEq)]
pub struct BoilerDecision {
    pub mode: BoilerMode,
    pub activate: bool,
    /// Thermostat mode only.
    pub target_temperature: Option<DegreeCelsius>,
}

impl BoilerDecision {
    /// `boiler` is the freshly read boiler state; its current temperature anchors the dynamic target.
    pub fn decide(config: &HeatingConfig, demand: &DemandSnapshot, boiler: Option<&EntityState>) -> Self {
        let activate = demand.sufficient_demand;

        let target_temperature = match config.boiler_mode {
            BoilerMode::Toggle => None,
            BoilerMode::Thermostat if !activate => Some(config.off_temperature()),
            BoilerMode::Thermostat => match demand.average_valve_position {
                Some(average) if config.use_dynamic_temperature => {
                    let base = boiler
                        .and_then(|b| b.attribute_f64("current_temperature"))
                        .map(DegreeCelsius);
                    if base.is_none() {
                        tracing::debug!("Boiler temperature unknown, anchoring dynamic target on off temperature");
                    }

                    let bounds = TemperatureBounds {
                        on: config.on_temperature(),
                        off: config.off_temperature(),
                    };
                    Some(dynamic_target(average, base, &bounds))
                }
                _ => Some(config.on_temperature()),
            },
        };

        Self {
            mode: config.boiler_mode,
            activate,
            target_temperature,
        }
    }
}

/// What has to be written to the boiler to reach the decision.
#[derive(Debug, Clone, PartialEq)]
pub enum BoilerPlan {
    Unchanged,
    SetTemperature {
        /// Tried in order until the first one is accepted. Empty if the boiler could not be read.
        presets: &'static [&'static str],
        temperature: DegreeCelsius,
    },
    Switch {
        on: bool,
    },
}

impl BoilerPlan {
    pub fn for_decision(decision: &BoilerDecision, boiler: Option<&EntityState>) -> Self {
        match (decision.mode, decision.target_temperature) {
            (BoilerMode::Thermostat, Some(target)) => {
                let presets = if decision.activate { DEMAND_PRESETS } else { IDLE_PRESETS };
                plan_thermostat(boiler, target, presets)
            }
            (BoilerMode::Thermostat, None) => BoilerPlan::Unchanged,
            (BoilerMode::Toggle, _) => plan_toggle(boiler, decision.activate),
        }
    }
}

fn plan_thermostat(
    boiler: Option<&EntityState>,
    target: DegreeCelsius,
    presets: &'static [&'static str],
) -> BoilerPlan {
    //unreadable boiler: skip the preset dance and write the temperature blindly
    let Some(boiler) = boiler else {
        return BoilerPlan::SetTemperature {
            presets: &[],
            temperature: target,
        };
    };

    let current_preset = boiler.attribute_str("preset_mode").unwrap_or("none");
    let current_target = boiler.attribute_f64("temperature").map(DegreeCelsius);

    if current_preset != PRESET_SCHEDULE && current_target.is_some_and(|t| t.same_setpoint(&target)) {
        return BoilerPlan::Unchanged;
    }

    BoilerPlan::SetTemperature {
        presets,
        temperature: target,
    }
}

fn plan_toggle(boiler: Option<&EntityState>, activate: bool) -> BoilerPlan {
    let desired = if activate { "on" } else { "off" };

    match boiler {
        Some(state) if state.state == desired => BoilerPlan::Unchanged,
        _ => BoilerPlan::Switch { on: activate },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuationOutcome {
    Unchanged,
    Applied,
    Failed,
}

/// Executes a plan. Failures are logged and left for the next cycle to retry.
#[tracing::instrument(skip(api))]
pub async fn apply_plan(api: &impl ServiceCallAccess, boiler: &EntityId, plan: &BoilerPlan) -> ActuationOutcome {
    match plan {
        BoilerPlan::Unchanged => {
            tracing::info!("Boiler {} already in desired state, no action needed", boiler);
            ActuationOutcome::Unchanged
        }
        BoilerPlan::SetTemperature { presets, temperature } => {
            apply_preset(api, boiler, presets).await;

            let call = ServiceCall::new("climate", "set_temperature", boiler).with("temperature", temperature.0);
            execute(api, &call).await
        }
        BoilerPlan::Switch { on } => {
            let domain = boiler.domain().unwrap_or("switch");
            let service = if *on { "turn_on" } else { "turn_off" };

            let call = ServiceCall::new(domain, service, boiler);
            execute(api, &call).await
        }
    }
}

async fn apply_preset(api: &impl ServiceCallAccess, boiler: &EntityId, presets: &[&str]) {
    for preset in presets {
        let call = ServiceCall::new("climate", "set_preset_mode", boiler).with("preset_mode", *preset);

        match api.call_service(&call).await {
            Ok(()) => {
                tracing::info!("Set preset of {} to '{}'", boiler, preset);
                return;
            }
            Err(e) => tracing::debug!("Preset '{}' not accepted by {}: {:?}", preset, boiler, e),
        }
    }

    if !presets.is_empty() {
        tracing::warn!("None of the presets {:?} accepted by {}", presets, boiler);
    }
}

async fn execute(api: &impl ServiceCallAccess, call: &ServiceCall) -> ActuationOutcome {
    match api.call_service(call).await {
        Ok(()) => {
            tracing::info!("Successfully called {}", call);
            ActuationOutcome::Applied
        }
        Err(e) => {
            tracing::error!("Failed to call {}: {:?}", call, e);
            ActuationOutcome::Failed
        }
    }
}
