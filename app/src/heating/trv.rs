use std::fmt::Display;

use crate::core::EntityId;
use crate::core::unit::{DegreeCelsius, Percent};
use crate::port::EntityStateAccess;

pub const HVAC_ACTION_HEATING: &str = "heating";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValveState {
    Open,
    Closed,
    /// No sensor, unreachable or unrecognized state
    Unknown,
}

impl ValveState {
    pub fn from_state(state: &str) -> Self {
        match state.trim().to_lowercase().as_str() {
            "open" | "opened" | "on" | "true" => ValveState::Open,
            "closed" | "off" | "false" => ValveState::Closed,
            _ => ValveState::Unknown,
        }
    }

    /// Fail-open: only an explicit `Closed` blocks demand.
    pub fn permits_flow(&self) -> bool {
        match self {
            ValveState::Open => true,
            ValveState::Closed => false,
            ValveState::Unknown => true,
        }
    }
}

impl Display for ValveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValveState::Open => write!(f, "open"),
            ValveState::Closed => write!(f, "closed"),
            ValveState::Unknown => write!(f, "unknown (assumed open)"),
        }
    }
}

/// Everything known about one TRV in the current cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct TrvReading {
    pub entity_id: EntityId,
    pub reported_state: Option<String>,
    pub hvac_action: Option<String>,
    pub current_temperature: Option<DegreeCelsius>,
    pub target_temperature: Option<DegreeCelsius>,
    pub valve: ValveState,
    pub valve_position: Option<Percent>,
}

impl TrvReading {
    pub fn unreachable(entity_id: EntityId) -> Self {
        Self {
            entity_id,
            reported_state: None,
            hvac_action: None,
            current_temperature: None,
            target_temperature: None,
            valve: ValveState::Unknown,
            valve_position: None,
        }
    }

    pub fn is_hvac_heating(&self) -> bool {
        self.hvac_action.as_deref() == Some(HVAC_ACTION_HEATING)
    }
}

/// Which sibling sensors are worth reading for a TRV.
#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    pub valve_state: bool,
    /// Also read the position of TRVs that do not report heating.
    pub idle_position: bool,
}

/// Builds a fresh reading for one TRV from the climate entity and its sibling valve sensors.
#[tracing::instrument(skip(api, options))]
pub async fn read_trv(api: &impl EntityStateAccess, entity_id: &EntityId, options: ReadOptions) -> TrvReading {
    let mut reading = match api.read_entity(entity_id).await {
        Some(state) => TrvReading {
            entity_id: entity_id.clone(),
            reported_state: Some(state.state.clone()),
            hvac_action: state.attribute_str("hvac_action").map(str::to_owned),
            current_temperature: state.attribute_f64("current_temperature").map(DegreeCelsius),
            target_temperature: state.attribute_f64("temperature").map(DegreeCelsius),
            valve: ValveState::Unknown,
            valve_position: None,
        },
        None => {
            tracing::warn!("Could not retrieve state for {}", entity_id);
            TrvReading::unreachable(entity_id.clone())
        }
    };

    //valve sensor only matters for TRVs that claim to heat
    if options.valve_state && reading.is_hvac_heating() {
        reading.valve = read_valve_state(api, entity_id).await;
    }

    if options.idle_position || reading.is_hvac_heating() {
        reading.valve_position = read_valve_position(api, entity_id).await;
    }

    reading
}

pub async fn read_valve_state(api: &impl EntityStateAccess, trv: &EntityId) -> ValveState {
    for candidate in valve_state_candidates(trv) {
        if let Some(state) = api.read_entity(&candidate).await {
            let valve = ValveState::from_state(&state.state);
            tracing::debug!("Found valve sensor {} with state {:?} -> {}", candidate, state.state, valve);
            return valve;
        }
    }

    tracing::debug!("No valve sensor found for {}, assuming valve is open", trv);
    ValveState::Unknown
}

pub async fn read_valve_position(api: &impl EntityStateAccess, trv: &EntityId) -> Option<Percent> {
    for candidate in valve_position_candidates(trv) {
        let Some(state) = api.read_entity(&candidate).await else {
            continue;
        };

        match state.state_f64() {
            Some(position) => {
                tracing::debug!("Found valve position sensor {} at {}%", candidate, position);
                return Some(Percent(position).clamp());
            }
            None => {
                tracing::debug!("Ignoring non-numeric valve position {:?} of {}", state.state, candidate);
            }
        }
    }

    None
}

fn valve_state_candidates(trv: &EntityId) -> Vec<EntityId> {
    let Some(name) = trv.object_id() else {
        return vec![];
    };

    dedup(vec![
        EntityId::new("binary_sensor", &format!("{}_valve_state", name)),
        EntityId::new("binary_sensor", &format!("{}_valve_state", name.replace("_trv", ""))),
        EntityId::new("sensor", &format!("{}_valve_state", name)),
    ])
}

fn valve_position_candidates(trv: &EntityId) -> Vec<EntityId> {
    let Some(name) = trv.object_id() else {
        return vec![];
    };

    dedup(vec![
        EntityId::new("sensor", &format!("{}_valve_position", name)),
        EntityId::new("sensor", &format!("{}_valve_position", name.replace("_trv", ""))),
        EntityId::new("number", &format!("{}_valve_position", name)),
        EntityId::new("sensor", &format!("{}_position", name)),
    ])
}

fn dedup(candidates: Vec<EntityId>) -> Vec<EntityId> {
    let mut result: Vec<EntityId> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !result.contains(&candidate) {
            result.push(candidate);
        }
    }
    result
}
