use crate::port::StatsSink;

use super::{BoilerDecision, BoilerMode, DemandSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatName {
    HeatingActive,
    TrvsDemanding,
    AverageValvePosition,
    TargetTemperature,
    BoilerMode,
}

impl StatName {
    pub const ALL: [StatName; 5] = [
        StatName::HeatingActive,
        StatName::TrvsDemanding,
        StatName::AverageValvePosition,
        StatName::TargetTemperature,
        StatName::BoilerMode,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            StatName::HeatingActive => "heating_active",
            StatName::TrvsDemanding => "trvs_demanding",
            StatName::AverageValvePosition => "average_valve_position",
            StatName::TargetTemperature => "target_temperature",
            StatName::BoilerMode => "boiler_mode",
        }
    }

    pub fn friendly_name(&self) -> &'static str {
        match self {
            StatName::HeatingActive => "Heating Active",
            StatName::TrvsDemanding => "TRVs Demanding Heat",
            StatName::AverageValvePosition => "Average Valve Position",
            StatName::TargetTemperature => "Boiler Target Temperature",
            StatName::BoilerMode => "Boiler Mode",
        }
    }

    pub fn unit(&self) -> Option<&'static str> {
        match self {
            StatName::AverageValvePosition => Some("%"),
            StatName::TargetTemperature => Some("°C"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatValue {
    Flag(bool),
    Count(usize),
    Number(Option<f64>),
    Label(&'static str),
}

impl StatValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StatValue::Flag(flag) => Some(if *flag { 1.0 } else { 0.0 }),
            StatValue::Count(count) => Some(*count as f64),
            StatValue::Number(number) => *number,
            StatValue::Label(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stat {
    pub name: StatName,
    pub value: StatValue,
}

/// Outcome of one cycle as seen by the observability layer.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleStats {
    pub heating_active: bool,
    pub trvs_demanding: usize,
    pub average_valve_position: Option<f64>,
    pub target_temperature: Option<f64>,
    pub mode: BoilerMode,
}

impl CycleStats {
    pub fn new(demand: &DemandSnapshot, decision: Option<&BoilerDecision>, mode: BoilerMode) -> Self {
        Self {
            heating_active: demand.any_heating,
            trvs_demanding: demand.demanding_count,
            average_valve_position: demand.average_valve_position.map(|p| p.0),
            target_temperature: decision.and_then(|d| d.target_temperature).map(|t| t.0),
            mode,
        }
    }

    pub fn stats(&self) -> Vec<Stat> {
        let mode = match self.mode {
            BoilerMode::Thermostat => "thermostat",
            BoilerMode::Toggle => "toggle",
        };

        vec![
            Stat {
                name: StatName::HeatingActive,
                value: StatValue::Flag(self.heating_active),
            },
            Stat {
                name: StatName::TrvsDemanding,
                value: StatValue::Count(self.trvs_demanding),
            },
            Stat {
                name: StatName::AverageValvePosition,
                value: StatValue::Number(self.average_valve_position),
            },
            Stat {
                name: StatName::TargetTemperature,
                value: StatValue::Number(self.target_temperature),
            },
            Stat {
                name: StatName::BoilerMode,
                value: StatValue::Label(mode),
            },
        ]
    }

    pub async fn publish(&self, sink: &impl StatsSink) {
        for stat in self.stats() {
            sink.publish_stat(&stat).await;
        }
    }
}
