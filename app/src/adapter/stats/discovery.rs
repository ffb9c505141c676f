use infrastructure::MqttOutMessage;
use serde::Serialize;

use crate::heating::StatName;

use super::MqttStatsConfig;

pub const PAYLOAD_ON: &str = "ON";
pub const PAYLOAD_OFF: &str = "OFF";

const NODE_ID: &str = "heating_manager";

#[derive(Debug, Serialize)]
struct Device {
    identifiers: [&'static str; 1],
    name: &'static str,
    model: &'static str,
    sw_version: &'static str,
}

static DEVICE: Device = Device {
    identifiers: [NODE_ID],
    name: "Heating Manager",
    model: "Boiler demand controller",
    sw_version: env!("CARGO_PKG_VERSION"),
};

#[derive(Debug, Serialize)]
struct Discovery<'a> {
    name: &'static str,
    unique_id: String,
    state_topic: String,
    availability_topic: &'a str,
    device: &'static Device,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit_of_measurement: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    device_class: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_class: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload_on: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload_off: Option<&'static str>,
}

pub fn state_topic(config: &MqttStatsConfig, stat: StatName) -> String {
    format!("{}/{}", config.state_topic, stat.key())
}

fn component(stat: StatName) -> &'static str {
    match stat {
        StatName::HeatingActive => "binary_sensor",
        _ => "sensor",
    }
}

fn config_topic(config: &MqttStatsConfig, stat: StatName) -> String {
    format!(
        "{}/{}/{}/{}/config",
        config.discovery_prefix,
        component(stat),
        NODE_ID,
        stat.key()
    )
}

fn discovery<'a>(config: &MqttStatsConfig, stat: StatName, availability_topic: &'a str) -> Discovery<'a> {
    let binary = component(stat) == "binary_sensor";
    let numeric = matches!(
        stat,
        StatName::TrvsDemanding | StatName::AverageValvePosition | StatName::TargetTemperature
    );

    Discovery {
        name: stat.friendly_name(),
        unique_id: format!("{}_{}", NODE_ID, stat.key()),
        state_topic: state_topic(config, stat),
        availability_topic,
        device: &DEVICE,
        unit_of_measurement: stat.unit(),
        device_class: match stat {
            StatName::HeatingActive => Some("heat"),
            StatName::TargetTemperature => Some("temperature"),
            _ => None,
        },
        state_class: numeric.then_some("measurement"),
        payload_on: binary.then_some(PAYLOAD_ON),
        payload_off: binary.then_some(PAYLOAD_OFF),
    }
}

/// Retained Home Assistant MQTT discovery configs, one per stat.
pub fn discovery_messages(config: &MqttStatsConfig, availability_topic: &str) -> Vec<MqttOutMessage> {
    StatName::ALL
        .iter()
        .filter_map(|stat| {
            let payload = serde_json::to_string(&discovery(config, *stat, availability_topic))
                .inspect_err(|e| tracing::error!("Error serializing discovery of {}: {}", stat.key(), e))
                .ok()?;
            Some(MqttOutMessage::retained(config_topic(config, *stat), payload))
        })
        .collect()
}
