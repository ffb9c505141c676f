mod discovery;

use infrastructure::{MqttOutMessage, MqttSender};
use serde::Deserialize;

use crate::heating::{Stat, StatValue};
use crate::port::StatsSink;

#[derive(Debug, Deserialize, Clone)]
pub struct MqttStatsConfig {
    #[serde(default = "default_discovery_prefix")]
    pub discovery_prefix: String,
    #[serde(default = "default_state_topic")]
    pub state_topic: String,
}

fn default_discovery_prefix() -> String {
    "homeassistant".to_owned()
}

fn default_state_topic() -> String {
    "heating_manager".to_owned()
}

impl Default for MqttStatsConfig {
    fn default() -> Self {
        Self {
            discovery_prefix: default_discovery_prefix(),
            state_topic: default_state_topic(),
        }
    }
}

impl MqttStatsConfig {
    pub fn availability_topic(&self) -> String {
        format!("{}/status", self.state_topic)
    }
}

/// Exposes cycle stats as OpenTelemetry gauges and, if MQTT is configured, as Home Assistant sensors.
pub struct HeatingStatsPublisher {
    mqtt: Option<MqttStatsExporter>,
}

struct MqttStatsExporter {
    sender: MqttSender,
    config: MqttStatsConfig,
}

impl HeatingStatsPublisher {
    pub fn new(mqtt: Option<(MqttSender, MqttStatsConfig)>) -> Self {
        Self {
            mqtt: mqtt.map(|(sender, config)| MqttStatsExporter { sender, config }),
        }
    }
}

impl StatsSink for HeatingStatsPublisher {
    async fn announce(&self) {
        let Some(mqtt) = &self.mqtt else {
            return;
        };

        for msg in discovery::discovery_messages(&mqtt.config, mqtt.sender.availability_topic()) {
            if let Err(e) = mqtt.sender.send(msg).await {
                tracing::warn!("Error announcing heating stats: {:?}", e);
            }
        }
    }

    async fn publish_stat(&self, stat: &Stat) {
        if let Some(value) = stat.value.as_f64() {
            infrastructure::meter::set(stat.name.key(), value);
        }

        if let Some(mqtt) = &self.mqtt {
            let topic = discovery::state_topic(&mqtt.config, stat.name);
            let msg = MqttOutMessage::transient(topic, state_payload(&stat.value));

            if let Err(e) = mqtt.sender.send(msg).await {
                tracing::warn!("Error publishing stat {}: {:?}", stat.name.key(), e);
            }
        }
    }
}

fn state_payload(value: &StatValue) -> String {
    match value {
        StatValue::Flag(true) => discovery::PAYLOAD_ON.to_owned(),
        StatValue::Flag(false) => discovery::PAYLOAD_OFF.to_owned(),
        StatValue::Count(count) => count.to_string(),
        StatValue::Number(Some(number)) => format!("{:.1}", number),
        //HA sensors treat this as unknown
        StatValue::Number(None) => "None".to_owned(),
        StatValue::Label(label) => (*label).to_owned(),
    }
}
