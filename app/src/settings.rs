use config::{Config, ConfigError, Environment, File};
use infrastructure::{MonitoringConfig, MqttConfig};
use serde::Deserialize;

use crate::adapter::homeassistant::HomeAssistantConfig;
use crate::adapter::stats::MqttStatsConfig;
use crate::heating::HeatingConfig;

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub homeassistant: HomeAssistantConfig,
    #[serde(default)]
    pub mqtt: Option<MqttSettings>,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub heating: HeatingConfig,
    #[serde(default)]
    pub debug_logging: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MqttSettings {
    #[serde(flatten)]
    pub broker: MqttConfig,
    #[serde(flatten)]
    pub stats: MqttStatsConfig,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(Config::builder().add_source(File::with_name("config.toml").required(false)))
    }

    fn load(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self, ConfigError> {
        builder
            .add_source(
                Environment::with_prefix("HEATING")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("heating.trv_entities")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
