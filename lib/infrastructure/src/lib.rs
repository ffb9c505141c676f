mod http;
mod monitoring;
mod mqtt;

pub use monitoring::{EnvFilterConfig, MonitoringConfig, OtlpConfig};

pub use http::client::HttpClientConfig;
pub use mqtt::{Mqtt, MqttConfig, MqttOutMessage, MqttSender};

pub mod meter {
    pub use super::monitoring::meter::{increment, set};
}
