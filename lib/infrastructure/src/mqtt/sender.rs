use std::sync::Arc;

use rumqttc::v5::{AsyncClient, mqttbytes::QoS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttOutMessage {
    pub topic: String,
    pub payload: String,
    pub retain: bool,
}

impl MqttOutMessage {
    pub fn retained(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            retain: true,
        }
    }

    pub fn transient(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            retain: false,
        }
    }
}

#[derive(Clone)]
pub struct MqttSender {
    client: Arc<AsyncClient>,
    availability_topic: String,
}

impl MqttSender {
    pub(super) fn new(client: Arc<AsyncClient>, availability_topic: String) -> Self {
        Self {
            client,
            availability_topic,
        }
    }

    pub fn availability_topic(&self) -> &str {
        &self.availability_topic
    }

    /// Queues a publish without waiting. A full queue, e.g. while the broker is unreachable, drops the message.
    #[tracing::instrument(skip_all, fields(topic = %msg.topic, otel.name = format!("MQTT publish {}", msg.topic)))]
    pub async fn send(&self, msg: MqttOutMessage) -> anyhow::Result<()> {
        tracing::debug!("Publishing MQTT message to {} (retain={}): {:?}", msg.topic, msg.retain, msg.payload);

        self.client
            .try_publish(msg.topic.clone(), QoS::AtLeastOnce, msg.retain, msg.payload)
            .map_err(|e| {
                tracing::warn!("Dropping MQTT message to {}: {}", msg.topic, e);
                e.into()
            })
    }
}
