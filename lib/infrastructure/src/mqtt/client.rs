use std::sync::Arc;
use std::time::Duration;

use rumqttc::v5::{
    AsyncClient, EventLoop, MqttOptions,
    mqttbytes::{
        QoS,
        v5::{ConnectProperties, LastWill, Packet},
    },
};

use rumqttc::v5::Event::Incoming;

use super::MqttSender;

const PAYLOAD_ONLINE: &str = "online";
const PAYLOAD_OFFLINE: &str = "offline";

pub struct Mqtt {
    client: Arc<AsyncClient>,
    event_loop: EventLoop,
    availability_topic: String,
}

impl Mqtt {
    pub fn connect(
        host: &str,
        port: u16,
        client_id: &str,
        credentials: Option<(&str, &str)>,
        availability_topic: &str,
    ) -> Self {
        let mut mqttoptions = MqttOptions::new(client_id, host, port);
        mqttoptions.set_keep_alive(Duration::from_secs(5));
        mqttoptions.set_clean_start(true);

        if let Some((user, password)) = credentials {
            mqttoptions.set_credentials(user, password);
        }

        //broker flips availability to offline if we vanish without saying goodbye
        mqttoptions.set_last_will(LastWill::new(
            availability_topic,
            PAYLOAD_OFFLINE,
            QoS::AtLeastOnce,
            true,
            None,
        ));

        let mut connect_props = ConnectProperties::new();
        connect_props.max_packet_size = Some(1024 * 1024);
        mqttoptions.set_connect_properties(connect_props);

        let (client, event_loop) = AsyncClient::new(mqttoptions, 32);

        Mqtt {
            client: Arc::new(client),
            event_loop,
            availability_topic: availability_topic.to_owned(),
        }
    }

    pub fn sender(&self) -> MqttSender {
        MqttSender::new(self.client.clone(), self.availability_topic.clone())
    }

    /// Drives the connection. Publishes are only flushed while this future is polled.
    pub async fn run(mut self) {
        loop {
            match self.event_loop.poll().await {
                Ok(Incoming(Packet::ConnAck(_))) => {
                    tracing::info!("MQTT connected, announcing availability");
                    if let Err(e) = self
                        .client
                        .publish(self.availability_topic.clone(), QoS::AtLeastOnce, true, PAYLOAD_ONLINE)
                        .await
                    {
                        tracing::error!("Error announcing MQTT availability: {}", e);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("MQTT error: {}", e);
                    //avoid spinning while the broker is down
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
            }
        }
    }
}
