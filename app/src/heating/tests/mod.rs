mod scenarios;

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::bail;
use serde_json::{Value, json};

use crate::core::{EntityId, EntityState, ServiceCall};
use crate::heating::{Stat, StatName, StatValue};
use crate::port::{EntityStateAccess, ServiceCallAccess, StatsSink};

/// In-memory Home Assistant. Service calls are recorded and applied to the stored states.
#[derive(Default)]
pub struct FakeHomeAssistant {
    entities: Mutex<HashMap<EntityId, EntityState>>,
    reads: Mutex<HashMap<EntityId, usize>>,
    calls: Mutex<Vec<ServiceCall>>,
    rejected_services: Vec<String>,
    rejected_presets: Vec<String>,
}

impl FakeHomeAssistant {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(self, id: &str, state: &str, attributes: Value) -> Self {
        let entity: EntityState = serde_json::from_value(json!({
            "entity_id": id,
            "state": state,
            "attributes": attributes,
        }))
        .unwrap();

        self.entities.lock().unwrap().insert(EntityId::from(id), entity);
        self
    }

    pub fn with_state(self, id: &str, state: &str) -> Self {
        self.with_entity(id, state, json!({}))
    }

    pub fn with_trv(self, id: &str, hvac_action: &str) -> Self {
        self.with_entity(
            id,
            "heat",
            json!({
                "hvac_action": hvac_action,
                "current_temperature": 19.0,
                "temperature": 21.0,
            }),
        )
    }

    /// `service` as `<domain>.<service>`, e.g. `climate.set_temperature`.
    pub fn rejecting_service(mut self, service: &str) -> Self {
        self.rejected_services.push(service.to_owned());
        self
    }

    pub fn rejecting_preset(mut self, preset: &str) -> Self {
        self.rejected_presets.push(preset.to_owned());
        self
    }

    pub fn reads_of(&self, id: &str) -> usize {
        self.reads
            .lock()
            .unwrap()
            .get(&EntityId::from(id))
            .copied()
            .unwrap_or(0)
    }

    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn state_of(&self, id: &str) -> Option<EntityState> {
        self.entities.lock().unwrap().get(&EntityId::from(id)).cloned()
    }

    fn apply(&self, call: &ServiceCall) {
        let mut entities = self.entities.lock().unwrap();
        let Some(entity) = entities.get_mut(&call.entity_id) else {
            return;
        };

        match call.service.as_str() {
            "set_temperature" => {
                if let Some(temperature) = call.data.get("temperature") {
                    entity.attributes.insert("temperature".to_owned(), temperature.clone());
                }
            }
            "set_preset_mode" => {
                if let Some(preset) = call.data.get("preset_mode") {
                    entity.attributes.insert("preset_mode".to_owned(), preset.clone());
                }
            }
            "turn_on" => entity.state = "on".to_owned(),
            "turn_off" => entity.state = "off".to_owned(),
            _ => {}
        }
    }
}

impl EntityStateAccess for FakeHomeAssistant {
    async fn read_entity(&self, id: &EntityId) -> Option<EntityState> {
        *self.reads.lock().unwrap().entry(id.clone()).or_default() += 1;
        self.entities.lock().unwrap().get(id).cloned()
    }
}

impl ServiceCallAccess for FakeHomeAssistant {
    async fn call_service(&self, call: &ServiceCall) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(call.clone());

        let service = format!("{}.{}", call.domain, call.service);
        if self.rejected_services.contains(&service) {
            bail!("Service {} rejected", service);
        }

        if let Some(preset) = call.data.get("preset_mode").and_then(Value::as_str) {
            if self.rejected_presets.iter().any(|p| p == preset) {
                bail!("Preset {} not supported", preset);
            }
        }

        self.apply(call);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeStats {
    announced: Mutex<usize>,
    published: Mutex<Vec<Stat>>,
}

impl FakeStats {
    pub fn announced(&self) -> usize {
        *self.announced.lock().unwrap()
    }

    pub fn published(&self) -> Vec<Stat> {
        self.published.lock().unwrap().clone()
    }

    pub fn last(&self, name: StatName) -> Option<StatValue> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|stat| stat.name == name)
            .map(|stat| stat.value.clone())
    }
}

impl StatsSink for FakeStats {
    async fn announce(&self) {
        *self.announced.lock().unwrap() += 1;
    }

    async fn publish_stat(&self, stat: &Stat) {
        self.published.lock().unwrap().push(stat.clone());
    }
}
