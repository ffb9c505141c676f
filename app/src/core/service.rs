use serde_json::{Map, Value, json};

use super::EntityId;

/// A Home Assistant service invocation targeting a single entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
    pub entity_id: EntityId,
    pub data: Map<String, Value>,
}

impl ServiceCall {
    pub fn new(domain: impl Into<String>, service: impl Into<String>, entity_id: &EntityId) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
            entity_id: entity_id.clone(),
            data: Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_owned(), value.into());
        self
    }

    pub fn payload(&self) -> Value {
        let mut payload = self.data.clone();
        payload.insert("entity_id".to_owned(), json!(self.entity_id));
        Value::Object(payload)
    }
}

impl std::fmt::Display for ServiceCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{} on {}", self.domain, self.service, self.entity_id)
    }
}
