use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Home Assistant entity id, `<domain>.<object_id>`.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize, derive_more::Display, derive_more::From)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(domain: &str, object_id: &str) -> Self {
        Self(format!("{}.{}", domain, object_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn domain(&self) -> Option<&str> {
        self.0.split_once('.').map(|(domain, _)| domain)
    }

    pub fn object_id(&self) -> Option<&str> {
        self.0.split_once('.').map(|(_, object_id)| object_id)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityState {
    pub entity_id: EntityId,
    pub state: String,
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
}

impl EntityState {
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// Numeric attribute, also accepting numbers that were reported as strings.
    pub fn attribute_f64(&self, key: &str) -> Option<f64> {
        match self.attributes.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => parse_finite(s),
            _ => None,
        }
    }

    pub fn state_f64(&self) -> Option<f64> {
        parse_finite(&self.state)
    }
}

fn parse_finite(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
