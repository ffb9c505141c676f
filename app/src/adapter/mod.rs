pub mod homeassistant;
pub mod stats;
