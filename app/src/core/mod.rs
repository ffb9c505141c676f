pub mod entity;
pub mod service;
pub mod unit;

pub use entity::{EntityId, EntityState};
pub use service::ServiceCall;
