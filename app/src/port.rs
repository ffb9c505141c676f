#![allow(async_fn_in_trait)]

use crate::core::{EntityId, EntityState, ServiceCall};
use crate::heating::Stat;

pub trait EntityStateAccess {
    /// Current state of an entity. Missing, unreachable and malformed entities all yield `None`.
    async fn read_entity(&self, id: &EntityId) -> Option<EntityState>;
}

pub trait ServiceCallAccess {
    async fn call_service(&self, call: &ServiceCall) -> anyhow::Result<()>;
}

pub trait StatsSink {
    /// Called once before the first cycle.
    async fn announce(&self) {}

    //fire and forget, failures are the sink's concern
    async fn publish_stat(&self, stat: &Stat);
}

impl<T: EntityStateAccess> EntityStateAccess for &T {
    async fn read_entity(&self, id: &EntityId) -> Option<EntityState> {
        (**self).read_entity(id).await
    }
}

impl<T: ServiceCallAccess> ServiceCallAccess for &T {
    async fn call_service(&self, call: &ServiceCall) -> anyhow::Result<()> {
        (**self).call_service(call).await
    }
}

impl<T: StatsSink> StatsSink for &T {
    async fn announce(&self) {
        (**self).announce().await
    }

    async fn publish_stat(&self, stat: &Stat) {
        (**self).publish_stat(stat).await
    }
}
