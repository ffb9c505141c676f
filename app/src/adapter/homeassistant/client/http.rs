use anyhow::Context;
use infrastructure::HttpClientConfig;
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;

use crate::core::{EntityId, EntityState, ServiceCall};
use crate::port::{EntityStateAccess, ServiceCallAccess};

#[derive(Debug, Clone)]
pub struct HaHttpClient {
    client: ClientWithMiddleware,
    base_url: String,
}

impl HaHttpClient {
    pub fn new(url: &str, token: Option<String>, timeout_secs: u64) -> anyhow::Result<Self> {
        let client = HttpClientConfig::new(token, timeout_secs).new_tracing_client()?;

        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_owned(),
        })
    }

    fn state_url(&self, entity_id: &EntityId) -> String {
        format!("{}/api/states/{}", self.base_url, entity_id)
    }

    fn service_url(&self, call: &ServiceCall) -> String {
        format!("{}/api/services/{}/{}", self.base_url, call.domain, call.service)
    }

    /// `None` if Home Assistant does not know the entity.
    #[tracing::instrument(skip(self))]
    pub async fn get_state(&self, entity_id: &EntityId) -> anyhow::Result<Option<EntityState>> {
        let response = self.client.get(self.state_url(entity_id)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        response
            .error_for_status()?
            .json::<EntityState>()
            .await
            .map(Some)
            .with_context(|| format!("Error parsing state of {}", entity_id))
    }

    #[tracing::instrument(skip(self), fields(service = %call))]
    pub async fn post_service(&self, call: &ServiceCall) -> anyhow::Result<()> {
        let url = self.service_url(call);
        let payload = call.payload();

        tracing::debug!("Calling HA service {}: {}", url, payload);

        let response = self.client.post(url).json(&payload).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Service {} answered with {}: {}", call, status, body);
        }

        Ok(())
    }
}

impl EntityStateAccess for HaHttpClient {
    async fn read_entity(&self, id: &EntityId) -> Option<EntityState> {
        match self.get_state(id).await {
            Ok(Some(state)) => Some(state),
            Ok(None) => {
                tracing::debug!("Entity {} not found", id);
                None
            }
            Err(e) => {
                tracing::error!("Error reading state of {}: {:?}", id, e);
                infrastructure::meter::increment("ha_state_read_errors", &[]);
                None
            }
        }
    }
}

impl ServiceCallAccess for HaHttpClient {
    async fn call_service(&self, call: &ServiceCall) -> anyhow::Result<()> {
        self.post_service(call).await.inspect_err(|_| {
            infrastructure::meter::increment("ha_service_call_errors", &[("service", call.service.as_str())]);
        })
    }
}
