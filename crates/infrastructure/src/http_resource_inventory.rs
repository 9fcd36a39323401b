use async_trait::async_trait;
use serde::Serialize;
use tripwire_application::ResourceInventory;
use tripwire_core::{AppError, AppResult};

#[derive(Debug, Serialize)]
struct DeleteResourcesRequest<'a> {
    resources: Vec<ResourceReference<'a>>,
}

#[derive(Debug, Serialize)]
struct ResourceReference<'a> {
    id: &'a str,
}

/// HTTP client for the resource inventory's delete endpoint.
///
/// Failures are returned as-is: retrying is left to redelivery of the
/// whole inbound batch.
pub struct HttpResourceInventory {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpResourceInventory {
    /// Creates an inventory client.
    #[must_use]
    pub fn new(http_client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ResourceInventory for HttpResourceInventory {
    async fn delete_resources(&self, resource_ids: Vec<String>) -> AppResult<()> {
        let request = DeleteResourcesRequest {
            resources: resource_ids
                .iter()
                .map(|id| ResourceReference { id: id.as_str() })
                .collect(),
        };

        let response = self
            .http_client
            .post(self.endpoint.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|error| {
                AppError::Unavailable(format!("resource inventory transport error: {error}"))
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<response body unavailable>".to_owned());
        Err(AppError::Unavailable(format!(
            "resource inventory delete failed with status {status}: {body}"
        )))
    }
}
