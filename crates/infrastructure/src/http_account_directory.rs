use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;
use tripwire_application::AccountDirectory;
use tripwire_core::{AccountId, AppError, AppResult};
use tripwire_domain::{MonitoredAccount, ScanConfig};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListIntegrationsRequest<'a> {
    integration_type: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntegrationRecord {
    aws_account_id: String,
    integration_id: String,
    #[serde(default)]
    scan_config: ScanConfig,
}

/// HTTP client for the integration directory service.
pub struct HttpAccountDirectory {
    http_client: reqwest::Client,
    endpoint: String,
    integration_type: String,
}

impl HttpAccountDirectory {
    /// Creates a directory client listing integrations of one type.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        endpoint: impl Into<String>,
        integration_type: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
            integration_type: integration_type.into(),
        }
    }
}

#[async_trait]
impl AccountDirectory for HttpAccountDirectory {
    async fn list_monitored_accounts(&self) -> AppResult<Vec<MonitoredAccount>> {
        let response = self
            .http_client
            .post(self.endpoint.as_str())
            .json(&ListIntegrationsRequest {
                integration_type: self.integration_type.as_str(),
            })
            .send()
            .await
            .map_err(|error| {
                AppError::Unavailable(format!("account directory transport error: {error}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<response body unavailable>".to_owned());
            return Err(AppError::Unavailable(format!(
                "account directory returned status {status}: {body}"
            )));
        }

        let records: Vec<IntegrationRecord> = response.json().await.map_err(|error| {
            AppError::Unavailable(format!("account directory returned invalid JSON: {error}"))
        })?;

        let mut accounts = Vec::with_capacity(records.len());
        for record in records {
            let account = AccountId::new(record.aws_account_id.as_str()).and_then(|account_id| {
                MonitoredAccount::new(account_id, record.integration_id.as_str(), record.scan_config)
            });
            match account {
                Ok(account) => accounts.push(account),
                Err(error) => warn!(
                    account_id = record.aws_account_id.as_str(),
                    integration_id = record.integration_id.as_str(),
                    error = %error,
                    "skipping invalid integration record"
                ),
            }
        }

        Ok(accounts)
    }
}
