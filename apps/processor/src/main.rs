//! Tripwire audit event processor runtime.

#![forbid(unsafe_code)]

use std::env;
use std::sync::Arc;
use std::time::Duration;

use tripwire_application::{AccountRegistry, DispatchService, EventProcessorService};
use tripwire_core::{AppError, AppResult};
use tripwire_infrastructure::{
    BackoffPolicy, HttpAccountDirectory, HttpResourceInventory, S3AuditLogStore,
    SnsSubscriptionConfirmer, SqsInboundQueue, SqsScanQueue,
};

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Debug, Clone)]
struct ProcessorConfig {
    inbound_queue_url: String,
    scan_queue_url: String,
    directory_api_url: String,
    inventory_api_url: String,
    integration_type: String,
    inbound_batch_size: i32,
    receive_wait_seconds: i32,
    account_cache_ttl_seconds: u64,
    region_cache_ttl_seconds: u64,
    scan_send_max_elapsed_seconds: u64,
    http_timeout_seconds: u64,
    poll_error_backoff_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ProcessorConfig::load()?;
    let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .load()
        .await;
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_seconds))
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;
    let sqs_client = aws_sdk_sqs::Client::new(&sdk_config);

    let accounts = Arc::new(
        AccountRegistry::new(Arc::new(HttpAccountDirectory::new(
            http_client.clone(),
            config.directory_api_url.as_str(),
            config.integration_type.as_str(),
        )))
        .with_refresh_interval(Duration::from_secs(config.account_cache_ttl_seconds))
        .with_region_ttl(Duration::from_secs(config.region_cache_ttl_seconds)),
    );
    let dispatcher = DispatchService::new(
        Arc::new(HttpResourceInventory::new(
            http_client,
            config.inventory_api_url.as_str(),
        )),
        Arc::new(
            SqsScanQueue::new(sqs_client.clone(), config.scan_queue_url.as_str()).with_backoff(
                BackoffPolicy::default().with_max_elapsed(Duration::from_secs(
                    config.scan_send_max_elapsed_seconds,
                )),
            ),
        ),
    );
    let processor = EventProcessorService::new(
        accounts,
        Arc::new(S3AuditLogStore::new(aws_sdk_s3::Client::new(&sdk_config))),
        Arc::new(SnsSubscriptionConfirmer::new(sdk_config.clone())),
        dispatcher,
    );
    let inbound_queue = SqsInboundQueue::new(
        sqs_client,
        config.inbound_queue_url.as_str(),
        config.inbound_batch_size,
        config.receive_wait_seconds,
    );

    info!(
        inbound_queue_url = %config.inbound_queue_url,
        scan_queue_url = %config.scan_queue_url,
        integration_type = %config.integration_type,
        inbound_batch_size = config.inbound_batch_size,
        "tripwire-processor started"
    );

    loop {
        let messages = match inbound_queue.receive().await {
            Ok(messages) if messages.is_empty() => continue,
            Ok(messages) => messages,
            Err(error) => {
                warn!(error = %error, "failed to receive inbound messages");
                tokio::time::sleep(Duration::from_millis(config.poll_error_backoff_ms)).await;
                continue;
            }
        };

        let bodies: Vec<&str> = messages
            .iter()
            .map(|message| message.body.as_str())
            .collect();

        match processor.process_batch(&bodies).await {
            Ok(report) => {
                if let Err(error) = inbound_queue.acknowledge(&messages).await {
                    warn!(
                        batch_id = %report.batch_id,
                        error = %error,
                        "failed to acknowledge processed batch"
                    );
                }
            }
            Err(error) => {
                // Unacknowledged messages are redelivered after the visibility timeout.
                warn!(
                    messages = messages.len(),
                    error = %error,
                    "audit event batch failed"
                );
                tokio::time::sleep(Duration::from_millis(config.poll_error_backoff_ms)).await;
            }
        }
    }
}

impl ProcessorConfig {
    fn load() -> AppResult<Self> {
        let inbound_queue_url = required_env("INBOUND_QUEUE_URL")?;
        let scan_queue_url = required_env("SCAN_QUEUE_URL")?;
        let directory_api_url = required_url("DIRECTORY_API_URL")?;
        let inventory_api_url = required_url("INVENTORY_API_URL")?;
        let integration_type = env::var("INTEGRATION_TYPE")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "aws-scan".to_owned());
        let inbound_batch_size = parse_env_i32("INBOUND_BATCH_SIZE", 10)?;
        let receive_wait_seconds = parse_env_i32("RECEIVE_WAIT_SECONDS", 20)?;
        let account_cache_ttl_seconds = parse_env_u64("ACCOUNT_CACHE_TTL_SECONDS", 120)?;
        let region_cache_ttl_seconds = parse_env_u64("REGION_CACHE_TTL_SECONDS", 900)?;
        let scan_send_max_elapsed_seconds = parse_env_u64("SCAN_SEND_MAX_ELAPSED_SECONDS", 30)?;
        let http_timeout_seconds = parse_env_u64("HTTP_TIMEOUT_SECONDS", 15)?;
        let poll_error_backoff_ms = parse_env_u64("POLL_ERROR_BACKOFF_MS", 1500)?;

        ensure_in_range("INBOUND_BATCH_SIZE", inbound_batch_size, 1, 10)?;
        ensure_in_range("RECEIVE_WAIT_SECONDS", receive_wait_seconds, 0, 20)?;

        if account_cache_ttl_seconds == 0 {
            return Err(AppError::Validation(
                "ACCOUNT_CACHE_TTL_SECONDS must be greater than zero".to_owned(),
            ));
        }

        if http_timeout_seconds == 0 {
            return Err(AppError::Validation(
                "HTTP_TIMEOUT_SECONDS must be greater than zero".to_owned(),
            ));
        }

        if poll_error_backoff_ms == 0 {
            return Err(AppError::Validation(
                "POLL_ERROR_BACKOFF_MS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            inbound_queue_url,
            scan_queue_url,
            directory_api_url,
            inventory_api_url,
            integration_type,
            inbound_batch_size,
            receive_wait_seconds,
            account_cache_ttl_seconds,
            region_cache_ttl_seconds,
            scan_send_max_elapsed_seconds,
            http_timeout_seconds,
            poll_error_backoff_ms,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_url(name: &str) -> AppResult<String> {
    validate_url(name, required_env(name)?.as_str())
}

fn validate_url(name: &str, value: &str) -> AppResult<String> {
    let url = Url::parse(value.trim()).map_err(|error| {
        AppError::Validation(format!("invalid {name} value '{value}': {error}"))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::Validation(format!(
            "{name} must be an http or https URL"
        )));
    }

    Ok(url.to_string())
}

fn ensure_in_range(name: &str, value: i32, min: i32, max: i32) -> AppResult<()> {
    if (min..=max).contains(&value) {
        return Ok(());
    }

    Err(AppError::Validation(format!(
        "{name} must be between {min} and {max}, got {value}"
    )))
}

fn parse_env_i32(name: &str, default: i32) -> AppResult<i32> {
    match env::var(name) {
        Ok(value) => value.parse::<i32>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_u64(name: &str, default: u64) -> AppResult<u64> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
