//! TTL-cached view of the monitored-account directory.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};
use tripwire_core::{AccountId, AppResult};
use tripwire_domain::MonitoredAccount;

use crate::pipeline_ports::AccountDirectory;

/// Default age after which the account list is fetched again.
pub const DEFAULT_ACCOUNT_REFRESH_INTERVAL: Duration = Duration::from_secs(120);

/// Default lifetime of an event-driven region marker.
pub const DEFAULT_REGION_CACHE_TTL: Duration = Duration::from_secs(900);

type AccountMap = HashMap<AccountId, MonitoredAccount>;

#[derive(Default)]
struct AccountSnapshot {
    accounts: Arc<AccountMap>,
    refreshed_at: Option<Instant>,
}

impl AccountSnapshot {
    fn is_fresh(&self, refresh_interval: Duration) -> bool {
        !self.accounts.is_empty()
            && self
                .refreshed_at
                .is_some_and(|refreshed_at| refreshed_at.elapsed() < refresh_interval)
    }
}

/// Shared registry of monitored accounts and event-driven regions.
///
/// The account map is swapped as a whole under the write lock, so readers
/// see either the previous or the next directory listing, never a mix.
pub struct AccountRegistry {
    directory: Arc<dyn AccountDirectory>,
    refresh_interval: Duration,
    region_ttl: Duration,
    snapshot: RwLock<AccountSnapshot>,
    event_driven_regions: RwLock<HashMap<(AccountId, String), Instant>>,
}

impl AccountRegistry {
    /// Creates an empty registry backed by the directory service.
    #[must_use]
    pub fn new(directory: Arc<dyn AccountDirectory>) -> Self {
        Self {
            directory,
            refresh_interval: DEFAULT_ACCOUNT_REFRESH_INTERVAL,
            region_ttl: DEFAULT_REGION_CACHE_TTL,
            snapshot: RwLock::new(AccountSnapshot::default()),
            event_driven_regions: RwLock::new(HashMap::new()),
        }
    }

    /// Overrides the account list refresh interval.
    #[must_use]
    pub fn with_refresh_interval(mut self, refresh_interval: Duration) -> Self {
        self.refresh_interval = refresh_interval;
        self
    }

    /// Overrides the lifetime of event-driven region markers.
    #[must_use]
    pub fn with_region_ttl(mut self, region_ttl: Duration) -> Self {
        self.region_ttl = region_ttl;
        self
    }

    /// Reloads the account list when it is empty or older than the refresh
    /// interval. A failed reload is returned to the caller; the previous
    /// listing is kept but not served as if it were fresh.
    pub async fn refresh(&self) -> AppResult<()> {
        if self.snapshot.read().await.is_fresh(self.refresh_interval) {
            return Ok(());
        }

        let mut snapshot = self.snapshot.write().await;
        // Another batch may have refreshed while this one waited for the lock.
        if snapshot.is_fresh(self.refresh_interval) {
            return Ok(());
        }

        let accounts: AccountMap = self
            .directory
            .list_monitored_accounts()
            .await?
            .into_iter()
            .map(|account| (account.account_id().clone(), account))
            .collect();

        info!(accounts = accounts.len(), "refreshed monitored account list");
        *snapshot = AccountSnapshot {
            accounts: Arc::new(accounts),
            refreshed_at: Some(Instant::now()),
        };

        Ok(())
    }

    /// Returns the registered account, if any.
    pub async fn lookup(&self, account_id: &AccountId) -> Option<MonitoredAccount> {
        self.snapshot.read().await.accounts.get(account_id).cloned()
    }

    /// Returns whether audit events for the region currently arrive through
    /// the event stream. Expired markers are evicted.
    pub async fn is_event_driven_region(&self, account_id: &AccountId, region: &str) -> bool {
        let key = (account_id.clone(), region.to_owned());
        {
            let regions = self.event_driven_regions.read().await;
            match regions.get(&key) {
                Some(expires_at) if *expires_at > Instant::now() => return true,
                Some(_) => {}
                None => return false,
            }
        }

        let mut regions = self.event_driven_regions.write().await;
        if regions
            .get(&key)
            .is_some_and(|expires_at| *expires_at <= Instant::now())
        {
            debug!(account_id = %account_id, region, "event-driven region marker expired");
            regions.remove(&key);
        }

        false
    }

    /// Records that the region delivered an audit event through the event stream.
    pub async fn mark_event_driven_region(&self, account_id: &AccountId, region: &str) {
        let now = Instant::now();
        let expires_at = now.checked_add(self.region_ttl).unwrap_or(now);

        self.event_driven_regions
            .write()
            .await
            .insert((account_id.clone(), region.to_owned()), expires_at);
    }
}
