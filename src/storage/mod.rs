//! Durable store module
//!
//! Whole-collection JSON persistence with in-memory repositories and a
//! periodic flush task.

pub mod json_store;
pub mod repositories;

pub use json_store::JsonStore;
pub use repositories::{AbuseRepository, InviteRepository, PendingRepository, UserRepository};

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::utils::errors::Result;

const KIND_USERS: &str = "users";
const KIND_ABUSE: &str = "abuse";
const KIND_PENDING: &str = "pending";
const KIND_INVITES: &str = "invites";

/// Owns the repositories and their backing file store.
#[derive(Clone)]
pub struct StoreService {
    pub users: Arc<UserRepository>,
    pub abuse: Arc<AbuseRepository>,
    pub pending: Arc<PendingRepository>,
    pub invites: Arc<InviteRepository>,
    store: JsonStore,
}

impl StoreService {
    /// Load every collection from disk into fresh repositories.
    pub async fn load(store: JsonStore) -> Result<Self> {
        store.ensure_dir().await?;

        let users = Arc::new(UserRepository::new());
        users.load_from(store.load(KIND_USERS).await?).await;

        let abuse = Arc::new(AbuseRepository::new());
        abuse.load_from(store.load(KIND_ABUSE).await?);

        let pending = Arc::new(PendingRepository::new());
        pending.load_from(store.load(KIND_PENDING).await?).await;

        let invites = Arc::new(InviteRepository::new());
        invites.load_from(store.load(KIND_INVITES).await?).await;

        info!(
            users = users.count().await,
            abuse_records = abuse.count(),
            pending = pending.count().await,
            "Durable store loaded"
        );

        Ok(Self {
            users,
            abuse,
            pending,
            invites,
            store,
        })
    }

    /// Persist every collection.
    ///
    /// Snapshots are taken first so no repository lock is held across file
    /// I/O; in-flight mutations after the snapshot land in the next flush.
    pub async fn flush_all(&self) -> Result<()> {
        let users = self.users.snapshot().await;
        let abuse = self.abuse.snapshot();
        let pending = self.pending.snapshot().await;
        let invites = self.invites.snapshot().await;

        self.store.save(KIND_USERS, &users).await?;
        self.store.save(KIND_ABUSE, &abuse).await?;
        self.store.save(KIND_PENDING, &pending).await?;
        self.store.save(KIND_INVITES, &invites).await?;

        Ok(())
    }
}

impl std::fmt::Debug for StoreService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreService")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

/// Periodic flush task with a shutdown handle.
#[derive(Debug)]
pub struct FlushScheduler {
    store: StoreService,
    interval: Duration,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl FlushScheduler {
    pub fn new(store: StoreService, interval: Duration) -> Self {
        Self {
            store,
            interval,
            handle: None,
        }
    }

    /// Start the background flush loop.
    pub fn start(&mut self) {
        if self.handle.is_some() {
            warn!("Flush task is already running");
            return;
        }

        let store = self.store.clone();
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it, everything was
            // just loaded.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if let Err(e) = store.flush_all().await {
                    error!(error = %e, "Periodic flush failed");
                }
            }
        });

        self.handle = Some(handle);
        info!(interval = ?self.interval, "Started periodic flush task");
    }

    /// Stop the background loop and run one final flush.
    pub async fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("Stopped periodic flush task");
        }

        if let Err(e) = self.store.flush_all().await {
            error!(error = %e, "Final flush failed");
        }
    }
}

impl Drop for FlushScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
