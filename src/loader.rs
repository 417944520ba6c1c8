use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use chrono::Utc;

use crate::config::LoaderConfig;
use crate::endpoints::{build_urls, cache_bust_token};
use crate::error::FetchResult;
use crate::http_client::{HttpTransport, Transport};
use crate::listing::{LoadedListings, icon_lookup};
use crate::listing_fetch::{FetchedListings, fetch_listings};
use crate::retry::{Sleeper, ThreadSleeper};
use crate::snapshot::{CacheSnapshot, FileSnapshotStore, SnapshotStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Success(LoadedListings),
    /// Live fetch failed; these come from the last persisted snapshot.
    CacheFallback {
        listings: LoadedListings,
        cached_at: i64,
    },
    Empty,
}

impl LoadOutcome {
    pub fn listings(&self) -> Option<&LoadedListings> {
        match self {
            LoadOutcome::Success(listings) | LoadOutcome::CacheFallback { listings, .. } => {
                Some(listings)
            }
            LoadOutcome::Empty => None,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, LoadOutcome::CacheFallback { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub outcome: LoadOutcome,
    /// Console lines describing what happened, already tagged `[INFO]`/`[WARN]`.
    pub logs: Vec<String>,
}

pub struct ListingLoader {
    config: LoaderConfig,
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
    store: Option<Arc<dyn SnapshotStore>>,
    now_millis: fn() -> i64,
    store_notice_sent: AtomicBool,
}

impl ListingLoader {
    pub fn new(config: LoaderConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            sleeper: Arc::new(ThreadSleeper),
            store: None,
            now_millis: || Utc::now().timestamp_millis(),
            store_notice_sent: AtomicBool::new(false),
        }
    }

    /// Live HTTP transport, plus the file snapshot store when running resilient
    /// and a cache directory can be resolved.
    pub fn from_config(config: LoaderConfig) -> Result<Self> {
        let store = if config.resilient {
            FileSnapshotStore::from_config(&config)
                .ok()
                .map(|store| Arc::new(store) as Arc<dyn SnapshotStore>)
        } else {
            None
        };
        let mut loader = Self::new(config, Arc::new(HttpTransport::shared()?));
        loader.store = store;
        Ok(loader)
    }

    pub fn with_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_clock(mut self, now_millis: fn() -> i64) -> Self {
        self.now_millis = now_millis;
        self
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn load(&self) -> LoadReport {
        self.load_ids(&self.config.universe_ids)
    }

    /// Never fails: fetch errors end up as a cache fallback or `Empty`.
    pub fn load_ids(&self, ids: &[String]) -> LoadReport {
        let mut logs = Vec::new();
        if self.config.resilient
            && self.store.is_none()
            && !self.store_notice_sent.swap(true, Ordering::Relaxed)
        {
            logs.push("[INFO] No cache directory; snapshots disabled".to_string());
        }
        if ids.is_empty() {
            logs.push("[INFO] No universes configured".to_string());
            return LoadReport {
                outcome: LoadOutcome::Empty,
                logs,
            };
        }

        let now = (self.now_millis)();
        let outcome = match self.fetch_live(ids, now) {
            Ok(fetched) => {
                let icons = icon_lookup(&fetched.thumbnails);
                let listings = LoadedListings::from_parts(&fetched.listings, &icons);
                logs.push(format!(
                    "[INFO] Loaded {} listings ({} icons)",
                    listings.stats.count,
                    icons.len()
                ));
                if self.config.resilient {
                    self.persist(
                        CacheSnapshot {
                            at: now,
                            build: self.config.build_tag.clone(),
                            games: fetched.listings,
                            icons,
                        },
                        &mut logs,
                    );
                }
                LoadOutcome::Success(listings)
            }
            Err(err) => {
                logs.push(format!("[WARN] Listing fetch failed: {err}"));
                if self.config.resilient {
                    self.fallback(&mut logs)
                } else {
                    LoadOutcome::Empty
                }
            }
        };

        LoadReport { outcome, logs }
    }

    fn fetch_live(&self, ids: &[String], now: i64) -> FetchResult<FetchedListings> {
        let bust = cache_bust_token(&self.config, now);
        let urls = build_urls(&self.config, ids, &bust)?;
        fetch_listings(
            self.transport.as_ref(),
            self.sleeper.as_ref(),
            &self.config.effective_retry(),
            &urls,
        )
    }

    fn persist(&self, snapshot: CacheSnapshot, logs: &mut Vec<String>) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(err) = store.save(&snapshot) {
            logs.push(format!("[WARN] Cache snapshot not saved: {err}"));
        }
    }

    fn fallback(&self, logs: &mut Vec<String>) -> LoadOutcome {
        let Some(store) = &self.store else {
            return LoadOutcome::Empty;
        };
        let snapshot = match store.load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                logs.push("[INFO] No cache snapshot to fall back on".to_string());
                return LoadOutcome::Empty;
            }
            Err(err) => {
                logs.push(format!("[WARN] Cache snapshot unreadable: {err}"));
                return LoadOutcome::Empty;
            }
        };
        if snapshot.build != self.config.build_tag {
            logs.push(format!(
                "[INFO] Ignoring cache snapshot from build {} (current {})",
                snapshot.build, self.config.build_tag
            ));
            return LoadOutcome::Empty;
        }

        let listings = LoadedListings::from_parts(&snapshot.games, &snapshot.icons);
        logs.push(format!(
            "[INFO] Using cached data ({} listings)",
            listings.stats.count
        ));
        LoadOutcome::CacheFallback {
            listings,
            cached_at: snapshot.at,
        }
    }
}
