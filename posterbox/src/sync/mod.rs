/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Cache-validated catalog polling.
//!
//! [`SyncEngine`] owns the process-wide [`SyncState`].  On every tick of its
//! own timer it asks the [`Fetcher`] for the catalog document, presenting the
//! token of the catalog it already has, and classifies the result:
//!
//! | Fetch result | Outcome | State change | Observers notified |
//! |---|---|---|---|
//! | `304 Not Modified` | `Unchanged` | none | no |
//! | `200`, same token as presented | `Unchanged` | none | no |
//! | `200`, decoded catalog structurally equal to current | `Unchanged` | fetch cursor only | no |
//! | `200`, new content | `Fresh` | `Synced(catalog, token, None)` | yes |
//! | transport / status / decode failure | `Failed(reason)` | `last_error = reason`, catalog kept | only if the error text changed |
//!
//! # Shared state
//! The state lives in a `tokio::sync::watch` channel.  The engine is the only
//! writer and always replaces the whole value; [`SyncStateReader`]s clone
//! snapshots out (cheap: the catalog is behind an `Arc`) and therefore only
//! ever see a complete previous or newer state.
//!
//! # Fetch cursor
//! The token presented to the fetcher is kept apart from the observed state.
//! A server may hand out a new token for identical content; the engine then
//! adopts that token for its next conditional request so the document is
//! not downloaded again, while observers see nothing.
//!
//! # Identity across refreshes
//! A Fresh catalog reuses the previous catalog's `Arc` for every item that is
//! structurally unchanged (see [`Catalog::adopt_identities`]), so a
//! selector's recently-shown history keeps matching after a refresh.
//!
//! # Failure policy
//! Nothing is fatal to the loop.  There is no backoff: the next attempt is
//! simply the next tick.

mod fetcher;

pub use fetcher::{CatalogDecoder, FetchResponse, Fetcher, HttpFetcher, JsonCatalogDecoder};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, ValidationToken};
use crate::error::FetchError;

/// Default cadence of the display-side sync loop.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(15);

// ── FetchOutcome ──────────────────────────────────────────────────────────────

/// Classified result of one poll.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// New content that differs from what the engine already publishes.
    Fresh {
        catalog: Arc<Catalog>,
        token: ValidationToken,
    },
    /// Nothing to apply.
    Unchanged,
    /// The fetch failed; the string is a human-readable diagnostic.
    Failed(String),
}

// ── SyncState ─────────────────────────────────────────────────────────────────

/// Snapshot of what the engine knows.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncState {
    /// No successful fetch yet.
    Uninitialized { last_error: Option<String> },
    /// The last good catalog plus the most recent failure, if any happened
    /// since it was fetched.
    Synced {
        catalog: Arc<Catalog>,
        token: ValidationToken,
        last_error: Option<String>,
    },
}

impl Default for SyncState {
    fn default() -> Self {
        SyncState::Uninitialized { last_error: None }
    }
}

impl SyncState {
    pub fn catalog(&self) -> Option<&Arc<Catalog>> {
        match self {
            SyncState::Uninitialized { .. } => None,
            SyncState::Synced { catalog, .. } => Some(catalog),
        }
    }

    pub fn token(&self) -> Option<&ValidationToken> {
        match self {
            SyncState::Uninitialized { .. } => None,
            SyncState::Synced { token, .. } => Some(token),
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        match self {
            SyncState::Uninitialized { last_error } | SyncState::Synced { last_error, .. } => {
                last_error.as_deref()
            }
        }
    }

    /// Attach `reason` as the current warning.  Returns `true` if that
    /// changed anything.
    fn attach_error(&mut self, reason: String) -> bool {
        let slot = match self {
            SyncState::Uninitialized { last_error } | SyncState::Synced { last_error, .. } => {
                last_error
            }
        };
        if slot.as_deref() == Some(reason.as_str()) {
            return false;
        }
        *slot = Some(reason);
        true
    }
}

// ── SyncStateReader ───────────────────────────────────────────────────────────

/// Read-only handle on the engine's state.  Cheap to clone.
#[derive(Debug, Clone)]
pub struct SyncStateReader {
    rx: watch::Receiver<SyncState>,
}

impl SyncStateReader {
    /// Current state.  Does not mark it as seen.
    pub fn snapshot(&self) -> SyncState {
        self.rx.borrow().clone()
    }

    /// Current state, marking it as seen for [`changed`](Self::changed).
    pub fn snapshot_and_mark_seen(&mut self) -> SyncState {
        self.rx.borrow_and_update().clone()
    }

    /// `true` if the engine published something not yet marked as seen.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Wait for the next publication.  Returns `false` once the engine is
    /// gone and nothing will ever change again.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

// ── SyncEngine ────────────────────────────────────────────────────────────────

/// Polls a [`Fetcher`] on a fixed cadence and publishes [`SyncState`].
pub struct SyncEngine<F, D = JsonCatalogDecoder> {
    fetcher: F,
    decoder: D,
    interval: Duration,
    state: watch::Sender<SyncState>,
    /// Token presented on the next fetch.  Not part of [`SyncState`].
    cursor: Mutex<Option<ValidationToken>>,
}

impl<F: Fetcher> SyncEngine<F> {
    /// Engine decoding the JSON catalog document.
    pub fn new(fetcher: F, interval: Duration) -> Self {
        Self::with_decoder(fetcher, JsonCatalogDecoder, interval)
    }
}

impl<F: Fetcher, D: CatalogDecoder> SyncEngine<F, D> {
    pub fn with_decoder(fetcher: F, decoder: D, interval: Duration) -> Self {
        let (state, _) = watch::channel(SyncState::default());
        Self {
            fetcher,
            decoder,
            interval,
            state,
            cursor: Mutex::new(None),
        }
    }

    /// New observer of the engine state.
    pub fn subscribe(&self) -> SyncStateReader {
        SyncStateReader {
            rx: self.state.subscribe(),
        }
    }

    /// Current state.
    pub fn state(&self) -> SyncState {
        self.state.borrow().clone()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn cursor(&self) -> MutexGuard<'_, Option<ValidationToken>> {
        self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── One cycle ─────────────────────────────────────────────────────────────

    /// Fetch and classify once.  Never modifies the observed state; only the
    /// private fetch cursor may advance.
    pub async fn poll(&self) -> FetchOutcome {
        let current = self.state();
        let presented = self.cursor().clone().or_else(|| current.token().cloned());

        let response = match self.fetcher.fetch(presented.as_ref()).await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::Failed(e.to_string()),
        };

        let (body, token) = match response {
            FetchResponse::NotModified => return FetchOutcome::Unchanged,
            FetchResponse::Ok { body, token } => (body, token),
        };
        if presented.as_ref() == Some(&token) || current.token() == Some(&token) {
            return FetchOutcome::Unchanged;
        }

        let mut catalog = match self.decoder.decode(&body) {
            Ok(catalog) => catalog,
            Err(e) => return FetchOutcome::Failed(FetchError::from(e).to_string()),
        };

        if let Some(previous) = current.catalog() {
            // Tokens can churn without the content changing.
            if **previous == catalog {
                debug!(token = %token, "new token but identical catalog");
                *self.cursor() = Some(token);
                return FetchOutcome::Unchanged;
            }
            catalog.adopt_identities(previous);
        }

        FetchOutcome::Fresh {
            catalog: Arc::new(catalog),
            token,
        }
    }

    /// Apply `outcome` to the shared state.  Returns `true` if observers were
    /// notified.
    pub fn apply(&self, outcome: FetchOutcome) -> bool {
        match outcome {
            FetchOutcome::Fresh { catalog, token } => {
                info!(
                    token = %token,
                    posters = catalog.posters.len(),
                    display_secs = catalog.render_settings.item_display_duration().as_secs(),
                    transition = %catalog.render_settings.item_transition(),
                    "Loaded new catalog"
                );
                *self.cursor() = Some(token.clone());
                self.state.send_replace(SyncState::Synced {
                    catalog,
                    token,
                    last_error: None,
                });
                true
            }
            FetchOutcome::Unchanged => {
                debug!("Catalog not modified");
                false
            }
            FetchOutcome::Failed(reason) => {
                warn!(reason = %reason, "Unable to load catalog");
                self.state.send_if_modified(|state| state.attach_error(reason))
            }
        }
    }

    /// [`poll`](Self::poll) then [`apply`](Self::apply).
    pub async fn sync_once(&self) -> bool {
        let outcome = self.poll().await;
        self.apply(outcome)
    }

    // ── Loop ──────────────────────────────────────────────────────────────────

    /// Poll forever at the configured interval, starting immediately.
    pub async fn run(self) {
        info!(interval_secs = self.interval.as_secs(), "Starting catalog sync loop");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.sync_once().await;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
