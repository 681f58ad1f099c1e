/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Catalog publication.
//!
//! The publisher is the only writer of the served document.  HTTP handlers
//! read the current [`PublishedDocument`] once per request through a
//! [`watch::Receiver`], so a response never mixes the tag of one version with
//! the body of another.
//!
//! Without an upstream nothing is ever published, so `/data.json` keeps
//! answering 425 and displays stay in their loading state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

use posterbox::catalog::{Catalog, CatalogItem, RenderSettings};

use crate::plex::CatalogSource;

/// One immutable version of `/data.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedDocument {
    /// Quoted entity tag, as sent in the `ETag` header.
    pub etag: String,
    pub json: String,
}

/// Receiving side of the published document.  `None` until the first publish.
pub type DocumentReceiver = watch::Receiver<Option<Arc<PublishedDocument>>>;

/// Turns upstream poster lists into versioned catalog documents.
pub struct CatalogPublisher {
    source: Option<Arc<dyn CatalogSource>>,
    render_settings: RenderSettings,
    last_catalog: Option<Catalog>,
    published: watch::Sender<Option<Arc<PublishedDocument>>>,
}

impl CatalogPublisher {
    pub fn new(render_settings: RenderSettings, source: Option<Arc<dyn CatalogSource>>) -> Self {
        let (published, _) = watch::channel(None);
        Self {
            source,
            render_settings,
            last_catalog: None,
            published,
        }
    }

    pub fn subscribe(&self) -> DocumentReceiver {
        self.published.subscribe()
    }

    /// Currently published document.
    pub fn current(&self) -> Option<Arc<PublishedDocument>> {
        self.published.borrow().clone()
    }

    /// Publish `posters` under a fresh entity tag unless they are identical
    /// to what is already published.  Returns `true` if a new version went out.
    ///
    /// # Errors
    /// Returns an error if the catalog cannot be serialized; the previous
    /// document stays published.
    pub fn publish(&mut self, posters: Vec<CatalogItem>) -> Result<bool, serde_json::Error> {
        let catalog = Catalog::new(self.render_settings, posters);
        if self.last_catalog.as_ref() == Some(&catalog) {
            debug!("[Plex] No poster changes");
            return Ok(false);
        }

        let document = PublishedDocument {
            etag: format!("\"{}\"", Uuid::new_v4()),
            json: catalog.to_json()?,
        };
        info!(
            etag = %document.etag,
            posters = catalog.posters.len(),
            "Published new catalog"
        );
        self.published.send_replace(Some(Arc::new(document)));
        self.last_catalog = Some(catalog);
        Ok(true)
    }

    /// Pull from the upstream and publish.  Upstream failures keep the
    /// previous document and are logged.  Without an upstream this is a no-op.
    pub async fn refresh(&mut self) -> bool {
        let Some(source) = &self.source else {
            debug!("No upstream configured; nothing to publish");
            return false;
        };

        debug!("[Plex] Performing poster sync");
        let posters = match source.posters().await {
            Ok(posters) => posters,
            Err(e) => {
                warn!(error = %e, "[Plex] Poster sync failed; keeping previous catalog");
                return false;
            }
        };

        match self.publish(posters) {
            Ok(changed) => changed,
            Err(e) => {
                warn!(error = %e, "Failed to serialize catalog");
                false
            }
        }
    }

    /// Refresh on a fixed cadence.  Without an upstream there is nothing to
    /// poll and the task idles.
    pub async fn run(mut self, sync_interval: Duration) {
        if self.source.is_none() {
            // Keep the sender alive so subscribers never observe a closed channel.
            std::future::pending::<()>().await;
        }

        info!(
            interval_secs = sync_interval.as_secs(),
            "[Plex] Starting sync loop"
        );
        let mut ticker = tokio::time::interval(sync_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.refresh().await;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plex::{Artwork, SourceError};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn poster(title: &str) -> CatalogItem {
        CatalogItem {
            title: title.into(),
            studio: None,
            runtime: 100,
            year: 2000,
            content_rating: None,
            rating: Some(70),
            artwork: format!("/art/{title}"),
        }
    }

    /// Returns queued results in order, then empty lists.
    #[derive(Default)]
    struct ScriptedSource {
        results: Mutex<VecDeque<Result<Vec<CatalogItem>, u16>>>,
    }

    impl ScriptedSource {
        fn push(&self, result: Result<Vec<CatalogItem>, u16>) {
            self.results.lock().unwrap().push_back(result);
        }
    }

    #[async_trait]
    impl CatalogSource for ScriptedSource {
        async fn posters(&self) -> Result<Vec<CatalogItem>, SourceError> {
            let next = self.results.lock().unwrap().pop_front();
            match next {
                Some(Ok(posters)) => Ok(posters),
                Some(Err(status)) => Err(SourceError::UnexpectedStatus {
                    url: "http://plex/library/sections".into(),
                    status,
                }),
                None => Ok(Vec::new()),
            }
        }

        async fn artwork(&self, _path: &str) -> Result<Artwork, SourceError> {
            unreachable!("publisher never fetches artwork")
        }
    }

    fn publisher(source: &Arc<ScriptedSource>) -> CatalogPublisher {
        let source: Arc<dyn CatalogSource> = source.clone();
        CatalogPublisher::new(RenderSettings::default(), Some(source))
    }

    #[test]
    fn identical_posters_keep_the_same_tag() {
        let mut publisher = CatalogPublisher::new(RenderSettings::default(), None);
        assert!(publisher.current().is_none());

        assert!(publisher.publish(vec![poster("Alien")]).unwrap());
        let first = publisher.current().unwrap();
        assert!(first.etag.starts_with('"') && first.etag.ends_with('"'));

        assert!(!publisher.publish(vec![poster("Alien")]).unwrap());
        assert!(Arc::ptr_eq(&first, &publisher.current().unwrap()));

        assert!(publisher.publish(vec![poster("Heat")]).unwrap());
        assert_ne!(publisher.current().unwrap().etag, first.etag);
    }

    #[test]
    fn published_json_decodes_to_the_catalog() {
        let mut publisher = CatalogPublisher::new(RenderSettings::default(), None);
        publisher.publish(vec![poster("Alien")]).unwrap();

        let document = publisher.current().unwrap();
        let catalog = Catalog::from_json(document.json.as_bytes()).unwrap();
        assert_eq!(
            catalog,
            Catalog::new(RenderSettings::default(), vec![poster("Alien")])
        );
    }

    #[tokio::test]
    async fn upstream_failure_keeps_previous_document() {
        let source = Arc::new(ScriptedSource::default());
        source.push(Ok(vec![poster("Alien")]));
        source.push(Err(500));
        let mut publisher = publisher(&source);
        let mut rx = publisher.subscribe();

        assert!(publisher.refresh().await);
        assert!(rx.has_changed().unwrap());
        let first = rx.borrow_and_update().clone().unwrap();

        assert!(!publisher.refresh().await);
        assert!(!rx.has_changed().unwrap());
        assert!(Arc::ptr_eq(&first, &publisher.current().unwrap()));
    }

    #[tokio::test]
    async fn no_upstream_publishes_nothing() {
        let mut publisher = CatalogPublisher::new(RenderSettings::default(), None);
        let rx = publisher.subscribe();
        assert!(!publisher.refresh().await);
        assert!(publisher.current().is_none());

        let task = tokio::spawn(publisher.run(Duration::from_secs(60)));
        tokio::task::yield_now().await;
        assert!(rx.borrow().is_none());
        assert!(!rx.has_changed().unwrap());
        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn run_loop_refreshes_on_interval() {
        let source = Arc::new(ScriptedSource::default());
        source.push(Ok(vec![poster("Alien")]));
        source.push(Ok(vec![poster("Alien")]));
        source.push(Ok(vec![poster("Heat")]));
        let publisher = publisher(&source);
        let rx = publisher.subscribe();

        let task = tokio::spawn(publisher.run(Duration::from_secs(60)));

        tokio::time::sleep(Duration::from_secs(1)).await;
        let first = rx.borrow().clone().unwrap();

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(rx.borrow().as_ref().unwrap().etag, first.etag);

        tokio::time::sleep(Duration::from_secs(60)).await;
        let third = rx.borrow().clone().unwrap();
        assert_ne!(third.etag, first.etag);
        assert!(third.json.contains("Heat"));

        task.abort();
    }
}
