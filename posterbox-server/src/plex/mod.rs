/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Upstream media library.
//!
//! [`CatalogSource`] is what the publisher and the artwork route need from a
//! library; [`HttpPlexService`] implements it against a Plex Media Server.
//!
//! Plex is queried in two steps:
//!
//! ```text
//! GET {host}/library/sections            → Directory[] {key, title, type}
//!     keep type ∈ {movie, show}, optionally restricted to configured titles
//! GET {host}/library/sections/{key}/all  → Metadata[] per kept section
//! ```
//!
//! Every request carries `X-Plex-Token` and asks for JSON.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use posterbox::catalog::CatalogItem;

use crate::config::PlexConfig;

const PLEX_TOKEN_HEADER: &str = "X-Plex-Token";

/// Client-level timeout for one Plex request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ── CatalogSource ─────────────────────────────────────────────────────────────

/// Artwork bytes as served by the upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artwork {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Failures talking to the upstream library.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} returned HTTP {status}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A media library the server can publish posters from.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Every eligible item, in library order.
    async fn posters(&self) -> Result<Vec<CatalogItem>, SourceError>;

    /// Artwork bytes for an item's [`CatalogItem::artwork`] reference.
    async fn artwork(&self, path: &str) -> Result<Artwork, SourceError>;
}

// ── Private Plex JSON types ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PlexResponse<T> {
    #[serde(rename = "MediaContainer")]
    media_container: T,
}

#[derive(Debug, Deserialize)]
struct Sections {
    #[serde(rename = "Directory", default)]
    directories: Vec<SectionHeader>,
}

#[derive(Debug, Deserialize)]
struct SectionHeader {
    key: String,
    title: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct SectionItems {
    #[serde(rename = "Metadata", default)]
    items: Vec<PlexItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlexItem {
    title: String,
    studio: Option<String>,
    #[serde(rename = "duration", default)]
    duration_millis: u64,
    content_rating: Option<String>,
    #[serde(default)]
    year: i32,
    rating: Option<f64>,
    audience_rating: Option<f64>,
    thumb: Option<String>,
}

impl PlexItem {
    /// Audience score preferred over critic score, on a 0–100 scale.
    fn computed_rating(&self) -> Option<i32> {
        self.audience_rating
            .or(self.rating)
            .map(|score| (score * 10.0) as i32)
    }

    /// Whole minutes, rounding any partial minute up.
    fn runtime_minutes(&self) -> u32 {
        let minutes = (self.duration_millis / 1000 + 59) / 60;
        u32::try_from(minutes).unwrap_or(u32::MAX)
    }

    /// Items without artwork have nothing to display and are skipped.
    fn into_catalog_item(self) -> Option<CatalogItem> {
        let rating = self.computed_rating();
        let runtime = self.runtime_minutes();
        Some(CatalogItem {
            artwork: self.thumb?,
            title: self.title,
            studio: self.studio,
            runtime,
            year: self.year,
            content_rating: self.content_rating,
            rating,
        })
    }
}

fn is_poster_section(section: &SectionHeader, config: &PlexConfig) -> bool {
    let kind_ok = section.kind == "movie" || section.kind == "show";
    let library_ok = config
        .libraries
        .as_ref()
        .map_or(true, |libraries| libraries.contains(&section.title));
    kind_ok && library_ok
}

fn passes_minimum_rating(item: &PlexItem, minimum_rating: u8) -> bool {
    item.computed_rating().unwrap_or(0) >= i32::from(minimum_rating)
}

// ── HttpPlexService ───────────────────────────────────────────────────────────

/// [`CatalogSource`] backed by a Plex Media Server.
#[derive(Debug, Clone)]
pub struct HttpPlexService {
    client: Client,
    config: PlexConfig,
}

impl HttpPlexService {
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: PlexConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create Plex HTTP client")?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.host.trim_end_matches('/'), path)
    }

    async fn send(&self, url: &str, json: bool) -> Result<Response, SourceError> {
        let mut request = self
            .client
            .get(url)
            .header(PLEX_TOKEN_HEADER, &self.config.token);
        if json {
            request = request.header(ACCEPT, "application/json");
        }

        let response = request.send().await.map_err(|e| SourceError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::UnexpectedStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, SourceError> {
        let url = self.url(path);
        let body = self
            .send(&url, true)
            .await?
            .bytes()
            .await
            .map_err(|e| SourceError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;
        let response: PlexResponse<T> =
            serde_json::from_slice(&body).map_err(|source| SourceError::Decode { url, source })?;
        Ok(response.media_container)
    }
}

#[async_trait]
impl CatalogSource for HttpPlexService {
    async fn posters(&self) -> Result<Vec<CatalogItem>, SourceError> {
        let sections: Sections = self.get_json("/library/sections").await?;

        let mut posters = Vec::new();
        for section in sections
            .directories
            .iter()
            .filter(|s| is_poster_section(s, &self.config))
        {
            let items: SectionItems = self
                .get_json(&format!("/library/sections/{}/all", section.key))
                .await?;
            let before = posters.len();
            posters.extend(
                items
                    .items
                    .into_iter()
                    .filter(|item| passes_minimum_rating(item, self.config.minimum_rating))
                    .filter_map(PlexItem::into_catalog_item),
            );
            debug!(
                section = %section.title,
                kind = %section.kind,
                posters = posters.len() - before,
                "[Plex] Loaded section"
            );
        }
        Ok(posters)
    }

    async fn artwork(&self, path: &str) -> Result<Artwork, SourceError> {
        let url = self.url(path);
        let response = self.send(&url, false).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| SourceError::Transport {
                url,
                message: e.to_string(),
            })?;
        Ok(Artwork {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
