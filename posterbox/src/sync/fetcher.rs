/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Collaborators consumed by the [`SyncEngine`](super::SyncEngine).
//!
//! * [`Fetcher`] – conditional retrieval of the raw catalog document.
//! * [`CatalogDecoder`] – bytes → [`Catalog`].
//!
//! [`HttpFetcher`] is the production fetcher: an HTTP conditional GET against
//! the Poster Box server's [`DATA_ROUTE`], presenting the last known entity
//! tag in `If-None-Match`.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{ETAG, IF_NONE_MATCH};
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::catalog::{Catalog, ValidationToken, DATA_ROUTE};
use crate::error::{DecodeError, FetchError};

/// Client-level timeout for one catalog request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ── Fetcher ───────────────────────────────────────────────────────────────────

/// Raw result of one conditional fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResponse {
    /// Full document plus the token identifying this version of it.
    Ok {
        body: Vec<u8>,
        token: ValidationToken,
    },
    /// The presented token is still current.
    NotModified,
}

/// Retrieves the catalog document, honouring a cache-validation token.
///
/// Implementations must not depend on (or change) any engine state: the
/// engine calls `fetch` once per tick and interprets the result itself.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, token: Option<&ValidationToken>) -> Result<FetchResponse, FetchError>;
}

// ── CatalogDecoder ────────────────────────────────────────────────────────────

/// Turns a fetched document into a [`Catalog`].
pub trait CatalogDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<Catalog, DecodeError>;
}

/// The JSON document format served at [`DATA_ROUTE`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCatalogDecoder;

impl CatalogDecoder for JsonCatalogDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Catalog, DecodeError> {
        Catalog::from_json(bytes)
    }
}

// ── HttpFetcher ───────────────────────────────────────────────────────────────

/// [`Fetcher`] over HTTP using `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    url: String,
}

impl HttpFetcher {
    /// Fetcher for the document published by the server at `base_url`
    /// (e.g. `http://posterbox.local:9931`).
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url: format!("{}{DATA_ROUTE}", base_url.trim_end_matches('/')),
        })
    }

    /// Full URL of the catalog document.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, token: Option<&ValidationToken>) -> Result<FetchResponse, FetchError> {
        let mut request = self.client.get(&self.url);
        if let Some(token) = token {
            request = request.header(IF_NONE_MATCH, token.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_MODIFIED => Ok(FetchResponse::NotModified),
            StatusCode::OK => {
                let token = response
                    .headers()
                    .get(ETAG)
                    .and_then(|v| v.to_str().ok())
                    .map(ValidationToken::new)
                    .ok_or(FetchError::MissingValidationToken { route: DATA_ROUTE })?;
                let body = response
                    .bytes()
                    .await
                    .map_err(|e| FetchError::Transport(e.to_string()))?;
                debug!(url = %self.url, token = %token, bytes = body.len(), "fetched catalog document");
                Ok(FetchResponse::Ok {
                    body: body.to_vec(),
                    token,
                })
            }
            other => Err(FetchError::UnexpectedStatus(other.as_u16())),
        }
    }
}
