/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! HTTP surface.
//!
//! | Route                      | Response                                              |
//! |----------------------------|-------------------------------------------------------|
//! | `GET /data.json`           | 425 before first publish, 304 on matching tag, else 200 |
//! | `GET /plexPoster?path=...` | artwork bytes; 400 without `path`, 404 without upstream, 502 on upstream failure |
//!
//! Anything else is 404.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header::{CONTENT_TYPE, ETAG, IF_NONE_MATCH};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::warn;

use posterbox::catalog::{ARTWORK_ROUTE, DATA_ROUTE};

use crate::plex::CatalogSource;
use crate::publish::DocumentReceiver;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub documents: DocumentReceiver,
    pub source: Option<Arc<dyn CatalogSource>>,
}

/// Build the server's router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(DATA_ROUTE, get(catalog_document))
        .route(ARTWORK_ROUTE, get(artwork))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn catalog_document(State(state): State<AppState>, headers: HeaderMap) -> Response {
    // One read per request so tag and body always belong together.
    let Some(document) = state.documents.borrow().clone() else {
        return StatusCode::TOO_EARLY.into_response();
    };

    let matches = headers
        .get(IF_NONE_MATCH)
        .is_some_and(|tag| tag.as_bytes() == document.etag.as_bytes());
    if matches {
        return StatusCode::NOT_MODIFIED.into_response();
    }

    (
        [
            (ETAG, document.etag.as_str()),
            (CONTENT_TYPE, "application/json"),
        ],
        document.json.clone(),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
struct ArtworkQuery {
    path: Option<String>,
}

async fn artwork(State(state): State<AppState>, Query(query): Query<ArtworkQuery>) -> Response {
    let Some(path) = query.path else {
        return (StatusCode::BAD_REQUEST, "query parameter 'path' is required").into_response();
    };
    let Some(source) = state.source else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match source.artwork(&path).await {
        Ok(artwork) => {
            let content_type = artwork
                .content_type
                .as_deref()
                .and_then(|ct| HeaderValue::from_str(ct).ok());
            let mut response = artwork.bytes.into_response();
            if let Some(content_type) = content_type {
                response.headers_mut().insert(CONTENT_TYPE, content_type);
            }
            response
        }
        Err(e) => {
            warn!(path = %path, error = %e, "Artwork fetch failed");
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}
