/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error types for the Poster Box display engine.
//!
//! The enums follow the failure layers of the engine:
//!
//! * [`SettingsError`] – a render-settings value failed validation at the
//!   boundary (configuration load or document decode).
//! * [`DecodeError`] – the catalog document could not be decoded.
//! * [`FetchError`] – one sync cycle failed.  The [`SyncEngine`] absorbs these
//!   into a `Failed` outcome; they never escape the polling loop.
//! * [`SelectorError`] – an invalid argument reached the
//!   [`PosterSelector`].  These are caller contract violations.
//!
//! [`SyncEngine`]: crate::sync::SyncEngine
//! [`PosterSelector`]: crate::selector::PosterSelector

use thiserror::Error;

// ── Render settings ───────────────────────────────────────────────────────────

/// A render-settings value was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// Display durations must be strictly positive.
    #[error("item display duration must be positive: {0}s")]
    NonPositiveDuration(i64),

    /// The transition literal is not one of the known styles.
    #[error("unknown item transition name: {0}")]
    UnknownTransition(String),
}

// ── Catalog document ──────────────────────────────────────────────────────────

/// The catalog document bytes could not be turned into a
/// [`Catalog`](crate::catalog::Catalog).
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed catalog document: {0}")]
    Json(#[from] serde_json::Error),
}

// ── Sync ──────────────────────────────────────────────────────────────────────

/// Why a single fetch of the catalog document failed.
///
/// Only the rendered message survives into
/// [`FetchOutcome::Failed`](crate::sync::FetchOutcome::Failed); callers only
/// distinguish "did it fail".
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection refused, DNS failure, reset, client timeout.
    #[error("transport error: {0}")]
    Transport(String),

    /// Any status other than `200 OK` / `304 Not Modified`.
    #[error("HTTP {0}")]
    UnexpectedStatus(u16),

    /// A `200 OK` arrived without the entity tag the protocol requires.
    #[error("{route} response did not include required ETag header")]
    MissingValidationToken { route: &'static str },

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

// ── Selection ─────────────────────────────────────────────────────────────────

/// Invalid-argument conditions of the poster selector.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectorError {
    /// `next()` was called with an empty catalog.
    #[error("poster list was empty")]
    EmptyCatalog,

    /// The history fraction passed at construction is outside `[0, 1)`.
    #[error("history cache fraction must be in range [0,1): {0}")]
    HistoryFractionOutOfRange(f64),
}
