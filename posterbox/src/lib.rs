/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Poster Box – display-side core
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── catalog     – catalog document, render settings, validation token
//! ├── error       – error types shared across modules
//! ├── selector/   – weighted, history-aware poster selection
//! ├── sync/       – conditional polling of the server, published sync state
//! └── display/    – A/B slot cycle driven by the sync state
//! ```
//!
//! The server half (Plex sync and HTTP publication) lives in the
//! `posterbox-server` crate and reuses [`catalog`] for the wire format.

pub mod catalog;
pub mod display;
pub mod error;
pub mod selector;
pub mod sync;
