/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Poster Box – server
//!
//! ```text
//! lib.rs
//! ├── config/   – TOML server configuration
//! ├── plex/     – upstream library (Plex Media Server client)
//! ├── publish   – versioned catalog documents with entity tags
//! └── routes    – axum router: /data.json and /plexPoster
//! ```

pub mod config;
pub mod plex;
pub mod publish;
pub mod routes;
