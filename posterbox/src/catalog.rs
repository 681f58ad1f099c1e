/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Catalog document data model.
//!
//! One sync cycle fetches one [`Catalog`]: the [`RenderSettings`] the displays
//! should use plus the ordered list of [`CatalogItem`]s to cycle through.
//!
//! ```text
//! posterbox-server  ──(GET /data.json, ETag)──►  SyncEngine  ──(Arc<Catalog>)──►  display cycle
//! ```
//!
//! # Ownership model
//! A decoded `Catalog` is never mutated.  The sync engine wraps it in an
//! `Arc` and swaps the whole value when newer content arrives.  Items are
//! themselves held as `Arc<CatalogItem>` so that the selector can tell two
//! entries apart by identity even when their contents are equal.
//!
//! The wire field names (`renderSettings`, `plexPoster`, ...) are shared with
//! the browser frontend and must not change.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DecodeError, SettingsError};

/// Route at which the server publishes the catalog document.
pub const DATA_ROUTE: &str = "/data.json";

/// Route at which the server proxies artwork bytes (`?path=<artwork>`).
pub const ARTWORK_ROUTE: &str = "/plexPoster";

// ── Transition ────────────────────────────────────────────────────────────────

/// Animation used when the display swaps its active slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Transition {
    None,
    Crossfade,
    #[default]
    Fade,
    SlideLeft,
    SlideRight,
}

impl Transition {
    pub const ALL: [Transition; 5] = [
        Transition::None,
        Transition::Crossfade,
        Transition::Fade,
        Transition::SlideLeft,
        Transition::SlideRight,
    ];

    /// The literal used in configuration files and the catalog document.
    pub fn as_str(self) -> &'static str {
        match self {
            Transition::None => "none",
            Transition::Crossfade => "crossfade",
            Transition::Fade => "fade",
            Transition::SlideLeft => "slide-left",
            Transition::SlideRight => "slide-right",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transition {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Transition::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| SettingsError::UnknownTransition(s.to_string()))
    }
}

impl Serialize for Transition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Transition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let literal = String::deserialize(deserializer)?;
        literal.parse().map_err(serde::de::Error::custom)
    }
}

// ── RenderSettings ────────────────────────────────────────────────────────────

/// How displays should present the catalog.
///
/// The display interval is always strictly positive: [`RenderSettings::new`]
/// and the deserializer both reject zero and negative values, so the
/// display cycle never has to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSettings {
    #[serde(with = "positive_seconds")]
    item_display_duration: Duration,
    item_transition: Transition,
}

impl RenderSettings {
    /// Validate and build render settings from a whole number of seconds.
    ///
    /// # Errors
    /// [`SettingsError::NonPositiveDuration`] when `display_secs <= 0`.
    pub fn new(display_secs: i64, item_transition: Transition) -> Result<Self, SettingsError> {
        Ok(Self {
            item_display_duration: positive_seconds::checked(display_secs)?,
            item_transition,
        })
    }

    /// How long one item stays on screen.
    pub fn item_display_duration(&self) -> Duration {
        self.item_display_duration
    }

    pub fn item_transition(&self) -> Transition {
        self.item_transition
    }
}

/// Fifteen seconds per item with a fade.
impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            item_display_duration: Duration::from_secs(15),
            item_transition: Transition::default(),
        }
    }
}

/// Serde adapter: `Duration` ⇄ strictly positive whole seconds.
mod positive_seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    use crate::error::SettingsError;

    pub fn checked(secs: i64) -> Result<Duration, SettingsError> {
        if secs <= 0 {
            return Err(SettingsError::NonPositiveDuration(secs));
        }
        Ok(Duration::from_secs(secs as u64))
    }

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = i64::deserialize(deserializer)?;
        checked(secs).map_err(serde::de::Error::custom)
    }
}

// ── CatalogItem ───────────────────────────────────────────────────────────────

/// One piece of artwork the displays can show.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub studio: Option<String>,
    /// In minutes.
    pub runtime: u32,
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_rating: Option<String>,
    /// Popularity score, nominally `[0, 100]`.
    ///
    /// Out-of-range values are accepted here and clamped by
    /// [`rating_weight`](crate::selector::rating_weight).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<i32>,
    /// Opaque upstream reference used to fetch the image bytes through
    /// [`ARTWORK_ROUTE`].
    #[serde(rename = "plexPoster")]
    pub artwork: String,
}

impl CatalogItem {
    /// Footer line shown under the artwork, e.g. `PG-13 · A24 · 121m · 87% · 2019`.
    pub fn caption(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(5);
        if let Some(content_rating) = &self.content_rating {
            parts.push(content_rating.clone());
        }
        if let Some(studio) = &self.studio {
            parts.push(studio.clone());
        }
        parts.push(format!("{}m", self.runtime));
        if let Some(rating) = self.rating {
            parts.push(format!("{rating}%"));
        }
        parts.push(self.year.to_string());
        parts.join(" · ")
    }

    /// Badge colour for this item's content rating, if it has one.
    pub fn content_rating_tone(&self) -> Option<ContentRatingTone> {
        self.content_rating
            .as_deref()
            .map(ContentRatingTone::from_label)
    }

    /// Relative URL of the artwork on the Poster Box server.
    pub fn artwork_url(&self) -> String {
        format!("{ARTWORK_ROUTE}?path={}", self.artwork)
    }
}

/// Colour class of a content-rating badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRatingTone {
    Red,
    Orange,
    Blue,
    Green,
    Unknown,
}

impl ContentRatingTone {
    /// Classify a content-rating label such as `PG-13` or `TV-MA`.
    pub fn from_label(label: &str) -> Self {
        match label.to_lowercase().as_str() {
            "nr" | "not rated" | "unrated" | "r" | "tv-ma" => ContentRatingTone::Red,
            "pg-13" | "tv-14" => ContentRatingTone::Orange,
            "pg" | "tv-pg" | "tv-y7" => ContentRatingTone::Blue,
            "g" | "tv-g" | "tv-y" => ContentRatingTone::Green,
            _ => ContentRatingTone::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContentRatingTone::Red => "red",
            ContentRatingTone::Orange => "orange",
            ContentRatingTone::Blue => "blue",
            ContentRatingTone::Green => "green",
            ContentRatingTone::Unknown => "unknown",
        }
    }
}

// ── Catalog ───────────────────────────────────────────────────────────────────

/// Everything fetched in one sync cycle.
///
/// Equality is structural over settings and every item, which is what the
/// sync engine uses to suppress no-op updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub render_settings: RenderSettings,
    pub posters: Vec<Arc<CatalogItem>>,
}

impl Catalog {
    pub fn new(render_settings: RenderSettings, posters: Vec<CatalogItem>) -> Self {
        Self {
            render_settings,
            posters: posters.into_iter().map(Arc::new).collect(),
        }
    }

    /// Decode a catalog document.
    ///
    /// # Errors
    /// [`DecodeError::Json`] for malformed JSON, missing fields, an unknown
    /// transition or a non-positive display duration.
    pub fn from_json(bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Encode this catalog as the document served at [`DATA_ROUTE`].
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Replace every poster that is structurally equal to one in `previous`
    /// with `previous`'s handle.  Equal duplicates are paired one-to-one in
    /// order, so no handle is shared twice.
    pub fn adopt_identities(&mut self, previous: &Catalog) {
        let mut reusable: HashMap<&CatalogItem, VecDeque<&Arc<CatalogItem>>> = HashMap::new();
        for handle in &previous.posters {
            reusable
                .entry(handle.as_ref())
                .or_default()
                .push_back(handle);
        }

        for slot in &mut self.posters {
            if let Some(handle) = reusable.get_mut(slot.as_ref()).and_then(VecDeque::pop_front) {
                *slot = Arc::clone(handle);
            }
        }
    }
}

// ── ValidationToken ───────────────────────────────────────────────────────────

/// Opaque version marker (entity tag) of one catalog document.
///
/// Only equality is meaningful; tokens carry no ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidationToken(String);

impl ValidationToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ValidationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ValidationToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ValidationToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
