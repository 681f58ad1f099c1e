//! Server configuration loading and validation.
//!
//! The expected TOML structure is:
//! ```toml
//! itemDisplayDuration = "PT15S"
//! itemTransition = "fade"
//!
//! [plex]
//! host = "http://plex.local:32400"
//! token = "abc123"
//! libraries = ["Movies", "TV Shows"]
//! minimumRating = 60
//! syncIntervalDuration = "PT15M"
//! ```
//!
//! Durations are ISO-8601 (`PnDTnHnMnS`, optionally signed).  Every key is
//! optional; without a `[plex]` table nothing is ever published.  When the
//! table is present, `host` and `token` are required.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use posterbox::catalog::{RenderSettings, Transition};
use posterbox::error::SettingsError;

/// Default `itemDisplayDuration`.
pub const DEFAULT_ITEM_DISPLAY_SECS: i64 = 15;

/// Default `plex.syncIntervalDuration` (15 minutes).
pub const DEFAULT_PLEX_SYNC_SECS: i64 = 15 * 60;

// ── Errors ────────────────────────────────────────────────────────────────────

/// A configuration that parsed but is not usable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("{key} is not an ISO-8601 duration: {value:?}")]
    InvalidDuration { key: &'static str, value: String },

    #[error("minimum rating must be in the range [0, 100]: {0}")]
    MinimumRatingOutOfRange(i64),

    #[error("plex sync interval must be positive: {0}s")]
    NonPositiveSyncInterval(i64),

    #[error("plex {0} must not be empty")]
    MissingPlexField(&'static str),
}

// ── Private TOML deserialization types ────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    item_display_duration: Option<String>,
    #[serde(default)]
    item_transition: Option<String>,
    #[serde(default)]
    plex: Option<PlexTable>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct PlexTable {
    host: String,
    token: String,
    #[serde(default)]
    libraries: Option<BTreeSet<String>>,
    #[serde(default)]
    minimum_rating: i64,
    #[serde(default)]
    sync_interval_duration: Option<String>,
}

/// Resolve an optional ISO-8601 duration key to signed seconds.
fn duration_secs(
    key: &'static str,
    value: Option<&str>,
    default: i64,
) -> Result<i64, ConfigError> {
    match value {
        None => Ok(default),
        Some(text) => parse_iso8601_secs(text).ok_or_else(|| ConfigError::InvalidDuration {
            key,
            value: text.to_string(),
        }),
    }
}

/// Parse `[-]PnDTnHnMnS` into whole seconds.  Signs are kept so callers can
/// report negative durations instead of a format error.
fn parse_iso8601_secs(value: &str) -> Option<i64> {
    let (sign, rest) = match value.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, value),
    };
    let rest = rest.strip_prefix('P')?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((date, time)) => {
            if time.is_empty() {
                return None;
            }
            (date, time)
        }
        None => (rest, ""),
    };
    if date_part.is_empty() && time_part.is_empty() {
        return None;
    }

    let days = sum_components(date_part, |unit| (unit == 'D').then_some(86_400))?;
    let time = sum_components(time_part, |unit| match unit {
        'H' => Some(3_600),
        'M' => Some(60),
        'S' => Some(1),
        _ => None,
    })?;
    Some(sign * days.checked_add(time)?)
}

/// Sum `<digits><unit>` runs, weighting each by `scale(unit)`.
fn sum_components(part: &str, scale: impl Fn(char) -> Option<i64>) -> Option<i64> {
    let mut total: i64 = 0;
    let mut num = String::new();
    for ch in part.chars() {
        if ch.is_ascii_digit() {
            num.push(ch);
            continue;
        }
        if num.is_empty() {
            return None;
        }
        let parsed = num.parse::<i64>().ok()?;
        num.clear();
        total = total.checked_add(parsed.checked_mul(scale(ch)?)?)?;
    }
    num.is_empty().then_some(total)
}

// ── Public data structures ────────────────────────────────────────────────────

/// Connection and filtering settings for the Plex upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlexConfig {
    pub host: String,
    pub token: String,
    /// Library titles to include.  `None` means every movie and show library.
    pub libraries: Option<BTreeSet<String>>,
    /// Items rated below this (0–100, unrated counts as 0) are dropped.
    pub minimum_rating: u8,
    pub sync_interval: Duration,
}

/// Validated server configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerConfig {
    pub render_settings: RenderSettings,
    pub plex: Option<PlexConfig>,
}

impl ServerConfig {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    /// Returns an error if the TOML is structurally invalid or a value is out
    /// of range.
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content).context("Failed to parse TOML")?;
        Ok(Self::try_from(file)?)
    }

    /// Read, parse and validate the file at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or [`from_toml`](Self::from_toml)
    /// rejects it.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading server configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid configuration file: {}", path.display()))?;

        debug!(
            display_secs = config.render_settings.item_display_duration().as_secs(),
            transition = %config.render_settings.item_transition(),
            plex = config.plex.is_some(),
            "Loaded server configuration"
        );
        Ok(config)
    }
}

impl TryFrom<ConfigFile> for ServerConfig {
    type Error = ConfigError;

    fn try_from(file: ConfigFile) -> Result<Self, ConfigError> {
        let display_secs = duration_secs(
            "itemDisplayDuration",
            file.item_display_duration.as_deref(),
            DEFAULT_ITEM_DISPLAY_SECS,
        )?;
        let transition = match file.item_transition {
            Some(name) => name.parse::<Transition>()?,
            None => Transition::default(),
        };
        let render_settings = RenderSettings::new(display_secs, transition)?;

        let plex = file.plex.map(PlexConfig::try_from).transpose()?;

        Ok(Self {
            render_settings,
            plex,
        })
    }
}

impl TryFrom<PlexTable> for PlexConfig {
    type Error = ConfigError;

    fn try_from(table: PlexTable) -> Result<Self, ConfigError> {
        if table.host.trim().is_empty() {
            return Err(ConfigError::MissingPlexField("host"));
        }
        if table.token.trim().is_empty() {
            return Err(ConfigError::MissingPlexField("token"));
        }
        let minimum_rating = u8::try_from(table.minimum_rating)
            .ok()
            .filter(|r| *r <= 100)
            .ok_or(ConfigError::MinimumRatingOutOfRange(table.minimum_rating))?;
        let sync_secs = duration_secs(
            "plex.syncIntervalDuration",
            table.sync_interval_duration.as_deref(),
            DEFAULT_PLEX_SYNC_SECS,
        )?;
        if sync_secs <= 0 {
            return Err(ConfigError::NonPositiveSyncInterval(sync_secs));
        }

        Ok(Self {
            host: table.host,
            token: table.token,
            libraries: table.libraries,
            minimum_rating,
            sync_interval: Duration::from_secs(sync_secs as u64),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
