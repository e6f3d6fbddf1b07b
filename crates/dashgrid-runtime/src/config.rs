#![forbid(unsafe_code)]

//! Engine configuration as data.
//!
//! Selectors, identity settings, styling hooks, and width defaults live in
//! one [`EngineConfig`] that can be loaded from TOML or JSON. All sections
//! are optional; a partial document only overrides what it names.
//!
//! # Loading
//!
//! ```toml
//! # dashgrid.toml
//! [grid]
//! container_class = "dashboard-grid"
//!
//! [storage]
//! key = "dashboard-layout"
//!
//! [widths]
//! full_width_ids = ["stats-summary"]
//! default_columns = 3
//! ```
//!
//! ```rust,ignore
//! let config = EngineConfig::from_toml_file("dashgrid.toml")?.validated()?;
//! ```

use std::path::Path;

use dashgrid_core::identity::{DEFAULT_ID_ATTRIBUTE, DEFAULT_ID_PREFIX};
use dashgrid_core::{CardId, CardSelectors, IdentityResolver};
use dashgrid_layout::{STATS_SUMMARY_CARD_ID, WidthClass, WidthPolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default record key in the layout store.
pub const DEFAULT_STORAGE_KEY: &str = "dashboard-layout";

// ---------------------------------------------------------------------------
// Top-level EngineConfig
// ---------------------------------------------------------------------------

/// Complete configuration for one page session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How the grid and its cards are found.
    pub grid: GridConfig,
    /// How card ids are read and derived.
    pub identity: IdentityConfig,
    /// Classes the host can restyle.
    pub chrome: ChromeConfig,
    /// Persistence settings.
    pub storage: StorageConfig,
    /// Default widths.
    pub widths: WidthConfig,
}

/// Grid discovery selectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub container_class: String,
    pub card_class: String,
    pub synthetic_class: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        let selectors = CardSelectors::default();
        Self {
            container_class: selectors.container_class,
            card_class: selectors.card_class,
            synthetic_class: selectors.synthetic_class,
        }
    }
}

/// Card identity settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Attribute holding a native card id. Derived ids are written back here.
    pub id_attribute: String,
    /// Prefix for hash-derived ids.
    pub id_prefix: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            id_attribute: DEFAULT_ID_ATTRIBUTE.to_owned(),
            id_prefix: DEFAULT_ID_PREFIX.to_owned(),
        }
    }
}

/// Styling hooks the engine sets on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromeConfig {
    /// Carried by cards in the hidden partition.
    pub hidden_class: String,
    /// Carried by the visible/hidden divider.
    pub divider_class: String,
    /// Carried by the card being dragged.
    pub dragging_class: String,
    /// Carried by the container while the edit gate is active.
    pub edit_class: String,
}

impl Default for ChromeConfig {
    fn default() -> Self {
        Self {
            hidden_class: "dashgrid-hidden".to_owned(),
            divider_class: "dashgrid-divider".to_owned(),
            dragging_class: "dashgrid-dragging".to_owned(),
            edit_class: "dashgrid-editing".to_owned(),
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Record key for this page context.
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_STORAGE_KEY.to_owned(),
        }
    }
}

/// Width defaults for cards without a stored span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidthConfig {
    /// Cards that default to a full row.
    pub full_width_ids: Vec<String>,
    /// Column count for every other card.
    pub default_columns: u8,
}

impl Default for WidthConfig {
    fn default() -> Self {
        Self {
            full_width_ids: vec![STATS_SUMMARY_CARD_ID.to_owned()],
            default_columns: WidthClass::Half.columns(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading and validation
// ---------------------------------------------------------------------------

/// Errors produced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {}", problems.join("; "))]
    Invalid { problems: Vec<String> },
}

impl EngineConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Check names and defaults.
    ///
    /// Returns a list of problems. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let required = [
            ("grid.container_class", &self.grid.container_class),
            ("grid.card_class", &self.grid.card_class),
            ("grid.synthetic_class", &self.grid.synthetic_class),
            ("identity.id_attribute", &self.identity.id_attribute),
            ("chrome.hidden_class", &self.chrome.hidden_class),
            ("chrome.divider_class", &self.chrome.divider_class),
            ("chrome.dragging_class", &self.chrome.dragging_class),
            ("chrome.edit_class", &self.chrome.edit_class),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                errors.push(format!("{name} must not be empty"));
            } else if value.chars().any(char::is_whitespace) {
                errors.push(format!("{name} must not contain whitespace, got {value:?}"));
            }
        }

        // Cards are told apart from chrome by class alone.
        if self.grid.card_class == self.chrome.divider_class {
            errors.push("chrome.divider_class must differ from grid.card_class".into());
        }
        if self.grid.card_class == self.grid.container_class {
            errors.push("grid.card_class must differ from grid.container_class".into());
        }

        if !is_valid_storage_key(&self.storage.key) {
            errors.push(format!(
                "storage.key must be non-empty ASCII letters, digits, '.', '-' or '_' and not start with '.', got {:?}",
                self.storage.key
            ));
        }

        if WidthClass::from_columns(self.widths.default_columns).is_none() {
            errors.push(format!(
                "widths.default_columns must be one of 2, 3, 4, 6, got {}",
                self.widths.default_columns
            ));
        }

        errors
    }

    /// Return `self` if [`validate`](Self::validate) finds no problems.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let problems = self.validate();
        if problems.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Invalid { problems })
        }
    }

    #[must_use]
    pub fn selectors(&self) -> CardSelectors {
        CardSelectors {
            container_class: self.grid.container_class.clone(),
            card_class: self.grid.card_class.clone(),
            synthetic_class: self.grid.synthetic_class.clone(),
        }
    }

    #[must_use]
    pub fn resolver(&self) -> IdentityResolver {
        IdentityResolver::new(
            self.identity.id_attribute.clone(),
            self.identity.id_prefix.clone(),
        )
    }

    /// Width policy; an invalid `default_columns` falls back to half width.
    #[must_use]
    pub fn width_policy(&self) -> WidthPolicy {
        WidthPolicy {
            full_width_ids: self
                .widths
                .full_width_ids
                .iter()
                .map(|id| CardId::new(id.as_str()))
                .collect(),
            fallback: WidthClass::from_columns(self.widths.default_columns).unwrap_or_default(),
        }
    }
}

/// Whether `key` can double as a file name.
#[must_use]
pub fn is_valid_storage_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}
