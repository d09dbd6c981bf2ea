#![forbid(unsafe_code)]

//! Tunable selection behaviour as data.
//!
//! [`SelectionConfig`] collects the platform and caret knobs in one struct
//! that can be loaded from TOML or JSON when the `config` feature is on.
//!
//! ```toml
//! behavior = "mac"
//! always_use_directional_selection = false
//!
//! [caret]
//! blink_interval_ms = 530
//! width = 2
//!
//! [bidi]
//! adjust_endpoints = true
//! ```
//!
//! `SelectionConfig::default()` matches the behaviour of a controller built
//! without any configuration.

#[cfg(feature = "config")]
use std::path::Path;
use std::time::Duration;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Platform conventions for extension and directionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum EditingBehavior {
    Mac,
    #[default]
    Unix,
    Windows,
}

impl EditingBehavior {
    /// Word, line and paragraph extension stops at the base instead of
    /// flipping across it.
    pub const fn should_extend_selection_by_word_or_line_across_caret(self) -> bool {
        !matches!(self, EditingBehavior::Mac)
    }

    /// Extending a range to a boundary grows it on the side facing the
    /// movement instead of moving the extent.
    pub const fn should_always_grow_selection_when_extending_to_boundary(self) -> bool {
        matches!(self, EditingBehavior::Mac)
    }

    pub const fn should_consider_selection_as_directional(self) -> bool {
        matches!(self, EditingBehavior::Mac)
    }
}

/// Caret appearance.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct CaretConfig {
    /// Half-period of the blink in milliseconds; 0 keeps the caret solid.
    pub blink_interval_ms: u64,
    /// Caret width in layout units.
    pub width: i32,
}

impl Default for CaretConfig {
    fn default() -> Self {
        Self {
            blink_interval_ms: 500,
            width: 1,
        }
    }
}

impl CaretConfig {
    pub fn blink_interval(&self) -> Option<Duration> {
        (self.blink_interval_ms > 0).then(|| Duration::from_millis(self.blink_interval_ms))
    }
}

/// Bidirectional text handling.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct BidiConfig {
    /// Flip the base to the far edge of an embedded run when extending into
    /// it from one of its boundaries.
    pub adjust_endpoints: bool,
}

impl Default for BidiConfig {
    fn default() -> Self {
        Self {
            adjust_endpoints: true,
        }
    }
}

/// Top-level selection configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct SelectionConfig {
    pub caret: CaretConfig,
    pub bidi: BidiConfig,
    pub behavior: EditingBehavior,
    /// Treat every selection as directional, as if built by extension.
    pub always_use_directional_selection: bool,
    /// Let committed changes move focus to the selection's editable root.
    pub move_focus_on_change: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            caret: CaretConfig::default(),
            bidi: BidiConfig::default(),
            behavior: EditingBehavior::default(),
            always_use_directional_selection: false,
            move_focus_on_change: true,
        }
    }
}

/// Longest blink half-period accepted by [`SelectionConfig::validate`].
pub const MAX_BLINK_INTERVAL_MS: u64 = 10_000;

/// Widest caret accepted by [`SelectionConfig::validate`].
pub const MAX_CARET_WIDTH: i32 = 16;

impl SelectionConfig {
    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Toml)?;
        config.validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(ConfigError::Json)?;
        config.validated()
    }

    /// Serialize to pretty TOML.
    #[cfg(feature = "config")]
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::TomlSer)
    }

    /// Check every parameter; an empty list means the config is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.caret.blink_interval_ms > MAX_BLINK_INTERVAL_MS {
            errors.push(format!(
                "caret.blink_interval_ms must be at most {MAX_BLINK_INTERVAL_MS}, got {}",
                self.caret.blink_interval_ms
            ));
        }
        if !(1..=MAX_CARET_WIDTH).contains(&self.caret.width) {
            errors.push(format!(
                "caret.width must be in 1..={MAX_CARET_WIDTH}, got {}",
                self.caret.width
            ));
        }
        errors
    }

    /// `self` if valid, otherwise every problem found.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Whether new selections should start out directional.
    pub fn directional_by_default(&self) -> bool {
        self.always_use_directional_selection
            || self.behavior.should_consider_selection_as_directional()
    }
}

/// Errors that can occur when loading a selection configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config")]
    Toml(toml::de::Error),
    /// TOML serialization error.
    #[cfg(feature = "config")]
    TomlSer(toml::ser::Error),
    /// JSON parse error.
    #[cfg(feature = "config")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config")]
            Self::TomlSer(e) => write!(f, "TOML serialize error: {e}"),
            #[cfg(feature = "config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config")]
            Self::TomlSer(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
