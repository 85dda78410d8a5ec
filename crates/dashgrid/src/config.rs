#![forbid(unsafe_code)]

//! Dashboard configuration.
//!
//! [`DashboardConfig`] carries the class vocabulary, drag proxy styling and
//! timing knobs of one controller. Every field has a default, so partial
//! documents deserialize:
//!
//! ```toml
//! projection_debounce_ms = 120
//! drag_threshold = 4.0
//!
//! [class_names]
//! root = "application-dashboard-item"
//! insert_left = "application-dashboard-item-left"
//! insert_right = "application-dashboard-item-right"
//! ```
//!
//! With the `config-file` feature enabled the config can be loaded from JSON
//! or TOML text and files.

#[cfg(feature = "config-file")]
use std::path::Path;

use serde::{Deserialize, Serialize};
use web_time::Duration;

/// CSS-style class vocabulary the controller uses for identification and
/// insert indicators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassNames {
    /// Class carried by every tile root.
    pub root: String,
    /// Class of the tile's content node (the animated child).
    pub content: String,
    /// Indicator for "drop before this tile".
    pub insert_left: String,
    /// Indicator for "drop after this tile".
    pub insert_right: String,
}

impl Default for ClassNames {
    fn default() -> Self {
        Self {
            root: "dashboard-item".to_owned(),
            content: "dashboard-item-content".to_owned(),
            insert_left: "dashboard-item-left".to_owned(),
            insert_right: "dashboard-item-right".to_owned(),
        }
    }
}

impl ClassNames {
    #[must_use]
    pub fn new(
        root: impl Into<String>,
        content: impl Into<String>,
        insert_left: impl Into<String>,
        insert_right: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            content: content.into(),
            insert_left: insert_left.into(),
            insert_right: insert_right.into(),
        }
    }
}

/// Controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub class_names: ClassNames,
    /// Classes added to the floating drag proxy.
    pub proxy_classes: Vec<String>,
    /// Trailing-edge coalescing window of the layout projector.
    pub projection_debounce_ms: u64,
    /// Pointer travel (px) before an armed press becomes a drag. `0.0`
    /// starts the drag on the first move.
    pub drag_threshold: f64,
    /// Opacity applied to the source tile while it is dragged.
    pub dim_opacity: f32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            class_names: ClassNames::default(),
            proxy_classes: vec!["draggable-item-clone".to_owned(), "draggable".to_owned()],
            projection_debounce_ms: 250,
            drag_threshold: 0.0,
            dim_opacity: 0.1,
        }
    }
}

impl DashboardConfig {
    #[must_use]
    pub fn with_class_names(mut self, class_names: ClassNames) -> Self {
        self.class_names = class_names;
        self
    }

    #[must_use]
    pub fn with_proxy_classes<I, C>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.proxy_classes = classes.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_projection_debounce(mut self, window: Duration) -> Self {
        self.projection_debounce_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn with_drag_threshold(mut self, threshold: f64) -> Self {
        self.drag_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_dim_opacity(mut self, opacity: f32) -> Self {
        self.dim_opacity = opacity;
        self
    }

    /// Projection window as a [`Duration`].
    #[must_use]
    pub fn projection_window(&self) -> Duration {
        Duration::from_millis(self.projection_debounce_ms)
    }

    /// Check every field, collecting all problems.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        let names = [
            ("class_names.root", &self.class_names.root),
            ("class_names.content", &self.class_names.content),
            ("class_names.insert_left", &self.class_names.insert_left),
            ("class_names.insert_right", &self.class_names.insert_right),
        ];
        for (field, value) in names {
            if value.trim().is_empty() {
                errors.push(format!("{field} must not be empty"));
            } else if value.contains(char::is_whitespace) {
                errors.push(format!("{field} must be a single class, got {value:?}"));
            }
        }
        if self.class_names.insert_left == self.class_names.insert_right {
            errors.push("insert_left and insert_right must differ".to_owned());
        }
        if self.proxy_classes.iter().any(|class| class.trim().is_empty()) {
            errors.push("proxy_classes must not contain empty entries".to_owned());
        }
        if !self.drag_threshold.is_finite() || self.drag_threshold < 0.0 {
            errors.push(format!(
                "drag_threshold must be finite and >= 0 (got {})",
                self.drag_threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.dim_opacity) {
            errors.push(format!(
                "dim_opacity must be within 0.0..=1.0 (got {})",
                self.dim_opacity
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load from a JSON string and validate.
    #[cfg(feature = "config-file")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(ConfigError::Json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML string and validate.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, picking the format from the extension (`.json`,
    /// anything else is read as TOML).
    #[cfg(feature = "config-file")]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }
}

/// Errors from loading or validating a [`DashboardConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config-file")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config-file")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config-file")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config-file")]
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
            #[cfg(feature = "config-file")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config-file")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
