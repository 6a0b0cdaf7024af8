//! # Session and Window Configuration
//!
//! Settings consumed by [`GraphicsSession`](crate::GraphicsSession) when it
//! starts up and opens windows.
//! Both types are serde-serializable so they can live in a TOML or RON file
//! next to the application.

use serde::{Serialize, Deserialize};

use crate::config::{Config, ConfigError};
use crate::error::{GfxError, GfxResult};

/// Smallest legal window side in pixels
pub const MIN_WINDOW_DIMENSION: u32 = 2;

/// Largest legal window side in pixels
pub const MAX_WINDOW_DIMENSION: u32 = 4096;

/// # Window Configuration
///
/// Describes one window and its rendering context. Windowed mode uses
/// `width` x `height`; full-screen mode ignores them and adopts the video
/// mode of the target monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title, empty when absent
    pub title: Option<String>,
    /// Client area width in pixels
    pub width: u32,
    /// Client area height in pixels
    pub height: u32,
    /// Whether the user may resize the window
    pub resizable: bool,
    /// Whether buffer swaps wait for vertical sync
    pub vsync: bool,
    /// Whether the window covers its target monitor
    pub fullscreen: bool,
}

impl WindowConfig {
    /// Create a windowed configuration with the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Create a full-screen configuration
    pub fn fullscreen() -> Self {
        Self {
            fullscreen: true,
            resizable: false,
            ..Self::default()
        }
    }

    /// Set the window title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set whether the window is resizable
    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    /// Set the vertical sync policy
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    /// Title to hand to the backend
    pub fn resolved_title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    /// Validate the configuration
    ///
    /// Windowed dimensions must lie in
    /// `[MIN_WINDOW_DIMENSION, MAX_WINDOW_DIMENSION]`. Full-screen windows take
    /// their size from the monitor, so their dimensions are not checked.
    pub fn validate(&self) -> GfxResult<()> {
        if self.fullscreen {
            return Ok(());
        }

        let legal = MIN_WINDOW_DIMENSION..=MAX_WINDOW_DIMENSION;
        if !legal.contains(&self.width) || !legal.contains(&self.height) {
            return Err(GfxError::IllegalDimensions {
                width: self.width,
                height: self.height,
            });
        }

        Ok(())
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: None,
            width: 800,
            height: 600,
            resizable: false,
            vsync: true,
            fullscreen: false,
        }
    }
}

/// # Session Configuration
///
/// Top-level configuration for an application built on this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// `env_logger` filter, e.g. `"info"` or `"gl_lifecycle=debug"`
    pub log_level: String,
    /// Configuration of the main window
    pub window: WindowConfig,
}

impl SessionConfig {
    /// Create a configuration with the given main window
    pub fn new(window: WindowConfig) -> Self {
        Self {
            window,
            ..Self::default()
        }
    }

    /// Set the log filter
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::Invalid("log level cannot be empty".to_string()));
        }
        self.window
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            window: WindowConfig::default(),
        }
    }
}

impl Config for SessionConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFormat;
    use crate::error::ErrorKind;

    #[test]
    fn test_dimension_bounds() {
        assert!(WindowConfig::new(2, 2).validate().is_ok());
        assert!(WindowConfig::new(4096, 4096).validate().is_ok());

        for (w, h) in [(1, 600), (800, 1), (4097, 600), (800, 4097), (0, 0)] {
            let err = WindowConfig::new(w, h).validate().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::PreconditionViolation, "{w}x{h}");
        }
    }

    #[test]
    fn test_fullscreen_skips_dimension_check() {
        let mut config = WindowConfig::fullscreen();
        config.width = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_title_defaults_to_empty() {
        assert_eq!(WindowConfig::default().resolved_title(), "");
        assert_eq!(WindowConfig::default().with_title("Tea").resolved_title(), "Tea");
    }

    #[test]
    fn test_session_config_from_toml() {
        let text = r#"
            log_level = "debug"

            [window]
            title = "Editor"
            width = 1024
            height = 768
            resizable = true
        "#;
        let config = SessionConfig::from_str_with(text, ConfigFormat::Toml).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.window.width, 1024);
        assert!(config.window.resizable);
        // Unset fields keep their defaults
        assert!(config.window.vsync);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_session_config_ron_round_trip() {
        let config = SessionConfig::new(WindowConfig::new(640, 480).with_title("ron"));
        let text = config.to_string_with(ConfigFormat::Ron).unwrap();
        let parsed = SessionConfig::from_str_with(&text, ConfigFormat::Ron).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_invalid_window_rejected_by_session() {
        let config = SessionConfig::new(WindowConfig::new(1, 1));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
