//! Tour configuration.

use std::path::PathBuf;

use log::warn;

use crate::quality::QualityTier;

/// Settings for a tour run.
///
/// Built with chained setters, or from the environment with
/// [`TourConfig::from_env`].
///
/// # Example
///
/// ```
/// use stellar::TourConfig;
///
/// let config = TourConfig::new()
///     .title("Night Sky")
///     .size(1920, 1080)
///     .auto_advance(true);
/// assert_eq!(config.width, 1920);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct TourConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub transition_duration: f32,
    pub auto_advance: bool,
    pub auto_advance_delay: f32,
    pub idle_reset_after: f32,
    /// Forced quality tier; `None` means detect from the adapter.
    pub quality: Option<QualityTier>,
    pub texture_dir: PathBuf,
    pub seed: u64,
}

impl Default for TourConfig {
    fn default() -> Self {
        Self {
            title: "Stellar".to_string(),
            width: 1280,
            height: 720,
            transition_duration: 3.0,
            auto_advance: false,
            auto_advance_delay: 8.0,
            idle_reset_after: 30.0,
            quality: None,
            texture_dir: PathBuf::from("assets/textures"),
            seed: 0x5EED,
        }
    }
}

impl TourConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn transition_duration(mut self, seconds: f32) -> Self {
        self.transition_duration = seconds;
        self
    }

    pub fn auto_advance(mut self, enabled: bool) -> Self {
        self.auto_advance = enabled;
        self
    }

    pub fn auto_advance_delay(mut self, seconds: f32) -> Self {
        self.auto_advance_delay = seconds;
        self
    }

    pub fn idle_reset_after(mut self, seconds: f32) -> Self {
        self.idle_reset_after = seconds;
        self
    }

    pub fn quality(mut self, tier: QualityTier) -> Self {
        self.quality = Some(tier);
        self
    }

    pub fn texture_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.texture_dir = dir.into();
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Defaults overlaid with `STELLAR_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`. Values that don't parse are logged and skipped.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = lookup("STELLAR_QUALITY") {
            match value.parse::<QualityTier>() {
                Ok(tier) => self.quality = Some(tier),
                Err(e) => warn!(target: "stellar::config", "STELLAR_QUALITY: {e}"),
            }
        }
        if let Some(value) = lookup("STELLAR_AUTO_ADVANCE") {
            match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.auto_advance = true,
                "0" | "false" | "no" | "off" => self.auto_advance = false,
                other => warn!(target: "stellar::config", "STELLAR_AUTO_ADVANCE: unrecognised '{other}'"),
            }
        }
        if let Some(value) = lookup("STELLAR_DURATION") {
            match value.trim().parse::<f32>() {
                Ok(seconds) if seconds.is_finite() && seconds > 0.0 => {
                    self.transition_duration = seconds
                }
                _ => warn!(target: "stellar::config", "STELLAR_DURATION: '{value}' is not a positive number"),
            }
        }
        if let Some(value) = lookup("STELLAR_TEXTURES") {
            self.texture_dir = PathBuf::from(value);
        }
        self
    }
}
