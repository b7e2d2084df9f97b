// Global configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub crop_detect: CropDetectConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub post: PostConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Audio language requests, e.g. ["en", "de?"] ("any", "any?" and "none" are special)
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    /// x264, x265, av1 or copy
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    #[serde(default = "default_tune")]
    pub tune: String,

    /// ffmpeg audio encoder name, or "copy"
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Ignored when audio is copied
    #[serde(default)]
    pub audio_bitrate_kbps: Option<u32>,

    /// "none", "auto" or "W:H:X:Y"
    #[serde(default = "default_crop")]
    pub crop: String,

    /// Output container extension used when no output path is given
    #[serde(default = "default_container")]
    pub container: String,

    /// Default overwrite setting (whether to overwrite existing output files)
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropDetectConfig {
    /// Seconds skipped before sampling (intros are often letterboxed differently)
    #[serde(default = "default_crop_skip")]
    pub skip_secs: u32,

    /// Length of the sampled window in seconds (0 = whole file)
    #[serde(default = "default_crop_duration")]
    pub duration_secs: u32,

    /// cropdetect black threshold (0.0-1.0)
    #[serde(default = "default_crop_limit")]
    pub limit: f32,

    /// Dimensions are rounded to a multiple of this
    #[serde(default = "default_crop_round")]
    pub round: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    #[serde(default = "default_mediainfo")]
    pub mediainfo: String,

    #[serde(default = "default_mkvpropedit")]
    pub mkvpropedit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostConfig {
    /// Rewrite Matroska track statistics tags after a successful encode
    #[serde(default = "default_true_config")]
    pub patch_statistics: bool,
}

fn default_languages() -> Vec<String> {
    vec!["any?".to_string()]
}

fn default_video_codec() -> String {
    "x264".to_string()
}

fn default_tune() -> String {
    "film".to_string()
}

fn default_audio_codec() -> String {
    "copy".to_string()
}

fn default_crop() -> String {
    "none".to_string()
}

fn default_container() -> String {
    "mkv".to_string()
}

fn default_crop_skip() -> u32 {
    120
}

fn default_crop_duration() -> u32 {
    300
}

fn default_crop_limit() -> f32 {
    0.094
}

fn default_crop_round() -> u32 {
    2
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_mediainfo() -> String {
    "mediainfo".to_string()
}

fn default_mkvpropedit() -> String {
    "mkvpropedit".to_string()
}

fn default_true_config() -> bool {
    true
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            video_codec: default_video_codec(),
            tune: default_tune(),
            audio_codec: default_audio_codec(),
            audio_bitrate_kbps: None,
            crop: default_crop(),
            container: default_container(),
            overwrite: false,
        }
    }
}

impl Default for CropDetectConfig {
    fn default() -> Self {
        Self {
            skip_secs: default_crop_skip(),
            duration_secs: default_crop_duration(),
            limit: default_crop_limit(),
            round: default_crop_round(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            mediainfo: default_mediainfo(),
            mkvpropedit: default_mkvpropedit(),
        }
    }
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            patch_statistics: default_true_config(),
        }
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "macos") {
            dirs::home_dir()
                .context("Could not determine home directory")?
                .join(".config")
                .join("movmux")
        } else {
            dirs::config_dir()
                .context("Could not determine config directory")?
                .join("movmux")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from disk, or create default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();

            // A read-only config directory is not fatal
            if let Err(e) = config.save() {
                tracing::warn!(
                    "could not create default config file ({}); using built-in defaults, run 'movmux init-config' to create one",
                    e
                );
            }

            Ok(config)
        }
    }

    /// Load config from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save config to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Check if config file exists
    pub fn exists() -> bool {
        Self::config_path().map(|p| p.exists()).unwrap_or(false)
    }

    /// Create a default config file if it doesn't exist
    pub fn ensure_default() -> Result<()> {
        if !Self::exists() {
            let config = Config::default();
            config.save()?;
        }
        Ok(())
    }
}
