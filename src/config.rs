use crate::probe::{TitleSource, DEFAULT_BATCH_SIZE};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration loaded from ~/.config/audiobook-repack/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub chapters: ChaptersConfig,
}

/// External executables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Encoder/muxer used for metadata export and concatenation
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: PathBuf,

    /// Inspector used for durations and tags
    #[serde(default = "default_ffprobe")]
    pub ffprobe: PathBuf,
}

fn default_ffmpeg() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe() -> PathBuf {
    PathBuf::from("ffprobe")
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
        }
    }
}

/// Configuration for duration/tag probing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Inspector processes run at once (default: 5)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Seconds before a single probe is abandoned (default: 120)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChaptersConfig {
    #[serde(default)]
    pub title_source: TitleSource,
}

impl Config {
    /// Load configuration from the default path (~/.config/audiobook-repack/config.toml)
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;

        toml::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join("audiobook-repack").join("config.toml"))
    }

    /// Get the batch size, with CLI override taking precedence
    pub fn batch_size(&self, cli_override: Option<usize>) -> usize {
        cli_override.unwrap_or(self.probe.batch_size).max(1)
    }

    /// Get the chapter title source, with CLI override taking precedence
    pub fn title_source(&self, cli_override: Option<TitleSource>) -> TitleSource {
        cli_override.unwrap_or(self.chapters.title_source)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe.timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.tools.ffmpeg, PathBuf::from("ffmpeg"));
        assert_eq!(config.tools.ffprobe, PathBuf::from("ffprobe"));
        assert_eq!(config.probe.batch_size, 5);
        assert_eq!(config.probe.timeout_secs, 120);
        assert_eq!(config.chapters.title_source, TitleSource::Filename);
    }

    #[test]
    fn test_load_valid_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[tools]
ffmpeg = "/opt/ffmpeg/bin/ffmpeg"

[probe]
batch_size = 8

[chapters]
title_source = "tag"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.tools.ffmpeg, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        // Unset keys in a present section keep their defaults
        assert_eq!(config.tools.ffprobe, PathBuf::from("ffprobe"));
        assert_eq!(config.probe.batch_size, 8);
        assert_eq!(config.probe.timeout_secs, 120);
        assert_eq!(config.chapters.title_source, TitleSource::Tag);
    }

    #[test]
    fn test_load_malformed_config_names_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[probe]\nbatch_size = \"many\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_cli_override() {
        let config = Config {
            probe: ProbeConfig {
                batch_size: 3,
                timeout_secs: 10,
            },
            chapters: ChaptersConfig {
                title_source: TitleSource::Tag,
            },
            ..Config::default()
        };

        // CLI override takes precedence
        assert_eq!(config.batch_size(Some(7)), 7);
        assert_eq!(
            config.title_source(Some(TitleSource::Filename)),
            TitleSource::Filename
        );

        // Falls back to config when no CLI override
        assert_eq!(config.batch_size(None), 3);
        assert_eq!(config.title_source(None), TitleSource::Tag);
    }

    #[test]
    fn test_batch_size_is_at_least_one() {
        let config = Config::default();
        assert_eq!(config.batch_size(Some(0)), 1);
    }

    #[test]
    fn test_probe_timeout() {
        let mut config = Config::default();
        assert_eq!(config.probe_timeout(), Duration::from_secs(120));
        config.probe.timeout_secs = 0;
        assert_eq!(config.probe_timeout(), Duration::from_secs(1));
    }
}
