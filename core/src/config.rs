use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;

/// Command line options for the kindred binary.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Override the data directory for the local store.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    /// Enable or disable logging (true/false).
    #[arg(long)]
    pub logging: Option<bool>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print story, view and profile counts from the local store.
    Stats,
    /// Delete expired stories from the local store.
    Purge,
}

/// Runtime configuration resolved from file, env and CLI.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base directory for the local store and media files.
    pub data_dir: PathBuf,
    /// Playback tick interval in milliseconds.
    pub tick_ms: u64,
    /// Candidate batch size for the swipe deck.
    pub candidate_batch: u32,
    /// Maximum video upload size in megabytes.
    pub max_video_mb: u64,
    /// Maximum image dimension after compression.
    pub max_image_dim: u32,
    /// Whether verbose logging is enabled.
    pub logging_enabled: bool,
}

#[derive(Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    playback: FilePlayback,
    #[serde(default)]
    discovery: FileDiscovery,
    #[serde(default)]
    media: FileMedia,
    #[serde(default)]
    logging: FileLogging,
}

#[derive(Deserialize)]
struct FilePlayback {
    #[serde(default = "default_tick_ms")]
    tick_ms: u64,
}

#[derive(Deserialize)]
struct FileDiscovery {
    #[serde(default = "default_batch")]
    batch: u32,
}

#[derive(Deserialize)]
struct FileMedia {
    #[serde(default = "default_video_mb")]
    max_video_mb: u64,
    #[serde(default = "default_image_dim")]
    max_image_dim: u32,
}

#[derive(Deserialize)]
struct FileLogging {
    #[serde(default = "default_logging")]
    enabled: bool,
}

fn default_tick_ms() -> u64 {
    80
}

fn default_batch() -> u32 {
    25
}

fn default_video_mb() -> u64 {
    20
}

fn default_image_dim() -> u32 {
    1080
}

fn default_logging() -> bool {
    true
}

impl Default for FilePlayback {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
        }
    }
}

impl Default for FileDiscovery {
    fn default() -> Self {
        Self {
            batch: default_batch(),
        }
    }
}

impl Default for FileMedia {
    fn default() -> Self {
        Self {
            max_video_mb: default_video_mb(),
            max_image_dim: default_image_dim(),
        }
    }
}

impl Default for FileLogging {
    fn default() -> Self {
        Self {
            enabled: default_logging(),
        }
    }
}

impl Config {
    /// Resolve configuration from CLI, environment variables, config file
    /// and defaults, in that precedence order.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut tick_ms = default_tick_ms();
        let mut candidate_batch = default_batch();
        let mut max_video_mb = default_video_mb();
        let mut max_image_dim = default_image_dim();
        let mut logging = default_logging();

        // config file path precedence: CLI -> ENV -> default
        let config_path = cli
            .config
            .clone()
            .or_else(|| std::env::var("KINDRED_CONFIG").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("config/kindred.toml"));

        if let Ok(bytes) = fs::read(&config_path) {
            let contents = String::from_utf8_lossy(&bytes);
            let file_cfg: FileConfig = toml::from_str(&contents).context("invalid config file")?;
            tick_ms = file_cfg.playback.tick_ms;
            candidate_batch = file_cfg.discovery.batch;
            max_video_mb = file_cfg.media.max_video_mb;
            max_image_dim = file_cfg.media.max_image_dim;
            logging = file_cfg.logging.enabled;
        }

        // environment overrides
        if let Ok(t) = std::env::var("KINDRED_TICK_MS") {
            if let Ok(t) = t.parse::<u64>() {
                tick_ms = t;
            }
        }
        if let Ok(l) = std::env::var("KINDRED_LOGGING") {
            if let Ok(l) = l.parse::<bool>() {
                logging = l;
            }
        }

        // CLI overrides
        if let Some(l) = cli.logging {
            logging = l;
        }

        // a tick outside this range either burns CPU or makes progress jump
        if !(10..=1000).contains(&tick_ms) {
            anyhow::bail!("invalid_tick_ms");
        }
        if candidate_batch == 0 {
            anyhow::bail!("invalid_batch");
        }

        let data_dir = cli
            .data_dir
            .clone()
            .or_else(|| std::env::var("KINDRED_DATA_DIR").ok().map(PathBuf::from))
            .unwrap_or_else(default_data_dir);

        Ok(Self {
            data_dir,
            tick_ms,
            candidate_batch,
            max_video_mb,
            max_image_dim,
            logging_enabled: logging,
        })
    }

    /// Video upload limit in bytes.
    pub fn max_video_bytes(&self) -> usize {
        (self.max_video_mb * 1024 * 1024) as usize
    }
}

/// Default data directory for the local store.
pub fn default_data_dir() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        let mut p = PathBuf::from(home);
        p.push(".local/share/kindred");
        p
    } else {
        PathBuf::from("./kindred_data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    fn cli_with(path: PathBuf) -> Cli {
        Cli {
            config: Some(path),
            data_dir: None,
            logging: None,
            command: Command::Stats,
        }
    }

    fn clear_env() {
        std::env::remove_var("KINDRED_TICK_MS");
        std::env::remove_var("KINDRED_LOGGING");
        std::env::remove_var("KINDRED_DATA_DIR");
    }

    #[test]
    #[serial]
    fn valid_config_parses() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.toml");
        fs::write(
            &path,
            "[playback]\ntick_ms=50\n[discovery]\nbatch=10\n[logging]\nenabled=false\n",
        )
        .unwrap();
        let cfg = Config::load(&cli_with(path)).unwrap();
        assert_eq!(cfg.tick_ms, 50);
        assert_eq!(cfg.candidate_batch, 10);
        assert!(!cfg.logging_enabled);
    }

    #[test]
    #[serial]
    fn invalid_tick_fails() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.toml");
        fs::write(&path, "[playback]\ntick_ms=5\n").unwrap();
        assert!(Config::load(&cli_with(path)).is_err());
    }

    #[test]
    #[serial]
    fn missing_keys_default() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.toml");
        fs::write(&path, "").unwrap();
        let cfg = Config::load(&cli_with(path)).unwrap();
        assert_eq!(cfg.tick_ms, 80);
        assert_eq!(cfg.candidate_batch, 25);
        assert_eq!(cfg.max_video_bytes(), 20 * 1024 * 1024);
        assert!(cfg.logging_enabled);
    }

    #[test]
    #[serial]
    fn env_overrides_file_and_cli_overrides_env() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.toml");
        fs::write(&path, "[playback]\ntick_ms=100\n[logging]\nenabled=true\n").unwrap();
        std::env::set_var("KINDRED_TICK_MS", "200");
        std::env::set_var("KINDRED_LOGGING", "true");
        let mut cli = cli_with(path);
        cli.logging = Some(false);
        let cfg = Config::load(&cli).unwrap();
        assert_eq!(cfg.tick_ms, 200);
        assert!(!cfg.logging_enabled);
        clear_env();
    }

    #[test]
    #[serial]
    fn data_dir_from_env() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.toml");
        fs::write(&path, "").unwrap();
        std::env::set_var("KINDRED_DATA_DIR", "/tmp/kindred-test");
        let cfg = Config::load(&cli_with(path)).unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/kindred-test"));
        clear_env();
    }
}
