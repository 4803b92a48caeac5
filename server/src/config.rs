use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Runtime settings, read from the environment at boot.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub mpd_host: String,
    pub mpd_port: u16,
    /// Put MPD in consume mode so finished songs leave the playlist.
    pub mpd_consume: bool,
    pub settle_delay: Duration,
    pub song_timeout: Duration,
    pub reconnect_min: Duration,
    pub reconnect_max: Duration,
    pub youtube_dl: String,
    pub static_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mpd_host: "localhost".to_string(),
            mpd_port: 6600,
            mpd_consume: true,
            settle_delay: Duration::from_millis(500),
            song_timeout: Duration::from_secs(3600),
            reconnect_min: Duration::from_millis(500),
            reconnect_max: Duration::from_secs(60),
            youtube_dl: "youtube-dl".to_string(),
            static_dir: PathBuf::from("static"),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let config = Config {
            mpd_host: lookup("MPD_HOST").unwrap_or(defaults.mpd_host),
            mpd_port: parse_or(&lookup, "MPD_PORT", defaults.mpd_port)?,
            mpd_consume: parse_or(&lookup, "MPD_CONSUME", defaults.mpd_consume)?,
            settle_delay: Duration::from_millis(parse_or(
                &lookup,
                "JUKESHARE_SETTLE_MS",
                defaults.settle_delay.as_millis() as u64,
            )?),
            song_timeout: Duration::from_secs(parse_or(
                &lookup,
                "JUKESHARE_SONG_TIMEOUT_SECS",
                defaults.song_timeout.as_secs(),
            )?),
            reconnect_min: Duration::from_millis(parse_or(
                &lookup,
                "JUKESHARE_RECONNECT_MIN_MS",
                defaults.reconnect_min.as_millis() as u64,
            )?),
            reconnect_max: Duration::from_millis(parse_or(
                &lookup,
                "JUKESHARE_RECONNECT_MAX_MS",
                defaults.reconnect_max.as_millis() as u64,
            )?),
            youtube_dl: lookup("JUKESHARE_YOUTUBE_DL").unwrap_or(defaults.youtube_dl),
            static_dir: lookup("JUKESHARE_STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
        };

        if config.reconnect_min > config.reconnect_max {
            return Err(ConfigError::Invalid {
                key: "JUKESHARE_RECONNECT_MIN_MS",
                value: config.reconnect_min.as_millis().to_string(),
            });
        }

        Ok(config)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
