use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_PUBLIC_ORIGIN: &str = "http://localhost";
const DEFAULT_COOLDOWN_MS: u64 = 3000;
const DEFAULT_SCAN_FPS: u32 = 10;
const DEFAULT_SCAN_BOX_SIZE: u32 = 250;

/// Which camera the decoder should prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingMode {
    /// Rear-facing camera.
    Environment,
    /// Front-facing camera.
    User,
}

/// Capture parameters handed to the decoder on every start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    pub facing_mode: FacingMode,
    /// Decode attempts per second.
    pub fps: u32,
    /// Side of the square decode window, in logical pixels.
    pub box_size: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::Environment,
            fps: DEFAULT_SCAN_FPS,
            box_size: DEFAULT_SCAN_BOX_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    /// Prefix for the relative validation links the backend hands out.
    pub public_origin: String,
    pub cooldown: Duration,
    pub capture: CaptureConfig,
    pub ticket_output_dir: PathBuf,
    pub api_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            public_origin: DEFAULT_PUBLIC_ORIGIN.to_string(),
            cooldown: Duration::from_millis(DEFAULT_COOLDOWN_MS),
            capture: CaptureConfig::default(),
            ticket_output_dir: PathBuf::from("."),
            api_timeout: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. Unset or
    /// unparsable values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_base_url = lookup("API_BASE_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.api_base_url);

        let public_origin = lookup("PUBLIC_ORIGIN")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.public_origin);

        let cooldown_ms = parse_or(&lookup, "SCAN_COOLDOWN_MS", DEFAULT_COOLDOWN_MS);
        let fps = parse_or(&lookup, "SCAN_FPS", DEFAULT_SCAN_FPS);
        let box_size = parse_or(&lookup, "SCAN_BOX_SIZE", DEFAULT_SCAN_BOX_SIZE);

        let ticket_output_dir = lookup("TICKET_OUTPUT_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.ticket_output_dir);

        let api_timeout = lookup("API_TIMEOUT_SECS").and_then(|raw| {
            match raw.trim().parse::<u64>() {
                Ok(0) => None,
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(e) => {
                    tracing::warn!("Config: Invalid API_TIMEOUT_SECS '{}': {}", raw, e);
                    None
                }
            }
        });

        Self {
            api_base_url,
            public_origin,
            cooldown: Duration::from_millis(cooldown_ms),
            capture: CaptureConfig {
                facing_mode: FacingMode::Environment,
                fps,
                box_size,
            },
            ticket_output_dir,
            api_timeout,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Config: Invalid {} '{}': {}, using default", key, raw, e);
                default
            }
        },
    }
}
