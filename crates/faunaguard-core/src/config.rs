use std::fmt::Display;
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use faunaguard_detect::{DetectorKind, DetectorSettings};
use thiserror::Error;

use crate::alert::DangerousSet;

pub const DEFAULT_CAMERA_SECRET: &str = "camera_secret_123";
pub const DEFAULT_DANGEROUS_ANIMALS: [&str; 7] =
    ["lion", "tiger", "leopard", "bear", "elephant", "rhino", "wolf"];
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{var} has invalid value `{value}`: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub camera_secret: String,
    pub dangerous_animals: DangerousSet,
    pub confidence_threshold: f64,
    pub enforce_confidence_threshold: bool,
    pub detector: DetectorSettings,
    pub bind_addr: SocketAddr,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            camera_secret: DEFAULT_CAMERA_SECRET.to_string(),
            dangerous_animals: DangerousSet::from_labels(DEFAULT_DANGEROUS_ANIMALS),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            enforce_confidence_threshold: false,
            detector: DetectorSettings::default(),
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
        }
    }
}

impl Settings {
    /// Reads settings from the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary variable source; unset or blank variables keep their
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        if let Some(raw) = lookup("CAMERA_SECRET") {
            if raw.is_empty() {
                return Err(invalid("CAMERA_SECRET", &raw, "secret cannot be empty"));
            }
            settings.camera_secret = raw;
        }

        if let Some(raw) = get("DANGEROUS_ANIMALS") {
            let set = DangerousSet::from_labels(raw.split(','));
            if set.is_empty() {
                return Err(invalid(
                    "DANGEROUS_ANIMALS",
                    &raw,
                    "allow-list must name at least one label",
                ));
            }
            settings.dangerous_animals = set;
        }

        if let Some(raw) = get("CONFIDENCE_THRESHOLD") {
            settings.confidence_threshold = parse_unit_interval("CONFIDENCE_THRESHOLD", &raw)?;
        }

        if let Some(raw) = get("ENFORCE_CONFIDENCE_THRESHOLD") {
            settings.enforce_confidence_threshold = parse_bool("ENFORCE_CONFIDENCE_THRESHOLD", &raw)?;
        }

        if let Some(raw) = get("DETECTOR_KIND") {
            settings.detector.kind = raw
                .parse::<DetectorKind>()
                .map_err(|err| invalid("DETECTOR_KIND", &raw, err))?;
        }

        if let Some(raw) = get("DETECTOR_URL") {
            settings.detector.url = raw.trim().to_string();
        }

        if let Some(raw) = get("DETECTOR_TIMEOUT_SECS") {
            let secs: f64 = parse_value("DETECTOR_TIMEOUT_SECS", &raw)?;
            if !(secs.is_finite() && secs > 0.0) {
                return Err(invalid("DETECTOR_TIMEOUT_SECS", &raw, "must be a positive number"));
            }
            settings.detector.timeout = Duration::try_from_secs_f64(secs)
                .map_err(|err| invalid("DETECTOR_TIMEOUT_SECS", &raw, err))?;
        }

        if let Some(raw) = get("SINGLE_BEST_MIN_CONFIDENCE") {
            settings.detector.single_best_min_confidence =
                parse_unit_interval("SINGLE_BEST_MIN_CONFIDENCE", &raw)?;
        }

        if let Some(raw) = get("BIND_ADDR") {
            settings.bind_addr = parse_value("BIND_ADDR", &raw)?;
        }

        Ok(settings)
    }

    pub fn uses_default_secret(&self) -> bool {
        self.camera_secret == DEFAULT_CAMERA_SECRET
    }

    /// Threshold applied by the dangerous-label scan, if enforcement is switched on.
    pub fn min_confidence(&self) -> Option<f64> {
        self.enforce_confidence_threshold.then_some(self.confidence_threshold)
    }
}

fn invalid(var: &'static str, value: &str, reason: impl Display) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_value<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim().parse::<T>().map_err(|err| invalid(var, raw, err))
}

fn parse_unit_interval(var: &'static str, raw: &str) -> Result<f64, ConfigError> {
    let value: f64 = parse_value(var, raw)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(var, raw, "must be between 0 and 1"));
    }
    Ok(value)
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(var, raw, "expected true or false")),
    }
}
