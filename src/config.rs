use crate::error::ConfigError;
use crate::rr::RecordClass;
use crate::util::{fully_qualify, serial_by_date, to_seconds};
use serde::Deserialize;
use std::path::Path;

/// TTL applied when neither the zone text, the options nor an SOA supply one
pub const DEFAULT_TTL: u32 = 86_400;

/// Output suppression flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HideOptions {
    pub class: bool,
    pub ttl: bool,
    /// Write names relative to the zone origin
    pub origin: bool,
    /// Leave the owner blank when it repeats the previous record's
    pub same_owner: bool,
}

/// SOA timers used when an SOA has to be synthesized (tinydns `.` lines)
/// or a tinydns `Z` line leaves fields empty.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SoaDefaults {
    /// Falls back to today's date serial
    pub serial: Option<u32>,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

impl Default for SoaDefaults {
    fn default() -> Self {
        Self {
            serial: None,
            refresh: 16_384,
            retry: 2_048,
            expire: 1_048_576,
            minimum: 2_560,
        }
    }
}

impl SoaDefaults {
    pub fn serial(&self) -> u32 {
        self.serial.unwrap_or_else(|| serial_by_date(0))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ZoneOptions {
    /// Zone origin, fully qualified once set through [`ZoneOptions::set_origin`]
    pub origin: Option<String>,

    /// Default TTL for records that carry none
    pub ttl: Option<u32>,

    /// Class given to records that carry none
    pub class: RecordClass,

    pub hide: HideOptions,

    pub verbose: bool,

    /// Keep blank lines in the output
    pub show_blank: bool,

    /// Keep comment lines in the output
    pub show_comment: bool,

    pub soa_defaults: SoaDefaults,
}

impl ZoneOptions {
    /// Load options from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut options: ZoneOptions =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        if let Some(origin) = options.origin.take() {
            options.set_origin(&origin);
        }
        options.validate()?;
        Ok(options)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Defaults overridden by `DNS_ZONE_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env()
    }

    /// Layer `DNS_ZONE_*` environment variables over these options
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_vars(|key| std::env::var(key).ok())
    }

    fn with_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(origin) = var("DNS_ZONE_ORIGIN") {
            self.set_origin(&origin);
        }

        if let Some(ttl) = var("DNS_ZONE_TTL") {
            let seconds = to_seconds(&ttl).map_err(|_| ConfigError::InvalidTtl(ttl.clone()))?;
            self.ttl = Some(seconds);
        }

        if let Some(class) = var("DNS_ZONE_CLASS") {
            self.class = class.parse().map_err(ConfigError::InvalidClass)?;
        }

        if let Some(verbose) = var("DNS_ZONE_VERBOSE") {
            self.verbose = parse_bool(&verbose, self.verbose);
        }

        self.validate()?;
        Ok(self)
    }

    pub fn set_origin(&mut self, origin: &str) {
        self.origin = Some(fully_qualify(origin, None));
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl == Some(0) {
            return Err(ConfigError::InvalidTtl(
                "TTL must be greater than 0".to_string(),
            ));
        }

        if let Some(origin) = &self.origin {
            let labels = origin.trim_end_matches('.');
            let malformed = origin.is_empty()
                || origin.chars().any(char::is_whitespace)
                || (origin != "." && labels.split('.').any(str::is_empty))
                || labels.split('.').any(|l| l.len() > 63);
            if malformed {
                return Err(ConfigError::InvalidOrigin(origin.clone()));
            }
        }

        Ok(())
    }
}

/// Parse a boolean from a string, with a default value for invalid input
fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => default,
    }
}
