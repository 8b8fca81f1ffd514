// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION HDO.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

mod validation;

pub use validation::ValidationResult;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use hdo_adapters::{DEFAULT_REGION_URL, DEFAULT_SCHEDULE_URL};
use hdo_types::{SiteConfig, SiteIdentification};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Files tried by [`AppConfig::load`], first match wins
static CONFIG_SOURCES: [&str; 3] = ["/data/options.json", "config.toml", "config.json"];

/// Application configuration - FluxION HDO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// How the site is identified in the schedule feed
    pub site: SiteIdentification,

    #[serde(default)]
    pub pricing: PricingConfig,

    #[serde(default)]
    pub system: SystemConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

/// Unit prices in CZK/kWh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Low tariff (NT)
    #[serde(default = "default_price_nt")]
    pub price_nt: f32,

    /// High tariff (VT)
    #[serde(default = "default_price_vt")]
    pub price_vt: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_poll_interval_minutes")]
    pub poll_interval_minutes: u64,

    /// Upper bound for fetching both feeds in one cycle
    #[serde(default = "default_cycle_timeout_secs")]
    pub cycle_timeout_secs: u64,

    /// IANA zone used for "today" and the timeline offsets
    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_web_port")]
    pub web_port: u16,

    #[serde(default = "default_region_url")]
    pub region_url: String,

    #[serde(default = "default_schedule_url")]
    pub schedule_url: String,
}

/// Colors handed to dashboards, no effect on the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_low_tariff_color")]
    pub low_tariff_color: String,

    #[serde(default = "default_high_tariff_color")]
    pub high_tariff_color: String,
}

fn default_price_nt() -> f32 {
    1.0
}

fn default_price_vt() -> f32 {
    2.0
}

fn default_poll_interval_minutes() -> u64 {
    2
}

fn default_cycle_timeout_secs() -> u64 {
    30
}

fn default_timezone() -> String {
    "Europe/Prague".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_web_port() -> u16 {
    8099
}

fn default_region_url() -> String {
    DEFAULT_REGION_URL.to_owned()
}

fn default_schedule_url() -> String {
    DEFAULT_SCHEDULE_URL.to_owned()
}

fn default_low_tariff_color() -> String {
    "#2196f3".to_owned()
}

fn default_high_tariff_color() -> String {
    "#ff5252".to_owned()
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            price_nt: default_price_nt(),
            price_vt: default_price_vt(),
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            poll_interval_minutes: default_poll_interval_minutes(),
            cycle_timeout_secs: default_cycle_timeout_secs(),
            timezone: default_timezone(),
            log_level: default_log_level(),
            web_port: default_web_port(),
            region_url: default_region_url(),
            schedule_url: default_schedule_url(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            low_tariff_color: default_low_tariff_color(),
            high_tariff_color: default_high_tariff_color(),
        }
    }
}

impl Default for AppConfig {
    /// Classic receiver without a postal code; only valid after overrides
    fn default() -> Self {
        Self {
            site: SiteIdentification::ClassicCodes {
                postal_code: String::new(),
                code_a: "1".to_owned(),
                code_b: "8".to_owned(),
                code_dp: "05".to_owned(),
            },
            pricing: PricingConfig::default(),
            system: SystemConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from HA addon options or a config file
    pub fn load() -> Result<Self> {
        let sources: Vec<&Path> = CONFIG_SOURCES.iter().map(Path::new).collect();
        Self::load_from_candidates(&sources)
    }

    /// First readable file among `candidates`, else defaults with environment overrides
    pub fn load_from_candidates(candidates: &[&Path]) -> Result<Self> {
        for path in candidates {
            if path.is_file() {
                let config = Self::from_path(path)?;
                info!("✅ Loaded configuration from {}", path.display());
                config.validate()?;
                return Ok(config);
            }
        }

        warn!("No configuration file found, using defaults with environment overrides");
        let config = Self::from_env();
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML or JSON file, chosen by extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let is_toml = path.extension().is_some_and(|ext| ext == "toml");
        if is_toml {
            toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))
        }
    }

    /// Defaults overridden from `HDO_*` environment variables
    fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Site selection: `HDO_CODE` with `HDO_POSTAL_CODE` is a multi-code site,
    /// `HDO_CODE` alone a smart meter, otherwise the classic A/B/DP receiver.
    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        let postal_code = var("HDO_POSTAL_CODE");
        config.site = match (postal_code, var("HDO_CODE")) {
            (Some(postal_code), Some(codes)) => SiteIdentification::MultiCode { postal_code, codes },
            (None, Some(code)) => SiteIdentification::DirectCode { code },
            (postal_code, None) => SiteIdentification::ClassicCodes {
                postal_code: postal_code.unwrap_or_default(),
                code_a: var("HDO_CODE_A").unwrap_or_else(|| "1".to_owned()),
                code_b: var("HDO_CODE_B").unwrap_or_else(|| "8".to_owned()),
                code_dp: var("HDO_CODE_DP").unwrap_or_else(|| "05".to_owned()),
            },
        };

        if let Some(price) = var("HDO_PRICE_NT").and_then(|v| v.parse().ok()) {
            config.pricing.price_nt = price;
        }
        if let Some(price) = var("HDO_PRICE_VT").and_then(|v| v.parse().ok()) {
            config.pricing.price_vt = price;
        }
        if let Some(minutes) = var("HDO_POLL_INTERVAL_MINUTES").and_then(|v| v.parse().ok()) {
            config.system.poll_interval_minutes = minutes;
        }
        if let Some(timezone) = var("HDO_TIMEZONE") {
            config.system.timezone = timezone;
        }

        config
    }

    /// Validate configuration with detailed error reporting
    pub fn validate_detailed(&self) -> ValidationResult {
        let mut result = ValidationResult::success();

        match &self.site {
            SiteIdentification::ClassicCodes {
                code_a,
                code_b,
                code_dp,
                ..
            } => {
                self.check_postal_code(&mut result);
                if !in_range(code_a, 1..=9) {
                    result.add_error("site.code_a", "Code A must be a number from 1 to 9");
                }
                if !in_range(code_b, 1..=9) {
                    result.add_error("site.code_b", "Code B must be a number from 1 to 9");
                }
                if !in_range(code_dp, 1..=16) {
                    result.add_error("site.code_dp", "Code DP must be a number from 01 to 16");
                }
            }
            SiteIdentification::MultiCode { .. } => {
                self.check_postal_code(&mut result);
                if self.site.codes().is_empty() {
                    result.add_error("site.codes", "At least one HDO code is required");
                }
            }
            SiteIdentification::DirectCode { code } => {
                if code.trim().is_empty() {
                    result.add_error("site.code", "Smart meter code cannot be empty");
                }
            }
        }

        if !(self.pricing.price_nt.is_finite() && self.pricing.price_nt > 0.0) {
            result.add_error("pricing.price_nt", "Low tariff price must be positive");
        }
        if !(self.pricing.price_vt.is_finite() && self.pricing.price_vt > 0.0) {
            result.add_error("pricing.price_vt", "High tariff price must be positive");
        }

        if !(1..=60).contains(&self.system.poll_interval_minutes) {
            result.add_error(
                "system.poll_interval_minutes",
                "Poll interval must be between 1 and 60 minutes",
            );
        }
        if self.system.cycle_timeout_secs == 0 {
            result.add_error("system.cycle_timeout_secs", "Cycle timeout must be positive");
        }
        if self.system.timezone.parse::<Tz>().is_err() {
            result.add_error(
                "system.timezone",
                format!("Unknown timezone '{}'", self.system.timezone),
            );
        }

        if !is_hex_color(&self.display.low_tariff_color) {
            result.add_error("display.low_tariff_color", "Color must be in #rrggbb format");
        }
        if !is_hex_color(&self.display.high_tariff_color) {
            result.add_error("display.high_tariff_color", "Color must be in #rrggbb format");
        }

        result
    }

    pub fn validate(&self) -> Result<()> {
        let result = self.validate_detailed();
        if !result.is_valid() {
            anyhow::bail!("Invalid configuration: {}", result.summary());
        }
        Ok(())
    }

    fn check_postal_code(&self, result: &mut ValidationResult) {
        let valid = self
            .site
            .postal_code()
            .is_some_and(|psc| psc.len() == 5 && psc.chars().all(|c| c.is_ascii_digit()));
        if !valid {
            result.add_error("site.postal_code", "Postal code must have five digits");
        }
    }

    /// Engine configuration of the site
    pub fn site_config(&self) -> Result<SiteConfig> {
        let timezone: Tz = self
            .system
            .timezone
            .parse()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("Invalid timezone '{}'", self.system.timezone))?;

        Ok(SiteConfig::new(
            self.site.clone(),
            self.pricing.price_nt,
            self.pricing.price_vt,
            timezone,
        ))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.system.poll_interval_minutes * 60)
    }

    pub fn cycle_timeout(&self) -> Duration {
        Duration::from_secs(self.system.cycle_timeout_secs)
    }
}

fn in_range(value: &str, range: std::ops::RangeInclusive<u8>) -> bool {
    value.trim().parse::<u8>().is_ok_and(|v| range.contains(&v))
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value.chars().skip(1).all(|c| c.is_ascii_hexdigit())
}
