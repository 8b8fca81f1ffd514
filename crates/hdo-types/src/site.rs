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

//! Site identification and immutable per-site configuration

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Region reported for smart-meter sites, whose feed intervals are low-tariff windows
pub const DIRECT_MODE_REGION: &str = "TOU";

/// How a site is matched against the schedule feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode")]
pub enum SiteIdentification {
    /// Ripple-control receiver identified by the A/B/DP codes printed on it
    #[serde(rename = "classic")]
    ClassicCodes {
        postal_code: String,
        code_a: String,
        code_b: String,
        code_dp: String,
    },

    /// One or more HDO command codes, comma separated
    #[serde(rename = "hdo_codes")]
    MultiCode { postal_code: String, codes: String },

    /// Smart meter with a single command code, no region lookup
    #[serde(rename = "smart")]
    DirectCode { code: String },
}

impl SiteIdentification {
    /// Postal code with inner spaces removed, `None` for smart meters
    #[must_use]
    pub fn postal_code(&self) -> Option<String> {
        match self {
            Self::ClassicCodes { postal_code, .. } | Self::MultiCode { postal_code, .. } => {
                Some(postal_code.chars().filter(|c| !c.is_whitespace()).collect())
            }
            Self::DirectCode { .. } => None,
        }
    }

    /// Configured command codes, trimmed, empty entries dropped
    #[must_use]
    pub fn codes(&self) -> Vec<String> {
        match self {
            Self::MultiCode { codes, .. } => codes
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_owned)
                .collect(),
            Self::DirectCode { code } => vec![code.trim().to_owned()],
            Self::ClassicCodes { .. } => Vec::new(),
        }
    }

    #[must_use]
    pub fn needs_region(&self) -> bool {
        !matches!(self, Self::DirectCode { .. })
    }

    /// Human readable name of the site
    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::ClassicCodes {
                code_a,
                code_b,
                code_dp,
                ..
            } => format!(
                "EGD HDO {} A{code_a}B{code_b}P{code_dp}",
                self.postal_code().unwrap_or_default()
            ),
            Self::MultiCode { .. } => format!(
                "EGD HDO {} ({})",
                self.postal_code().unwrap_or_default(),
                self.codes().join(",")
            ),
            Self::DirectCode { code } => format!("EGD HDO Smart ({})", code.trim()),
        }
    }

    /// Stable identifier, one per physical site
    #[must_use]
    pub fn unique_id(&self) -> String {
        match self {
            Self::ClassicCodes {
                code_a,
                code_b,
                code_dp,
                ..
            } => format!(
                "{}_{code_a}_{code_b}_{code_dp}",
                self.postal_code().unwrap_or_default()
            ),
            Self::MultiCode { .. } => format!(
                "{}_{}",
                self.postal_code().unwrap_or_default(),
                self.codes().join(",")
            ),
            Self::DirectCode { code } => format!("smart_{}", code.trim()),
        }
    }
}

/// Everything the resolver needs to know about one connection
#[derive(Debug, Clone, PartialEq)]
pub struct SiteConfig {
    pub identification: SiteIdentification,

    /// Low tariff (NT) price per kWh
    pub price_nt: f32,

    /// High tariff (VT) price per kWh
    pub price_vt: f32,

    pub timezone: Tz,
}

impl SiteConfig {
    #[must_use]
    pub fn new(identification: SiteIdentification, price_nt: f32, price_vt: f32, timezone: Tz) -> Self {
        Self {
            identification,
            price_nt,
            price_vt,
            timezone,
        }
    }

    #[must_use]
    pub fn title(&self) -> String {
        self.identification.title()
    }

    #[must_use]
    pub fn unique_id(&self) -> String {
        self.identification.unique_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classic() -> SiteIdentification {
        SiteIdentification::ClassicCodes {
            postal_code: "671 68".to_owned(),
            code_a: "1".to_owned(),
            code_b: "8".to_owned(),
            code_dp: "05".to_owned(),
        }
    }

    #[test]
    fn test_classic_identity() {
        let site = classic();
        assert_eq!(site.postal_code().as_deref(), Some("67168"));
        assert_eq!(site.title(), "EGD HDO 67168 A1B8P05");
        assert_eq!(site.unique_id(), "67168_1_8_05");
        assert!(site.needs_region());
        assert!(site.codes().is_empty());
    }

    #[test]
    fn test_multi_code_splits_and_trims() {
        let site = SiteIdentification::MultiCode {
            postal_code: "37001".to_owned(),
            codes: " 405, 406 ,,".to_owned(),
        };
        assert_eq!(site.codes(), vec!["405", "406"]);
        assert_eq!(site.title(), "EGD HDO 37001 (405,406)");
        assert_eq!(site.unique_id(), "37001_405,406");
    }

    #[test]
    fn test_direct_code_has_no_postal_code() {
        let site = SiteIdentification::DirectCode {
            code: "Cd56".to_owned(),
        };
        assert!(site.postal_code().is_none());
        assert!(!site.needs_region());
        assert_eq!(site.title(), "EGD HDO Smart (Cd56)");
        assert_eq!(site.unique_id(), "smart_Cd56");
    }

    #[test]
    fn test_mode_tag_deserialization() {
        let site: SiteIdentification =
            serde_json::from_str(r#"{"mode": "smart", "code": "Cd56"}"#).unwrap();
        assert_eq!(
            site,
            SiteIdentification::DirectCode {
                code: "Cd56".to_owned()
            }
        );

        let site: SiteIdentification = serde_json::from_str(
            r#"{"mode": "classic", "postal_code": "67168", "code_a": "1", "code_b": "8", "code_dp": "5"}"#,
        )
        .unwrap();
        assert!(matches!(site, SiteIdentification::ClassicCodes { .. }));
    }
}
