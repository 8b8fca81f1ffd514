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

//! Error types for the tariff engine

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HdoError {
    #[error("postal code {postal_code} not found in region feed")]
    RegionNotFound { postal_code: String },

    #[error("feed unavailable: {0}")]
    FeedUnavailable(String),

    #[error("malformed record field {field}: {value:?}")]
    MalformedRecord { field: &'static str, value: String },

    #[error("poll cycle timed out after {secs}s")]
    Timeout { secs: u64 },
}

impl HdoError {
    /// Whether the error aborts a whole poll cycle
    ///
    /// Malformed records are recovered where they occur and never reach the scheduler.
    #[must_use]
    pub fn is_cycle_failure(&self) -> bool {
        !matches!(self, Self::MalformedRecord { .. })
    }

    pub(crate) fn malformed(field: &'static str, value: &str) -> Self {
        Self::MalformedRecord {
            field,
            value: value.to_owned(),
        }
    }
}

pub type HdoResult<T> = std::result::Result<T, HdoError>;
