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

use async_trait::async_trait;
use hdo_core::HdoResult;
use hdo_types::{RegionLookupRow, ScheduleRecord};

/// Source of the two distributor feeds
///
/// Failures are reported as [`hdo_core::HdoError::FeedUnavailable`].
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Postal code to region table
    async fn fetch_regions(&self) -> HdoResult<Vec<RegionLookupRow>>;

    /// All switching rules of all regions
    async fn fetch_schedule(&self) -> HdoResult<Vec<ScheduleRecord>>;

    /// Source name for logging
    fn name(&self) -> &str;
}
