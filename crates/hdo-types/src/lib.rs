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

//! Shared data types for the HDO tariff engine
//!
//! Feed records (as published by the distributor), the site configuration and
//! the derived tariff state consumed by the web API.

pub mod feed;
pub mod site;
pub mod tariff;

pub use feed::{DayRule, FeedDate, RECURRING_YEAR, RegionLookupRow, ScheduleRecord, Tariff, TimeSlot};
pub use site::{DIRECT_MODE_REGION, SiteConfig, SiteIdentification};
pub use tariff::{
    NextSlot, PriceSlot, REMAINING_TIME_UNAVAILABLE, ResolvedInterval, SLOTS_PER_DAY,
    SLOT_MINUTES, TariffLevel, TariffState,
};
