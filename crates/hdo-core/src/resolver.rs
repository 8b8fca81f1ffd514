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

//! Tariff state facade
//!
//! [`TariffResolver`] ties the engine together: it resolves the site's region,
//! selects its records, expands them for today and tomorrow and derives the
//! current state and the price timeline. Each call is a pure recomputation
//! from the feeds passed in.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveTime, Timelike, Utc};
use hdo_types::{
    DIRECT_MODE_REGION, RegionLookupRow, ScheduleRecord, SiteConfig, SiteIdentification, TariffLevel,
    TariffState,
};
use tracing::debug;

use crate::error::HdoResult;
use crate::expander::expand;
use crate::holidays::{CzechHolidays, HolidayCalendar};
use crate::intervals::{DaySchedule, format_remaining, next_slot, remaining_minutes};
use crate::selector::{resolve_region, select_records};
use crate::timeline::{PriceRule, day_timeline};

pub struct TariffResolver {
    site: SiteConfig,
    holidays: Arc<dyn HolidayCalendar>,
}

impl fmt::Debug for TariffResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TariffResolver")
            .field("site", &self.site)
            .finish_non_exhaustive()
    }
}

impl TariffResolver {
    pub fn new(site: SiteConfig, holidays: Arc<dyn HolidayCalendar>) -> Self {
        Self { site, holidays }
    }

    pub fn with_czech_holidays(site: SiteConfig) -> Self {
        Self::new(site, Arc::new(CzechHolidays))
    }

    #[must_use]
    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    /// Grid region of the site, `TOU` for smart meters
    pub fn resolve_region(&self, rows: &[RegionLookupRow]) -> HdoResult<String> {
        match self.site.identification.postal_code() {
            Some(postal_code) => resolve_region(rows, &postal_code),
            None => Ok(DIRECT_MODE_REGION.to_owned()),
        }
    }

    /// Full tariff state at `now`
    ///
    /// `regions` is not consulted for smart meters and may be empty. Fails only
    /// when the postal code is unknown; broken records and slots are skipped.
    pub fn resolve(
        &self,
        schedule: &[ScheduleRecord],
        regions: &[RegionLookupRow],
        now: DateTime<Utc>,
    ) -> HdoResult<TariffState> {
        let tz = self.site.timezone;
        let site_region = self.resolve_region(regions)?;

        let records = select_records(schedule, &self.site.identification, &site_region);
        debug!(
            "Selected {} of {} HDO records for {} (region {site_region})",
            records.len(),
            schedule.len(),
            self.site.title()
        );

        let local_now = now.with_timezone(&tz);
        let today = local_now.date_naive();
        let tomorrow = today.succ_opt().unwrap_or(today);
        let now_time = minute_of(local_now.time());

        let days = expand(&records, today, self.holidays.as_ref());
        debug!(
            "Found {} slots today, {} tomorrow",
            days.today.len(),
            days.tomorrow.len()
        );

        let schedule_today = DaySchedule::new(&days.today);
        let schedule_tomorrow = DaySchedule::new(&days.tomorrow);

        let record_region = records
            .first()
            .map(|r| r.region.clone())
            .filter(|r| !r.is_empty());
        let is_tou = record_region.as_deref() == Some(DIRECT_MODE_REGION);
        let region = record_region.unwrap_or(site_region);

        let rule = PriceRule {
            price_nt: self.site.price_nt,
            price_vt: self.site.price_vt,
            inverted: is_tou,
        };

        let is_low = rule.is_low(schedule_today.is_active(now_time));
        let remaining = remaining_minutes(now_time, &schedule_today, &schedule_tomorrow);

        Ok(TariffState {
            is_low_tariff_active: is_low,
            tariff: TariffLevel::from_low(is_low),
            current_price: rule.price(is_low),
            remaining_time: format_remaining(remaining),
            region,
            is_tou,
            next_slot: next_slot(now_time, &schedule_today, &schedule_tomorrow),
            timeline_today: day_timeline(today, &schedule_today, rule, tz),
            timeline_tomorrow: day_timeline(tomorrow, &schedule_tomorrow, rule, tz),
            intervals_today: days.today,
            intervals_tomorrow: days.tomorrow,
            price_nt: self.site.price_nt,
            price_vt: self.site.price_vt,
            computed_at: local_now.fixed_offset(),
        })
    }

    /// Identification mode, for logging
    #[must_use]
    pub fn mode(&self) -> &'static str {
        match self.site.identification {
            SiteIdentification::ClassicCodes { .. } => "classic",
            SiteIdentification::MultiCode { .. } => "hdo_codes",
            SiteIdentification::DirectCode { .. } => "smart",
        }
    }
}

/// Drops seconds and sub-seconds
fn minute_of(t: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(t.hour(), t.minute(), 0).unwrap_or(t)
}
