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

//! Public holiday calendars
//!
//! Weekday rule 7 of the schedule feed covers Sundays and every public holiday,
//! so the day expander needs to know which dates are holidays. The calendar is
//! injected into [`crate::TariffResolver`] once and shared between cycles.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, TimeDelta};

/// First year in which Good Friday is a public holiday in Czechia
const GOOD_FRIDAY_SINCE: i32 = 2016;

/// Fixed-date Czech public holidays as (month, day)
const CZECH_FIXED_HOLIDAYS: [(u32, u32); 11] = [
    (1, 1),   // Den obnovy samostatného českého státu, Nový rok
    (5, 1),   // Svátek práce
    (5, 8),   // Den vítězství
    (7, 5),   // Cyril a Metoděj
    (7, 6),   // Jan Hus
    (9, 28),  // Den české státnosti
    (10, 28), // Vznik samostatného československého státu
    (11, 17), // Den boje za svobodu a demokracii
    (12, 24), // Štědrý den
    (12, 25),
    (12, 26),
];

pub trait HolidayCalendar: Send + Sync {
    fn is_public_holiday(&self, date: NaiveDate) -> bool;
}

/// Czech statutory holidays, including the movable Easter days
#[derive(Debug, Clone, Copy, Default)]
pub struct CzechHolidays;

impl HolidayCalendar for CzechHolidays {
    fn is_public_holiday(&self, date: NaiveDate) -> bool {
        if CZECH_FIXED_HOLIDAYS.contains(&(date.month(), date.day())) {
            return true;
        }

        let Some(easter) = easter_sunday(date.year()) else {
            return false;
        };

        let easter_monday = easter + TimeDelta::days(1);
        let good_friday = easter - TimeDelta::days(2);

        date == easter_monday || (date.year() >= GOOD_FRIDAY_SINCE && date == good_friday)
    }
}

/// Explicit list of dates, used where a deterministic calendar is needed
#[derive(Debug, Clone, Default)]
pub struct FixedHolidays {
    dates: HashSet<NaiveDate>,
}

impl FixedHolidays {
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }
}

impl HolidayCalendar for FixedHolidays {
    fn is_public_holiday(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }
}

/// Easter Sunday in the Gregorian calendar (anonymous Gregorian algorithm)
#[must_use]
#[expect(
    clippy::integer_division,
    clippy::modulo_arithmetic,
    reason = "computus works on integer quotients"
)]
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year.rem_euclid(19);
    let b = year.div_euclid(100);
    let c = year.rem_euclid(100);
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;

    NaiveDate::from_ymd_opt(year, u32::try_from(month).ok()?, u32::try_from(day).ok()?)
}
