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

//! Validity of schedule records on a given date
//!
//! Records carry a `od`/`do` date range. A start year of [`RECURRING_YEAR`]
//! marks a seasonal record compared by month only, which may wrap over New
//! Year (October to March). Records with explicit years are compared as
//! closed date ranges, with two corrections for ranges crossing New Year:
//!
//! * a record that started in an earlier year in a month later than the
//!   current one is evaluated against the previous year, so a December to
//!   January record still applies in January;
//! * an end date that lies before the start (either an end year below the
//!   start year, or the same nominal year with an earlier month and day) is
//!   moved into the following year.

use chrono::{Datelike, NaiveDate};
use hdo_types::{FeedDate, RECURRING_YEAR, ScheduleRecord};

use crate::error::{HdoError, HdoResult};

/// Whether `record` is in effect on `date`
///
/// Unparsable date parts yield [`HdoError::MalformedRecord`]; callers skip such
/// records instead of failing the resolution.
pub fn applies_on(record: &ScheduleRecord, date: NaiveDate) -> HdoResult<bool> {
    let from = &record.valid_from;
    let to = &record.valid_to;

    let from_year: i32 = parse_part("od.rok", &from.year)?;
    let from_month: u32 = parse_part("od.mesic", &from.month)?;
    let to_month: u32 = parse_part("do.mesic", &to.month)?;

    if from_year == RECURRING_YEAR {
        return Ok(month_in_season(date.month(), from_month, to_month));
    }

    let to_year: i32 = parse_part("do.rok", &to.year)?;
    let from_day: u32 = parse_part("od.den", &from.day)?;
    let to_day: u32 = parse_part("do.den", &to.day)?;

    let mut effective_year = date.year();
    if from_year < effective_year && from_month > date.month() {
        effective_year -= 1;
    }

    let mut end_year = to_year;
    if to_year < from_year || (to_year == from_year && (to_month, to_day) < (from_month, from_day)) {
        end_year += 1;
    }

    let start = NaiveDate::from_ymd_opt(effective_year, from_month, from_day)
        .ok_or_else(|| HdoError::malformed("od", &describe(from)))?;
    let end = NaiveDate::from_ymd_opt(end_year, to_month, to_day)
        .ok_or_else(|| HdoError::malformed("do", &describe(to)))?;

    Ok(start <= date && date <= end)
}

/// Closed month range, wrapping over New Year when `from > to`
fn month_in_season(month: u32, from: u32, to: u32) -> bool {
    if from <= to {
        (from..=to).contains(&month)
    } else {
        month >= from || month <= to
    }
}

fn parse_part<T: std::str::FromStr>(field: &'static str, value: &str) -> HdoResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| HdoError::malformed(field, value))
}

fn describe(date: &FeedDate) -> String {
    format!("{}-{}-{}", date.year, date.month, date.day)
}
