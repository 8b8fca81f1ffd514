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

//! Time-of-day interval arithmetic
//!
//! Feed slots are `HH:MM:SS` strings. End times use a legacy encoding that has
//! to be preserved exactly:
//!
//! * `23:59:00` (and the occasional `24:00:00`) means the end of the day, and
//!   the slot is closed: `start <= t <= 23:59:59`;
//! * any other end ending in `:59:00` means the following whole minute, so
//!   `20:00:00-21:59:00` behaves like `20:00:00-22:00:00`;
//! * everything else is half-open: `start <= t < end`. An end of `00:00:00`
//!   is therefore an empty slot.

use chrono::{NaiveTime, TimeDelta, Timelike};
use hdo_types::{NextSlot, REMAINING_TIME_UNAVAILABLE, ResolvedInterval};
use tracing::warn;

use crate::error::{HdoError, HdoResult};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

const END_OF_DAY_MARKERS: [&str; 2] = ["23:59:00", "24:00:00"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotEnd {
    /// Exclusive end
    Before(NaiveTime),
    /// Runs through 23:59:59 inclusive
    EndOfDay,
}

/// Parsed form of one slot with the end-time corrections applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotBounds {
    pub start: NaiveTime,
    pub end: SlotEnd,
}

impl SlotBounds {
    pub fn parse(interval: &ResolvedInterval) -> HdoResult<Self> {
        let start = parse_time(&interval.start)?;
        let end_raw = interval.end.trim();

        let end = if END_OF_DAY_MARKERS.contains(&end_raw) {
            SlotEnd::EndOfDay
        } else {
            let end = parse_time(end_raw)?;
            if end_raw.ends_with(":59:00") {
                SlotEnd::Before(end + TimeDelta::minutes(1))
            } else {
                SlotEnd::Before(end)
            }
        };

        Ok(Self { start, end })
    }

    #[must_use]
    pub fn contains(&self, t: NaiveTime) -> bool {
        match self.end {
            SlotEnd::Before(end) => self.start <= t && t < end,
            SlotEnd::EndOfDay => self.start <= t,
        }
    }

    /// Seconds from midnight of the exclusive end
    fn end_seconds(&self) -> i64 {
        match self.end {
            SlotEnd::Before(end) => seconds_of_day(end),
            SlotEnd::EndOfDay => SECONDS_PER_DAY,
        }
    }
}

/// Slots of one calendar day, parsed once
///
/// Unparsable slots are dropped with a warning.
#[derive(Debug, Clone, Default)]
pub struct DaySchedule {
    slots: Vec<(ResolvedInterval, SlotBounds)>,
}

impl DaySchedule {
    #[must_use]
    pub fn new(intervals: &[ResolvedInterval]) -> Self {
        let slots = intervals
            .iter()
            .filter_map(|interval| match SlotBounds::parse(interval) {
                Ok(bounds) => Some((interval.clone(), bounds)),
                Err(e) => {
                    warn!("Skipping HDO slot {}-{}: {e}", interval.start, interval.end);
                    None
                }
            })
            .collect();

        Self { slots }
    }

    #[must_use]
    pub fn is_active(&self, t: NaiveTime) -> bool {
        self.slots.iter().any(|(_, bounds)| bounds.contains(t))
    }

    fn containing(&self, t: NaiveTime) -> Option<&SlotBounds> {
        self.slots
            .iter()
            .map(|(_, bounds)| bounds)
            .find(|bounds| bounds.contains(t))
    }

    fn first_start_after(&self, t: NaiveTime) -> Option<&(ResolvedInterval, SlotBounds)> {
        self.slots.iter().find(|(_, bounds)| bounds.start > t)
    }

    fn first(&self) -> Option<&(ResolvedInterval, SlotBounds)> {
        self.slots.first()
    }
}

/// Membership test against raw feed intervals
#[must_use]
pub fn is_active(t: NaiveTime, intervals: &[ResolvedInterval]) -> bool {
    intervals
        .iter()
        .filter_map(|interval| SlotBounds::parse(interval).ok())
        .any(|bounds| bounds.contains(t))
}

/// Stable sort by start time, unparsable starts last
pub fn normalize(intervals: &mut [ResolvedInterval]) {
    intervals.sort_by_cached_key(|interval| match parse_time(&interval.start) {
        Ok(start) => (false, start),
        Err(_) => (true, NaiveTime::MIN),
    });
}

/// Minutes until the slot membership changes
///
/// Inside a slot this is the time to its end; outside, the time to the next
/// start today, or to tomorrow's first start. `None` when neither day has one.
#[must_use]
pub fn remaining_minutes(now: NaiveTime, today: &DaySchedule, tomorrow: &DaySchedule) -> Option<i64> {
    let now_secs = seconds_of_day(now);

    if let Some(bounds) = today.containing(now) {
        return Some((bounds.end_seconds() - now_secs).div_euclid(60));
    }

    if let Some((_, bounds)) = today.first_start_after(now) {
        return Some((seconds_of_day(bounds.start) - now_secs).div_euclid(60));
    }

    tomorrow
        .first()
        .map(|(_, bounds)| (SECONDS_PER_DAY + seconds_of_day(bounds.start) - now_secs).div_euclid(60))
}

/// `H:MM`, or `N/A` when no change is known
#[must_use]
pub fn format_remaining(minutes: Option<i64>) -> String {
    match minutes {
        Some(m) => format!("{}:{:02}", m.div_euclid(60), m.rem_euclid(60)),
        None => REMAINING_TIME_UNAVAILABLE.to_owned(),
    }
}

/// The next slot starting after `now`, looking at tomorrow if today has none
///
/// Works on raw slot membership; the caller decides what a slot means.
#[must_use]
pub fn next_slot(now: NaiveTime, today: &DaySchedule, tomorrow: &DaySchedule) -> Option<NextSlot> {
    if let Some((interval, _)) = today.first_start_after(now) {
        return Some(NextSlot {
            interval: interval.clone(),
            tomorrow: false,
        });
    }

    tomorrow.first().map(|(interval, _)| NextSlot {
        interval: interval.clone(),
        tomorrow: true,
    })
}

/// Parses `HH:MM:SS`, tolerating `HH:MM`
pub fn parse_time(value: &str) -> HdoResult<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| HdoError::malformed("cas", value))
}

fn seconds_of_day(t: NaiveTime) -> i64 {
    i64::from(t.num_seconds_from_midnight())
}
