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

//! Derived tariff state published after every successful poll cycle

use chrono::{DateTime, FixedOffset, TimeDelta, TimeZone};
use serde::{Deserialize, Serialize};

/// Number of price slots per calendar day
pub const SLOTS_PER_DAY: usize = 96;

/// Width of one price slot
pub const SLOT_MINUTES: i64 = 15;

/// Remaining time reported when no transition is known
pub const REMAINING_TIME_UNAVAILABLE: &str = "N/A";

/// A time-of-day window for a specific day, feed strings kept verbatim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedInterval {
    pub start: String,
    pub end: String,
}

impl ResolvedInterval {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// `HH:MM-HH:MM`
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}-{}", hour_minute(&self.start), hour_minute(&self.end))
    }
}

fn hour_minute(time: &str) -> &str {
    time.get(..5).unwrap_or(time)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TariffLevel {
    Low,
    High,
}

impl TariffLevel {
    #[must_use]
    pub fn from_low(is_low: bool) -> Self {
        if is_low { Self::Low } else { Self::High }
    }

    /// Czech abbreviation shown to users
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "NT",
            Self::High => "VT",
        }
    }
}

/// Price valid from `start` for [`SLOT_MINUTES`] minutes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSlot {
    pub start: DateTime<FixedOffset>,
    pub price: f32,
}

/// Next feed slot starting after now
///
/// Feed slots are low tariff windows, except in TOU mode where polarity is
/// inverted and the slot marks the next high tariff window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextSlot {
    pub interval: ResolvedInterval,
    pub tomorrow: bool,
}

/// Result of one full resolution
///
/// Built wholesale by the resolver and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffState {
    pub is_low_tariff_active: bool,
    pub tariff: TariffLevel,
    pub current_price: f32,
    /// `H:MM` or [`REMAINING_TIME_UNAVAILABLE`]
    pub remaining_time: String,
    /// Region of the first selected record, else the site's own region
    ///
    /// A smart meter without selected records reports `TOU` here while
    /// `is_tou` stays false: there are no slots to invert.
    pub region: String,
    /// Slot membership means high tariff; set from the selected records only
    pub is_tou: bool,
    pub intervals_today: Vec<ResolvedInterval>,
    pub intervals_tomorrow: Vec<ResolvedInterval>,
    pub timeline_today: Vec<PriceSlot>,
    pub timeline_tomorrow: Vec<PriceSlot>,
    /// Follows raw feed slots, see [`NextSlot`]
    pub next_slot: Option<NextSlot>,
    pub price_nt: f32,
    pub price_vt: f32,
    pub computed_at: DateTime<FixedOffset>,
}

impl TariffState {
    /// Today followed by tomorrow, 192 slots
    pub fn timeline(&self) -> impl Iterator<Item = &PriceSlot> {
        self.timeline_today.iter().chain(&self.timeline_tomorrow)
    }

    /// Price of the slot containing `at`, if it is within the forecast
    #[must_use]
    pub fn price_at<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> Option<f32> {
        let width = TimeDelta::minutes(SLOT_MINUTES);
        self.timeline()
            .find(|slot| slot.start <= *at && *at < slot.start + width)
            .map(|slot| slot.price)
    }

    /// Slots joined as `HH:MM-HH:MM, HH:MM-HH:MM`
    #[must_use]
    pub fn format_slots(intervals: &[ResolvedInterval]) -> String {
        intervals
            .iter()
            .map(ResolvedInterval::display)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offset() -> FixedOffset {
        FixedOffset::east_opt(3600).unwrap()
    }

    fn state_with_timeline() -> TariffState {
        let midnight = offset().with_ymd_and_hms(2025, 1, 14, 0, 0, 0).unwrap();
        let today = (0..96_i64)
            .map(|i| PriceSlot {
                start: midnight + TimeDelta::minutes(i * SLOT_MINUTES),
                price: if i < 32 { 1.5 } else { 3.2 },
            })
            .collect();
        TariffState {
            is_low_tariff_active: true,
            tariff: TariffLevel::Low,
            current_price: 1.5,
            remaining_time: "2:00".to_owned(),
            region: "JM".to_owned(),
            is_tou: false,
            intervals_today: vec![ResolvedInterval::new("00:00:00", "07:59:00")],
            intervals_tomorrow: Vec::new(),
            timeline_today: today,
            timeline_tomorrow: Vec::new(),
            next_slot: None,
            price_nt: 1.5,
            price_vt: 3.2,
            computed_at: midnight + TimeDelta::hours(6),
        }
    }

    #[test]
    fn test_interval_display() {
        let interval = ResolvedInterval::new("08:00:00", "19:59:00");
        assert_eq!(interval.display(), "08:00-19:59");
    }

    #[test]
    fn test_format_slots() {
        let slots = vec![
            ResolvedInterval::new("00:00:00", "05:59:00"),
            ResolvedInterval::new("13:00:00", "15:00:00"),
        ];
        assert_eq!(
            TariffState::format_slots(&slots),
            "00:00-05:59, 13:00-15:00"
        );
        assert_eq!(TariffState::format_slots(&[]), "");
    }

    #[test]
    fn test_tariff_labels() {
        assert_eq!(TariffLevel::from_low(true).label(), "NT");
        assert_eq!(TariffLevel::from_low(false).label(), "VT");
    }

    #[test]
    fn test_price_at() {
        let state = state_with_timeline();
        let early = offset().with_ymd_and_hms(2025, 1, 14, 7, 59, 0).unwrap();
        let late = offset().with_ymd_and_hms(2025, 1, 14, 8, 0, 0).unwrap();
        let outside = offset().with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap();
        assert_eq!(state.price_at(&early), Some(1.5));
        assert_eq!(state.price_at(&late), Some(3.2));
        assert_eq!(state.price_at(&outside), None);
        assert_eq!(state.timeline().count(), 96);
    }
}
