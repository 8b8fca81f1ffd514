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

//! 15-minute price timeline
//!
//! Slots are laid out on the local wall clock: every day has exactly 96 slots
//! starting at 00:00, 00:15, ... 23:45 regardless of DST. The UTC offset of
//! each timestamp absorbs the shift. On the spring-forward day the skipped
//! wall-clock slots keep the offset of the slot before them; on the fall-back
//! day the repeated hour is listed once, with the earlier (summer) offset.
//! This is a wall-clock simplification, not elapsed-time exact.

use chrono::{DateTime, FixedOffset, LocalResult, NaiveDate, NaiveTime, Offset, TimeDelta, TimeZone};
use chrono_tz::Tz;
use hdo_types::{PriceSlot, SLOT_MINUTES, SLOTS_PER_DAY};

use crate::intervals::DaySchedule;

/// Unit prices and polarity used to price a slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRule {
    pub price_nt: f32,
    pub price_vt: f32,
    /// Slot membership means high tariff instead of low
    pub inverted: bool,
}

impl PriceRule {
    #[must_use]
    pub fn is_low(&self, in_slot: bool) -> bool {
        in_slot != self.inverted
    }

    #[must_use]
    pub fn price(&self, is_low: bool) -> f32 {
        if is_low { self.price_nt } else { self.price_vt }
    }
}

/// The 96 priced slots of `date`
#[must_use]
pub fn day_timeline(date: NaiveDate, schedule: &DaySchedule, rule: PriceRule, tz: Tz) -> Vec<PriceSlot> {
    let midnight = date.and_time(NaiveTime::MIN);
    let mut previous_offset: Option<FixedOffset> = None;
    let mut slots = Vec::with_capacity(SLOTS_PER_DAY);

    for index in 0..SLOTS_PER_DAY {
        let minutes = i64::try_from(index).unwrap_or_default() * SLOT_MINUTES;
        let wall = midnight + TimeDelta::minutes(minutes);

        let start = localize(tz, wall, previous_offset);
        previous_offset = Some(*start.offset());

        let in_slot = schedule.is_active(wall.time());
        slots.push(PriceSlot {
            start,
            price: rule.price(rule.is_low(in_slot)),
        });
    }

    slots
}

/// Attaches the zone offset to a wall-clock time
fn localize(tz: Tz, wall: chrono::NaiveDateTime, previous: Option<FixedOffset>) -> DateTime<FixedOffset> {
    match tz.from_local_datetime(&wall) {
        LocalResult::Single(dt) => dt.fixed_offset(),
        LocalResult::Ambiguous(earliest, _) => earliest.fixed_offset(),
        LocalResult::None => {
            // Inside the spring-forward gap
            let offset = previous.unwrap_or_else(|| tz.offset_from_utc_datetime(&wall).fix());
            DateTime::from_naive_utc_and_offset(wall - offset, offset)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use hdo_types::ResolvedInterval;

    const RULE: PriceRule = PriceRule {
        price_nt: 1.5,
        price_vt: 3.2,
        inverted: false,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn schedule() -> DaySchedule {
        DaySchedule::new(&[
            ResolvedInterval::new("00:00:00", "05:59:00"),
            ResolvedInterval::new("20:00:00", "21:59:00"),
        ])
    }

    #[test]
    fn test_ninety_six_quarter_hour_slots() {
        let slots = day_timeline(date(2025, 3, 10), &schedule(), RULE, chrono_tz::Europe::Prague);
        assert_eq!(slots.len(), 96);
        for (i, slot) in slots.iter().enumerate() {
            let minutes = slot.start.hour() * 60 + slot.start.minute();
            assert_eq!(minutes as usize, i * 15);
            assert_eq!(slot.start.offset().local_minus_utc(), 3600);
            assert!(slot.price == 1.5 || slot.price == 3.2);
        }
    }

    #[test]
    fn test_prices_follow_membership() {
        let slots = day_timeline(date(2025, 3, 10), &schedule(), RULE, chrono_tz::Europe::Prague);
        assert_eq!(slots[0].price, 1.5);
        assert_eq!(slots[23].price, 1.5);
        assert_eq!(slots[24].price, 3.2);
        assert_eq!(slots[80].price, 1.5);
        assert_eq!(slots[87].price, 1.5);
        assert_eq!(slots[88].price, 3.2);
    }

    #[test]
    fn test_inverted_polarity() {
        let rule = PriceRule { inverted: true, ..RULE };
        let slots = day_timeline(date(2025, 3, 10), &schedule(), rule, chrono_tz::Europe::Prague);
        assert_eq!(slots[0].price, 3.2);
        assert_eq!(slots[24].price, 1.5);
    }

    #[test]
    fn test_spring_forward_day() {
        let slots = day_timeline(date(2025, 3, 30), &schedule(), RULE, chrono_tz::Europe::Prague);
        assert_eq!(slots.len(), 96);
        // 02:00-02:45 do not exist locally and keep the winter offset
        assert_eq!(slots[8].start.hour(), 2);
        assert_eq!(slots[8].start.offset().local_minus_utc(), 3600);
        assert_eq!(slots[12].start.hour(), 3);
        assert_eq!(slots[12].start.offset().local_minus_utc(), 7200);
        assert_eq!(slots[8].start, slots[12].start);
    }

    #[test]
    fn test_fall_back_day() {
        let slots = day_timeline(date(2025, 10, 26), &schedule(), RULE, chrono_tz::Europe::Prague);
        assert_eq!(slots.len(), 96);
        assert_eq!(slots[8].start.hour(), 2);
        assert_eq!(slots[8].start.offset().local_minus_utc(), 7200);
        assert_eq!(slots[12].start.offset().local_minus_utc(), 3600);
    }
}
