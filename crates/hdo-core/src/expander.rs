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

//! Expansion of weekly day rules into concrete slots for today and tomorrow

use chrono::{Datelike, NaiveDate};
use hdo_types::{ResolvedInterval, ScheduleRecord};
use tracing::warn;

use crate::holidays::HolidayCalendar;
use crate::intervals::normalize;
use crate::validity::applies_on;

/// Weekday code that covers Sundays and public holidays
pub const HOLIDAY_WEEKDAY: u8 = 7;

/// Slots of all selected records for two consecutive days, sorted by start
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandedDays {
    pub today: Vec<ResolvedInterval>,
    pub tomorrow: Vec<ResolvedInterval>,
}

/// Whether a rule labelled `weekday` applies on `date`
///
/// Holidays only match label 7, whatever weekday they fall on. Other dates
/// match their ISO weekday, which makes every ordinary Sunday a 7 as well.
pub fn matches_day(date: NaiveDate, weekday: u8, holidays: &dyn HolidayCalendar) -> bool {
    if holidays.is_public_holiday(date) {
        weekday == HOLIDAY_WEEKDAY
    } else {
        u32::from(weekday) == date.weekday().number_from_monday()
    }
}

/// Collects the slots of `records` for `today` and the following day
///
/// Validity is checked separately for each day, so a record ending today
/// contributes nothing to tomorrow. Records with malformed dates are skipped.
pub fn expand(records: &[&ScheduleRecord], today: NaiveDate, holidays: &dyn HolidayCalendar) -> ExpandedDays {
    let tomorrow = today.succ_opt().unwrap_or(today);
    let mut days = ExpandedDays::default();

    for record in records {
        let Some(valid_today) = check_validity(record, today) else {
            continue;
        };
        let valid_tomorrow = check_validity(record, tomorrow).unwrap_or(false);

        if valid_today {
            collect_slots(record, today, holidays, &mut days.today);
        }
        if valid_tomorrow {
            collect_slots(record, tomorrow, holidays, &mut days.tomorrow);
        }
    }

    normalize(&mut days.today);
    normalize(&mut days.tomorrow);
    days
}

fn check_validity(record: &ScheduleRecord, date: NaiveDate) -> Option<bool> {
    match applies_on(record, date) {
        Ok(valid) => Some(valid),
        Err(e) => {
            warn!(
                "Skipping HDO record (region {:?}, A{} B{} DP{} code {:?}): {e}",
                record.region, record.code_a, record.code_b, record.code_dp, record.direct_code
            );
            None
        }
    }
}

fn collect_slots(
    record: &ScheduleRecord,
    date: NaiveDate,
    holidays: &dyn HolidayCalendar,
    out: &mut Vec<ResolvedInterval>,
) {
    let slots = record
        .tariffs
        .iter()
        .flat_map(|tariff| &tariff.days)
        .filter(|rule| matches_day(date, rule.weekday, holidays))
        .flat_map(|rule| &rule.slots)
        .map(|slot| ResolvedInterval::new(slot.start.clone(), slot.end.clone()));

    out.extend(slots);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holidays::{CzechHolidays, FixedHolidays};
    use hdo_types::{DayRule, FeedDate, Tariff, TimeSlot};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rule(weekday: u8, start: &str, end: &str) -> DayRule {
        DayRule {
            weekday,
            slots: vec![TimeSlot::new(start, end)],
        }
    }

    fn record(from: FeedDate, to: FeedDate, days: Vec<DayRule>) -> ScheduleRecord {
        ScheduleRecord {
            region: "JM".to_owned(),
            valid_from: from,
            valid_to: to,
            tariffs: vec![Tariff {
                class: "D25d".to_owned(),
                days,
            }],
            ..ScheduleRecord::default()
        }
    }

    fn all_year(days: Vec<DayRule>) -> ScheduleRecord {
        record(FeedDate::new(9999, 1, 1), FeedDate::new(9999, 12, 31), days)
    }

    #[test]
    fn test_holiday_matches_only_rule_seven() {
        let holidays = FixedHolidays::new([date(2025, 3, 12)]);
        let wednesday = date(2025, 3, 12);
        assert!(matches_day(wednesday, 7, &holidays));
        assert!(!matches_day(wednesday, 3, &holidays));
    }

    #[test]
    fn test_ordinary_days_match_iso_weekday() {
        let holidays = FixedHolidays::default();
        assert!(matches_day(date(2025, 3, 12), 3, &holidays));
        assert!(matches_day(date(2025, 3, 16), 7, &holidays));
        assert!(!matches_day(date(2025, 3, 16), 6, &holidays));
        assert!(!matches_day(date(2025, 3, 12), 0, &holidays));
    }

    #[test]
    fn test_expand_today_and_tomorrow() {
        let r = all_year(vec![
            rule(1, "00:00:00", "05:59:00"),
            rule(2, "13:00:00", "15:00:00"),
            rule(2, "01:00:00", "03:00:00"),
        ]);
        let monday = date(2025, 3, 10);
        let days = expand(&[&r], monday, &FixedHolidays::default());

        assert_eq!(days.today, vec![ResolvedInterval::new("00:00:00", "05:59:00")]);
        assert_eq!(
            days.tomorrow,
            vec![
                ResolvedInterval::new("01:00:00", "03:00:00"),
                ResolvedInterval::new("13:00:00", "15:00:00"),
            ]
        );
    }

    #[test]
    fn test_new_year_holiday_uses_sunday_rule() {
        let r = all_year(vec![rule(3, "08:00:00", "10:00:00"), rule(7, "00:00:00", "23:59:00")]);
        // 2025-01-01 is a Wednesday
        let days = expand(&[&r], date(2025, 1, 1), &CzechHolidays);
        assert_eq!(days.today, vec![ResolvedInterval::new("00:00:00", "23:59:00")]);
        assert!(days.tomorrow.is_empty());
    }

    #[test]
    fn test_validity_checked_per_day() {
        let ending = record(
            FeedDate::new(2025, 3, 1),
            FeedDate::new(2025, 3, 31),
            (1..=7).map(|d| rule(d, "10:00:00", "11:00:00")).collect(),
        );
        let days = expand(&[&ending], date(2025, 3, 31), &FixedHolidays::default());
        assert_eq!(days.today.len(), 1);
        assert!(days.tomorrow.is_empty());
    }

    #[test]
    fn test_malformed_record_skipped() {
        let broken = record(
            FeedDate {
                year: "2025".to_owned(),
                month: "?".to_owned(),
                day: "1".to_owned(),
            },
            FeedDate::new(2025, 12, 31),
            vec![rule(1, "10:00:00", "11:00:00")],
        );
        let good = all_year(vec![rule(1, "12:00:00", "13:00:00")]);
        let days = expand(&[&broken, &good], date(2025, 3, 10), &FixedHolidays::default());
        assert_eq!(days.today, vec![ResolvedInterval::new("12:00:00", "13:00:00")]);
    }

    #[test]
    fn test_duplicate_records_keep_duplicate_slots() {
        let r = all_year(vec![rule(1, "12:00:00", "13:00:00")]);
        let days = expand(&[&r, &r], date(2025, 3, 10), &FixedHolidays::default());
        assert_eq!(days.today.len(), 2);
    }
}
