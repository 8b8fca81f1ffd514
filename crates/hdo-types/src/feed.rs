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

//! Records of the distributor's public HDO feeds
//!
//! The field names follow the JSON published at `hdo.distribuce24.cz`. The feed
//! is not consistent about value types (numbers are sometimes quoted, some
//! arrays are `null`), so every scalar is read leniently into a string and
//! interpreted later by the engine.

use serde::{Deserialize, Deserializer, Serialize};

/// Year value marking a record that applies every year
pub const RECURRING_YEAR: i32 = 9999;

/// One row of the region feed (`GET /region`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionLookupRow {
    #[serde(rename = "PSC", default, deserialize_with = "lenient_string")]
    pub postal_code: String,

    #[serde(rename = "Region", default, deserialize_with = "lenient_string")]
    pub region: String,
}

/// Calendar date as stored in the feed, kept verbatim
///
/// The year may be [`RECURRING_YEAR`]. Parsing and validation happen in the
/// validity resolver so that one broken record does not reject the whole feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedDate {
    #[serde(rename = "rok", default, deserialize_with = "lenient_string")]
    pub year: String,

    #[serde(rename = "mesic", default, deserialize_with = "lenient_string")]
    pub month: String,

    #[serde(rename = "den", default, deserialize_with = "lenient_string")]
    pub day: String,
}

impl FeedDate {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self {
            year: year.to_string(),
            month: month.to_string(),
            day: day.to_string(),
        }
    }
}

/// A single switching window, `HH:MM:SS` strings exactly as published
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    #[serde(rename = "od", default, deserialize_with = "lenient_string")]
    pub start: String,

    #[serde(rename = "do", default, deserialize_with = "lenient_string")]
    pub end: String,
}

impl TimeSlot {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// Slots for one ISO weekday
///
/// Weekday 7 covers Sundays and every public holiday. An unreadable weekday is
/// stored as 0 and never matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRule {
    #[serde(rename = "denVTydnu", default, deserialize_with = "lenient_weekday")]
    pub weekday: u8,

    #[serde(rename = "casy", default, deserialize_with = "null_as_default")]
    pub slots: Vec<TimeSlot>,
}

/// Tariff class of a record together with its weekly rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tariff {
    #[serde(rename = "sazba", default, deserialize_with = "lenient_string")]
    pub class: String,

    #[serde(rename = "dny", default, deserialize_with = "null_as_default")]
    pub days: Vec<DayRule>,
}

/// One switching rule of the schedule feed (`GET /casy`)
///
/// Classic sites are identified by `region` + `A` + `B` + `DP`; smart meters
/// and multi-command sites by the `kodHdo_A` command code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub region: String,

    #[serde(rename = "A", default, deserialize_with = "lenient_string")]
    pub code_a: String,

    #[serde(rename = "B", default, deserialize_with = "lenient_string")]
    pub code_b: String,

    #[serde(rename = "DP", default, deserialize_with = "lenient_string")]
    pub code_dp: String,

    #[serde(rename = "kodHdo_A", default, deserialize_with = "lenient_string")]
    pub direct_code: String,

    #[serde(rename = "od", default, deserialize_with = "null_as_default")]
    pub valid_from: FeedDate,

    #[serde(rename = "do", default, deserialize_with = "null_as_default")]
    pub valid_to: FeedDate,

    #[serde(rename = "sazby", default, deserialize_with = "null_as_default")]
    pub tariffs: Vec<Tariff>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientScalar {
    Text(String),
    Int(i64),
    Float(f64),
    Flag(bool),
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<LenientScalar>::deserialize(deserializer)? {
        Some(LenientScalar::Text(s)) => s,
        Some(LenientScalar::Int(i)) => i.to_string(),
        Some(LenientScalar::Float(f)) => f.to_string(),
        Some(LenientScalar::Flag(b)) => b.to_string(),
        None => String::new(),
    })
}

fn lenient_weekday<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = lenient_string(deserializer)?;
    Ok(raw.trim().parse().unwrap_or(0))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
