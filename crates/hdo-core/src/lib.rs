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

//! HDO tariff engine
//!
//! Turns the distributor's schedule and region feeds into the low/high tariff
//! state of one site: record selection, validity, weekday and holiday
//! expansion, interval arithmetic and the 15-minute price timeline. The crate
//! performs no I/O; feeds are fetched by `hdo-adapters`.

pub mod error;
pub mod expander;
pub mod holidays;
pub mod intervals;
pub mod resolver;
pub mod selector;
pub mod timeline;
pub mod validity;

pub use error::{HdoError, HdoResult};
pub use holidays::{CzechHolidays, FixedHolidays, HolidayCalendar};
pub use resolver::TariffResolver;
