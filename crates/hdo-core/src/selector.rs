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

//! Record selection
//!
//! Narrows the full schedule feed down to the records of one site.

use hdo_types::{RegionLookupRow, ScheduleRecord, SiteIdentification};

use crate::error::{HdoError, HdoResult};

/// Region of the first row registered for `postal_code`
///
/// Several rows may share a postal code; the first one wins. An unknown postal
/// code fails the whole resolution.
pub fn resolve_region(rows: &[RegionLookupRow], postal_code: &str) -> HdoResult<String> {
    rows.iter()
        .find(|row| row.postal_code.trim() == postal_code)
        .map(|row| row.region.clone())
        .ok_or_else(|| HdoError::RegionNotFound {
            postal_code: postal_code.to_owned(),
        })
}

/// Records matching the site identification, in feed order
///
/// `region` is ignored for smart meters. For multi-code sites the matches of
/// each configured code are concatenated in the order the codes are listed.
#[must_use]
pub fn select_records<'a>(
    records: &'a [ScheduleRecord],
    site: &SiteIdentification,
    region: &str,
) -> Vec<&'a ScheduleRecord> {
    match site {
        SiteIdentification::ClassicCodes {
            code_a,
            code_b,
            code_dp,
            ..
        } => {
            let padded_dp = format!("0{code_dp}");
            records
                .iter()
                .filter(|r| {
                    r.region == region
                        && r.code_a == *code_a
                        && r.code_b == *code_b
                        && (r.code_dp == *code_dp || r.code_dp == padded_dp)
                })
                .collect()
        }
        SiteIdentification::MultiCode { .. } => site
            .codes()
            .iter()
            .flat_map(|code| {
                records
                    .iter()
                    .filter(move |r| r.region == region && r.direct_code == *code)
            })
            .collect(),
        SiteIdentification::DirectCode { code } => records
            .iter()
            .filter(|r| r.direct_code == code.trim())
            .collect(),
    }
}
