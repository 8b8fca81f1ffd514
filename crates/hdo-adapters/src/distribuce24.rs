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

//! HTTP client for the EG.D public HDO feeds at `hdo.distribuce24.cz`

use std::time::Duration;

use async_trait::async_trait;
use hdo_core::{HdoError, HdoResult};
use hdo_types::{RegionLookupRow, ScheduleRecord};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::source::FeedSource;

pub const DEFAULT_REGION_URL: &str = "https://hdo.distribuce24.cz/region";
pub const DEFAULT_SCHEDULE_URL: &str = "https://hdo.distribuce24.cz/casy";

const USER_AGENT: &str = concat!("fluxion-hdo/", env!("CARGO_PKG_VERSION"));

/// Per-request timeout, the poll cycle has its own overall bound
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct Distribuce24Client {
    client: Client,
    region_url: String,
    schedule_url: String,
}

impl Distribuce24Client {
    pub fn new(region_url: impl Into<String>, schedule_url: impl Into<String>) -> HdoResult<Self> {
        Self::with_timeout(region_url, schedule_url, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        region_url: impl Into<String>,
        schedule_url: impl Into<String>,
        timeout: Duration,
    ) -> HdoResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| HdoError::FeedUnavailable(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            region_url: region_url.into(),
            schedule_url: schedule_url.into(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> HdoResult<T> {
        debug!("Fetching {url}");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| HdoError::FeedUnavailable(format!("Request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HdoError::FeedUnavailable(format!("{url} returned {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| HdoError::FeedUnavailable(format!("Failed to read {url}: {e}")))?;

        serde_json::from_str(&body)
            .map_err(|e| HdoError::FeedUnavailable(format!("Failed to decode {url}: {e}")))
    }
}

#[async_trait]
impl FeedSource for Distribuce24Client {
    async fn fetch_regions(&self) -> HdoResult<Vec<RegionLookupRow>> {
        let rows: Vec<RegionLookupRow> = self.get_json(&self.region_url).await?;
        debug!("Region feed: {} rows", rows.len());
        Ok(rows)
    }

    async fn fetch_schedule(&self) -> HdoResult<Vec<ScheduleRecord>> {
        let records: Vec<ScheduleRecord> = self.get_json(&self.schedule_url).await?;
        debug!("Schedule feed: {} records", records.len());
        Ok(records)
    }

    fn name(&self) -> &str {
        "distribuce24"
    }
}
