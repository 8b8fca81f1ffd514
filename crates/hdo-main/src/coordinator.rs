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

//! Poll coordinator
//!
//! Runs one resolution cycle per poll interval. Cycles never overlap: a tick
//! that comes due while a cycle is still running is skipped. A failed cycle
//! leaves the last good tariff state in place.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hdo_adapters::FeedSource;
use hdo_core::{HdoError, HdoResult, TariffResolver};
use hdo_types::{RegionLookupRow, ScheduleRecord, TariffState};
use parking_lot::RwLock;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// What the web API reads
#[derive(Debug, Default)]
pub struct CoordinatorState {
    /// Result of the most recent successful cycle
    pub last_good: Option<TariffState>,
    pub last_success_at: Option<DateTime<Utc>>,
    /// Reason the most recent cycle failed, cleared on success
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
}

impl CoordinatorState {
    /// The published state predates a failed cycle
    pub fn is_stale(&self) -> bool {
        self.last_error.is_some()
    }
}

pub type SharedState = Arc<RwLock<CoordinatorState>>;

pub struct Coordinator {
    resolver: TariffResolver,
    source: Arc<dyn FeedSource>,
    state: SharedState,
    poll_interval: Duration,
    cycle_timeout: Duration,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("resolver", &self.resolver)
            .field("source", &self.source.name())
            .field("poll_interval", &self.poll_interval)
            .field("cycle_timeout", &self.cycle_timeout)
            .finish_non_exhaustive()
    }
}

impl Coordinator {
    pub fn new(
        resolver: TariffResolver,
        source: Arc<dyn FeedSource>,
        poll_interval: Duration,
        cycle_timeout: Duration,
    ) -> Self {
        Self {
            resolver,
            source,
            state: SharedState::default(),
            poll_interval,
            cycle_timeout,
        }
    }

    pub fn state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    /// Both feeds, fetched concurrently within the cycle timeout
    ///
    /// The region feed is not requested for smart meters.
    async fn fetch_feeds(&self) -> HdoResult<(Vec<ScheduleRecord>, Vec<RegionLookupRow>)> {
        let needs_region = self.resolver.site().identification.needs_region();

        let regions = async {
            if needs_region {
                self.source.fetch_regions().await
            } else {
                Ok(Vec::new())
            }
        };
        let feeds = async { tokio::try_join!(self.source.fetch_schedule(), regions) };

        tokio::time::timeout(self.cycle_timeout, feeds)
            .await
            .map_err(|_| HdoError::Timeout {
                secs: self.cycle_timeout.as_secs(),
            })?
    }

    /// One full cycle; the shared state is replaced only on success
    pub async fn run_cycle(&self) -> HdoResult<()> {
        let outcome = match self.fetch_feeds().await {
            Ok((schedule, regions)) => self.resolver.resolve(&schedule, &regions, Utc::now()),
            Err(e) => Err(e),
        };

        let mut state = self.state.write();
        match outcome {
            Ok(tariff) => {
                state.last_good = Some(tariff);
                state.last_success_at = Some(Utc::now());
                state.last_error = None;
                state.consecutive_failures = 0;
                Ok(())
            }
            Err(e) => {
                state.last_error = Some(e.to_string());
                state.consecutive_failures += 1;
                Err(e)
            }
        }
    }

    async fn poll_once(&self) {
        debug!("Running HDO poll cycle via {}", self.source.name());

        match self.run_cycle().await {
            Ok(()) => {
                let state = self.state.read();
                if let Some(tariff) = &state.last_good {
                    info!(
                        "HDO {} ({}): price {}, change in {}",
                        tariff.tariff.label(),
                        tariff.region,
                        tariff.current_price,
                        tariff.remaining_time
                    );
                }
            }
            Err(e) => {
                let failures = self.state.read().consecutive_failures;
                error!("HDO poll cycle failed ({failures} in a row): {e}");
            }
        }
    }

    /// Polls until `shutdown` resolves; the first cycle runs immediately
    pub async fn run(self, shutdown: impl Future<Output = ()>) {
        info!(
            "Polling HDO feeds every {}s for {} ({})",
            self.poll_interval.as_secs(),
            self.resolver.site().title(),
            self.resolver.mode()
        );

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => break,
                _ = ticker.tick() => {}
            }

            // A cycle in flight is abandoned on shutdown; state is only written at its end
            tokio::select! {
                biased;
                () = &mut shutdown => {
                    info!("Abandoning HDO poll cycle in flight");
                    break;
                }
                () = self.poll_once() => {}
            }
        }

        info!("Poll coordinator stopping");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hdo_core::FixedHolidays;
    use hdo_types::{DayRule, FeedDate, SiteConfig, SiteIdentification, Tariff, TimeSlot};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeSource {
        fail: AtomicBool,
        delay: Duration,
        region_calls: AtomicUsize,
        schedule_calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeSource {
        fn with_delay(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl FeedSource for FakeSource {
        async fn fetch_regions(&self) -> HdoResult<Vec<RegionLookupRow>> {
            self.region_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![RegionLookupRow {
                postal_code: "67168".to_owned(),
                region: "JM".to_owned(),
            }])
        }

        async fn fetch_schedule(&self) -> HdoResult<Vec<ScheduleRecord>> {
            self.schedule_calls.fetch_add(1, Ordering::SeqCst);
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(running, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail.load(Ordering::SeqCst) {
                return Err(HdoError::FeedUnavailable("503 Service Unavailable".to_owned()));
            }

            Ok(vec![ScheduleRecord {
                region: "JM".to_owned(),
                code_a: "1".to_owned(),
                code_b: "8".to_owned(),
                code_dp: "05".to_owned(),
                direct_code: "Cd56".to_owned(),
                valid_from: FeedDate::new(9999, 1, 1),
                valid_to: FeedDate::new(9999, 12, 31),
                tariffs: vec![Tariff {
                    class: "D25d".to_owned(),
                    days: (1..=7)
                        .map(|weekday| DayRule {
                            weekday,
                            slots: vec![TimeSlot::new("00:00:00", "23:59:00")],
                        })
                        .collect(),
                }],
            }])
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn coordinator(identification: SiteIdentification, source: Arc<FakeSource>) -> Coordinator {
        let site = SiteConfig::new(identification, 1.5, 3.2, chrono_tz::Europe::Prague);
        let resolver = TariffResolver::new(site, Arc::new(FixedHolidays::default()));
        Coordinator::new(resolver, source, Duration::from_secs(120), Duration::from_secs(30))
    }

    fn classic(postal_code: &str) -> SiteIdentification {
        SiteIdentification::ClassicCodes {
            postal_code: postal_code.to_owned(),
            code_a: "1".to_owned(),
            code_b: "8".to_owned(),
            code_dp: "5".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_successful_cycle_publishes_state() {
        let source = Arc::new(FakeSource::default());
        let coordinator = coordinator(classic("67168"), Arc::clone(&source));

        coordinator.run_cycle().await.unwrap();

        let state = coordinator.state();
        let state = state.read();
        let tariff = state.last_good.as_ref().unwrap();
        assert!(tariff.is_low_tariff_active);
        assert_eq!(tariff.region, "JM");
        assert!(state.last_success_at.is_some());
        assert!(!state.is_stale());
        assert_eq!(source.region_calls.load(Ordering::SeqCst), 1);
        assert_eq!(source.schedule_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_cycle_keeps_last_good() {
        let source = Arc::new(FakeSource::default());
        let coordinator = coordinator(classic("67168"), Arc::clone(&source));
        coordinator.run_cycle().await.unwrap();

        source.fail.store(true, Ordering::SeqCst);
        let err = coordinator.run_cycle().await.unwrap_err();
        assert!(matches!(err, HdoError::FeedUnavailable(_)));
        coordinator.run_cycle().await.unwrap_err();

        {
            let state = coordinator.state.read();
            assert!(state.last_good.is_some());
            assert!(state.is_stale());
            assert_eq!(state.consecutive_failures, 2);
        }

        source.fail.store(false, Ordering::SeqCst);
        coordinator.run_cycle().await.unwrap();
        let state = coordinator.state.read();
        assert_eq!(state.consecutive_failures, 0);
        assert!(state.last_error.is_none());
    }

    #[tokio::test]
    async fn test_unknown_postal_code_fails_cycle() {
        let source = Arc::new(FakeSource::default());
        let coordinator = coordinator(classic("37001"), source);

        let err = coordinator.run_cycle().await.unwrap_err();
        assert!(matches!(err, HdoError::RegionNotFound { .. }));
        assert!(coordinator.state.read().last_good.is_none());
    }

    #[tokio::test]
    async fn test_smart_meter_skips_region_feed() {
        let source = Arc::new(FakeSource::default());
        let smart = SiteIdentification::DirectCode {
            code: "Cd56".to_owned(),
        };
        let coordinator = coordinator(smart, Arc::clone(&source));

        coordinator.run_cycle().await.unwrap();

        assert_eq!(source.region_calls.load(Ordering::SeqCst), 0);
        let state = coordinator.state.read();
        assert_eq!(state.last_good.as_ref().unwrap().region, "JM");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_timeout() {
        let source = Arc::new(FakeSource::with_delay(Duration::from_secs(60)));
        let coordinator = coordinator(classic("67168"), source);

        let err = coordinator.run_cycle().await.unwrap_err();
        assert!(matches!(err, HdoError::Timeout { secs: 30 }));
        assert_eq!(coordinator.state.read().consecutive_failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_polls_on_interval_until_shutdown() {
        let source = Arc::new(FakeSource::default());
        let coordinator = coordinator(classic("67168"), Arc::clone(&source));
        let state = coordinator.state();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

        let handle = tokio::spawn(coordinator.run(async {
            let _ = stop_rx.await;
        }));

        tokio::time::sleep(Duration::from_secs(5 * 60)).await;
        stop_tx.send(()).unwrap();
        handle.await.unwrap();

        // Ticks at 0, 2 and 4 minutes
        assert_eq!(source.schedule_calls.load(Ordering::SeqCst), 3);
        assert!(state.read().last_good.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_cycles_do_not_overlap() {
        let source = Arc::new(FakeSource::with_delay(Duration::from_secs(25)));
        let site = SiteConfig::new(classic("67168"), 1.5, 3.2, chrono_tz::Europe::Prague);
        let resolver = TariffResolver::new(site, Arc::new(FixedHolidays::default()));
        let coordinator = Coordinator::new(
            resolver,
            Arc::clone(&source) as Arc<dyn FeedSource>,
            Duration::from_secs(10),
            Duration::from_secs(30),
        );
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

        let handle = tokio::spawn(coordinator.run(async {
            let _ = stop_rx.await;
        }));

        tokio::time::sleep(Duration::from_secs(120)).await;
        stop_tx.send(()).unwrap();
        handle.await.unwrap();

        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);
        // Back-to-back 25 s cycles at 0, 25, 50, 75 and 100 s; the last one is abandoned
        assert_eq!(source.schedule_calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_during_cycle_stops_immediately() {
        let source = Arc::new(FakeSource::with_delay(Duration::from_secs(25)));
        let site = SiteConfig::new(classic("67168"), 1.5, 3.2, chrono_tz::Europe::Prague);
        let resolver = TariffResolver::new(site, Arc::new(FixedHolidays::default()));
        let coordinator = Coordinator::new(
            resolver,
            Arc::clone(&source) as Arc<dyn FeedSource>,
            Duration::from_secs(10),
            Duration::from_secs(30),
        );
        let state = coordinator.state();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let started = tokio::time::Instant::now();

        let handle = tokio::spawn(coordinator.run(async {
            let _ = stop_rx.await;
        }));

        tokio::time::sleep(Duration::from_secs(5)).await;
        stop_tx.send(()).unwrap();
        handle.await.unwrap();

        assert_eq!(source.schedule_calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_secs(25));
        let state = state.read();
        assert!(state.last_good.is_none());
        assert_eq!(state.consecutive_failures, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_already_signalled_runs_no_cycle() {
        let source = Arc::new(FakeSource::default());
        let coordinator = coordinator(classic("67168"), Arc::clone(&source));

        coordinator.run(std::future::ready(())).await;

        assert_eq!(source.schedule_calls.load(Ordering::SeqCst), 0);
    }
}
