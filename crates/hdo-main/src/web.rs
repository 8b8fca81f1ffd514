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

//! Read-only JSON API over the last published tariff state

use std::future::Future;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use hdo_types::{PriceSlot, TariffState};
use serde::Serialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::DisplayConfig;
use crate::coordinator::SharedState;

#[derive(Clone, Debug)]
pub struct WebState {
    pub state: SharedState,
    pub display: DisplayConfig,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    last_success_at: Option<DateTime<Utc>>,
    consecutive_failures: u32,
    last_error: Option<String>,
}

#[derive(Debug, Serialize)]
struct StateResponse {
    #[serde(flatten)]
    tariff: TariffState,
    tariff_label: &'static str,
    slots_today: String,
    slots_tomorrow: String,
    /// The most recent cycle failed, values come from an earlier one
    stale: bool,
    low_tariff_color: String,
    high_tariff_color: String,
}

pub fn router(state: WebState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/state", get(state_handler))
        .route("/api/timeline", get(timeline_handler))
        .layer(CorsLayer::permissive()) // Allow HA Ingress
        .with_state(state)
}

pub async fn start_web_server(
    state: WebState,
    port: u16,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr = format!("0.0.0.0:{port}");
    info!("🌐 Starting web server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Web server failed")?;

    Ok(())
}

async fn health_handler(State(web): State<WebState>) -> impl IntoResponse {
    let state = web.state.read();
    let status = match (&state.last_good, state.is_stale()) {
        (None, false) => "starting",
        (None, true) => "error",
        (Some(_), true) => "degraded",
        (Some(_), false) => "ok",
    };

    Json(HealthResponse {
        status,
        last_success_at: state.last_success_at,
        consecutive_failures: state.consecutive_failures,
        last_error: state.last_error.clone(),
    })
}

async fn state_handler(State(web): State<WebState>) -> Response {
    let (tariff, stale) = {
        let state = web.state.read();
        (state.last_good.clone(), state.is_stale())
    };

    let Some(tariff) = tariff else {
        return not_ready();
    };

    Json(StateResponse {
        tariff_label: tariff.tariff.label(),
        slots_today: TariffState::format_slots(&tariff.intervals_today),
        slots_tomorrow: TariffState::format_slots(&tariff.intervals_tomorrow),
        stale,
        low_tariff_color: web.display.low_tariff_color.clone(),
        high_tariff_color: web.display.high_tariff_color.clone(),
        tariff,
    })
    .into_response()
}

async fn timeline_handler(State(web): State<WebState>) -> Response {
    let timeline: Option<Vec<PriceSlot>> = web
        .state
        .read()
        .last_good
        .as_ref()
        .map(|tariff| tariff.timeline().cloned().collect());

    match timeline {
        Some(slots) => Json(slots).into_response(),
        None => not_ready(),
    }
}

fn not_ready() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "error": "No tariff state computed yet" })),
    )
        .into_response()
}
