//! HTTP API for the Refund Engine.
//!
//! This module exposes the season refund reports over a small REST API
//! built with [`axum`](https://crates.io/crates/axum).  Handlers load a
//! season snapshot from the [`SeasonRepository`], prepare the engine
//! inputs, run [`calculate_refund`] against the reference day start of
//! the request, and return JSON.

use crate::auth::{AdminEmailPolicy, AuthorizationPolicy, Viewer};
use crate::calendar::StudyCalendar;
use crate::config::Arguments;
use crate::engine::calculate_refund;
use crate::error::ApiError;
use crate::models::{
    Dashboard, MyRefundReport, RefundCalculation, RefundReport, SeasonRecord, SeasonStatus,
    SeasonSummary,
};
use crate::report::{current_seasons, dashboard, refund_inputs, summarize, viewer_refund};
use crate::repository::{JsonSeasonRepository, SeasonRepository};
use anyhow::{anyhow, Result};
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Source of the current instant.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Application state shared across requests.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn SeasonRepository>,
    pub policy: Arc<dyn AuthorizationPolicy>,
    pub calendar: StudyCalendar,
    pub clock: Clock,
}

impl AppState {
    /// State using the wall clock.
    pub fn new(
        repository: Arc<dyn SeasonRepository>,
        policy: Arc<dyn AuthorizationPolicy>,
        calendar: StudyCalendar,
    ) -> Self {
        Self {
            repository,
            policy,
            calendar,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replaces the clock, mostly for tests.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Builds the state from configuration, loading seasons from disk.
    pub fn from_args(args: &Arguments) -> Result<Self> {
        let repository = JsonSeasonRepository::load_from_dir(&args.data_dir)?;
        let policy = AdminEmailPolicy::new(&args.admin_emails);
        if policy.is_empty() {
            tracing::warn!("no admin emails configured; full refund reports are unavailable");
        }
        let calendar = StudyCalendar::from_utc_offset_hours(args.utc_offset_hours)
            .ok_or_else(|| anyhow!("invalid UTC offset: {} hours", args.utc_offset_hours))?;
        Ok(Self::new(Arc::new(repository), Arc::new(policy), calendar))
    }

    fn load_season(&self, id: &str) -> Result<SeasonRecord, ApiError> {
        self.repository
            .season(id)?
            .ok_or_else(|| ApiError::SeasonNotFound(id.to_string()))
    }

    /// Runs the engine for a season.  "Today" is read once per call.
    fn calculate(&self, season: &SeasonRecord) -> RefundCalculation {
        let reference_day_start = self.calendar.reference_day_start((self.clock)());
        let inputs = refund_inputs(season);
        let calculation = calculate_refund(
            &inputs.participants,
            &inputs.problems,
            season.entry_fee,
            reference_day_start,
        );
        tracing::info!(
            season = %season.id,
            reference_day = %self.calendar.format_date(reference_day_start),
            results = calculation.results.len(),
            "refund calculated"
        );
        calculation
    }
}

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/seasons", get(seasons_handler))
        .route("/api/seasons/current", get(current_seasons_handler))
        .route("/api/refund/:season_id", get(refund_handler))
        .route("/api/refund/:season_id/me", get(my_refund_handler))
        .route("/api/dashboard/:season_id", get(dashboard_handler))
        .with_state(state)
}

/// Handler for GET /api/seasons
async fn seasons_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<SeasonSummary>>, ApiError> {
    Ok(Json(state.repository.seasons()?))
}

/// Handler for GET /api/seasons/current
async fn current_seasons_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<SeasonRecord>>, ApiError> {
    let mut active = Vec::new();
    for summary in state.repository.seasons()? {
        if summary.status != SeasonStatus::Active {
            continue;
        }
        if let Some(season) = state.repository.season(&summary.id)? {
            active.push(season);
        }
    }
    let current = current_seasons(active);
    if current.is_empty() {
        return Err(ApiError::NoActiveSeason);
    }
    Ok(Json(current))
}

/// Handler for GET /api/refund/:season_id (administrators only)
async fn refund_handler(
    State(state): State<AppState>,
    Path(season_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<RefundReport>, ApiError> {
    let viewer = Viewer::from_headers(&headers);
    if !viewer.is_signed_in() {
        return Err(ApiError::Unauthorized);
    }
    if !state.policy.is_admin(&viewer) {
        return Err(ApiError::Forbidden);
    }
    let season = state.load_season(&season_id)?;
    let calculation = state.calculate(&season);
    Ok(Json(RefundReport {
        season: season.info(),
        total_problems: season.problems.iter().filter(|p| !p.is_practice).count(),
        calculation,
    }))
}

/// Handler for GET /api/refund/:season_id/me
async fn my_refund_handler(
    State(state): State<AppState>,
    Path(season_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<MyRefundReport>, ApiError> {
    let viewer = Viewer::from_headers(&headers);
    if !viewer.is_signed_in() {
        return Err(ApiError::Unauthorized);
    }
    let season = state.load_season(&season_id)?;
    let calculation = state.calculate(&season);
    let summary = summarize(&calculation, season.entry_fee);
    let my = viewer_refund(&season, &calculation, &viewer);
    Ok(Json(MyRefundReport {
        season: season.info(),
        total_problems: season.problems.iter().filter(|p| !p.is_practice).count(),
        total_pool: calculation.total_pool,
        dropped_pool: calculation.dropped_pool,
        summary,
        my,
    }))
}

/// Handler for GET /api/dashboard/:season_id
async fn dashboard_handler(
    State(state): State<AppState>,
    Path(season_id): Path<String>,
) -> Result<Json<Dashboard>, ApiError> {
    let season = state.load_season(&season_id)?;
    Ok(Json(dashboard(&season)))
}

/// Launch the API server.  Loads seasons from the configured directory
/// and serves until the process is interrupted.
pub async fn serve(args: &Arguments) -> Result<()> {
    let state = AppState::from_args(args)?;
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(args.bind_addr).await?;
    tracing::info!(addr = %args.bind_addr, "server listening");
    axum::serve(listener, router).await?;
    Ok(())
}
