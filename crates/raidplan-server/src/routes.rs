//! Plan persistence endpoints.

use crate::error::ApiError;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use raidplan_core::{AccessMode, Plan, PlanStore, PlanUpdate, SaveManager, Tab, TokenResolver};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application state.
pub struct AppState {
    store: Arc<dyn PlanStore>,
    resolver: TokenResolver<dyn PlanStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn PlanStore>) -> Self {
        Self {
            resolver: TokenResolver::new(Arc::clone(&store)),
            store,
        }
    }

    /// Save gate for one request. Each request is its own editing session, so
    /// overlapping writes from different clients resolve as last write wins.
    fn saves(&self) -> SaveManager<dyn PlanStore> {
        SaveManager::new(Arc::clone(&self.store))
    }
}

/// Body of `POST /raidplans`.
#[derive(Debug, Default, Deserialize)]
pub struct CreatePlan {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub boss: String,
    #[serde(default)]
    pub raid: String,
    #[serde(default)]
    pub sequence: String,
    #[serde(default)]
    pub content: Vec<Tab>,
}

/// Body of `PUT /raidplans/{token}`. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePlan {
    pub name: Option<String>,
    pub boss: Option<String>,
    pub content: Option<Vec<Tab>>,
}

/// A stored plan plus the access the request's token grants.
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    #[serde(flatten)]
    pub plan: Plan,
    pub access: AccessMode,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/raidplans", post(create_plan))
        .route("/raidplans/{token}", get(get_plan).put(update_plan))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check
pub async fn health() -> &'static str {
    "ok"
}

pub async fn create_plan(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreatePlan>,
) -> Result<(StatusCode, Json<PlanResponse>), ApiError> {
    let mut plan = Plan::new(body.name);
    plan.boss = body.boss;
    plan.raid = body.raid;
    plan.sequence = body.sequence;
    if !body.content.is_empty() {
        plan.replace_tabs(body.content)?;
    }

    let outcome = state.saves().save(&plan).await?;
    info!(
        "Created plan {:?} with {} tabs",
        outcome.plan.id,
        outcome.plan.tab_count()
    );
    Ok((
        StatusCode::CREATED,
        Json(PlanResponse {
            plan: outcome.plan,
            access: AccessMode::ReadWrite,
        }),
    ))
}

pub async fn get_plan(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<PlanResponse>, ApiError> {
    let resolved = state.resolver.resolve(&token).await?;
    Ok(Json(PlanResponse {
        plan: resolved.plan,
        access: resolved.access,
    }))
}

pub async fn update_plan(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Json(body): Json<UpdatePlan>,
) -> Result<Json<PlanResponse>, ApiError> {
    let mut resolved = state.resolver.resolve(&token).await?;
    resolved.apply_update(PlanUpdate {
        name: body.name,
        boss: body.boss,
        tabs: body.content,
    })?;
    let outcome = state.saves().save(&resolved.plan).await?;
    info!("Updated plan {:?}", outcome.plan.id);
    Ok(Json(PlanResponse {
        plan: outcome.plan,
        access: resolved.access,
    }))
}
