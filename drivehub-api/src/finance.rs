use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use drivehub_booking::{DashboardStats, FleetRevenueReport, RevenueAllocation};
use drivehub_core::Actor;
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/revenue", get(revenue_report))
        .route("/revenue/{vehicle_id}", get(vehicle_revenue))
        .route("/stats", get(dashboard))
}

#[derive(Debug, Deserialize)]
pub struct RevenueQuery {
    pub location_id: Option<Uuid>,
}

/// GET /admin/revenue?location_id=
async fn revenue_report(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<RevenueQuery>,
) -> Result<Json<FleetRevenueReport>, AppError> {
    Ok(Json(state.fleet.revenue_report(&actor, query.location_id).await?))
}

async fn vehicle_revenue(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(vehicle_id): Path<Uuid>,
) -> Result<Json<RevenueAllocation>, AppError> {
    Ok(Json(state.fleet.vehicle_revenue(&actor, vehicle_id).await?))
}

async fn dashboard(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<DashboardStats>, AppError> {
    Ok(Json(state.fleet.dashboard(&actor).await?))
}
