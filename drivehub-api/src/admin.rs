use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use drivehub_catalog::{Location, Vehicle, VehicleDraft};
use drivehub_core::repository::VehicleFilter;
use drivehub_core::Actor;
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/vehicles", get(list_vehicles).post(create_vehicle))
        .route(
            "/vehicles/{vehicle_id}",
            put(update_vehicle).delete(delete_vehicle),
        )
        .route("/vehicles/{vehicle_id}/share", put(update_share))
        .route("/locations", get(list_locations).post(create_location))
        .route("/locations/{location_id}", put(set_location_active))
}

#[derive(Debug, Deserialize)]
pub struct ListVehiclesQuery {
    pub location_id: Option<Uuid>,
    #[serde(default)]
    pub available_only: bool,
}

#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    pub share_percentage: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateLocationRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LocationVisibilityRequest {
    pub active: bool,
}

// ============================================================================
// Vehicle Management Handlers
// ============================================================================

/// GET /admin/vehicles
async fn list_vehicles(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ListVehiclesQuery>,
) -> Result<Json<Vec<Vehicle>>, AppError> {
    let filter = VehicleFilter {
        location_id: query.location_id,
        available_only: query.available_only,
    };
    Ok(Json(state.fleet.list_vehicles(&actor, filter).await?))
}

/// POST /admin/vehicles
async fn create_vehicle(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(draft): Json<VehicleDraft>,
) -> Result<(StatusCode, Json<Vehicle>), AppError> {
    let vehicle = state.fleet.create_vehicle(&actor, draft).await?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

/// PUT /admin/vehicles/{id}
async fn update_vehicle(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(vehicle_id): Path<Uuid>,
    Json(draft): Json<VehicleDraft>,
) -> Result<Json<Vehicle>, AppError> {
    Ok(Json(state.fleet.update_vehicle(&actor, vehicle_id, draft).await?))
}

/// DELETE /admin/vehicles/{id}
async fn delete_vehicle(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(vehicle_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.fleet.delete_vehicle(&actor, vehicle_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /admin/vehicles/{id}/share
async fn update_share(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(vehicle_id): Path<Uuid>,
    Json(req): Json<ShareRequest>,
) -> Result<Json<Vehicle>, AppError> {
    Ok(Json(
        state
            .fleet
            .update_owner_share(&actor, vehicle_id, req.share_percentage)
            .await?,
    ))
}

// ============================================================================
// Location Handlers
// ============================================================================

async fn list_locations(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<Location>>, AppError> {
    Ok(Json(state.fleet.list_locations(&actor).await?))
}

/// POST /admin/locations
async fn create_location(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateLocationRequest>,
) -> Result<(StatusCode, Json<Location>), AppError> {
    let location = state.fleet.create_location(&actor, &req.name).await?;
    Ok((StatusCode::CREATED, Json(location)))
}

/// PUT /admin/locations/{id}
async fn set_location_active(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(location_id): Path<Uuid>,
    Json(req): Json<LocationVisibilityRequest>,
) -> Result<Json<Location>, AppError> {
    Ok(Json(
        state
            .fleet
            .set_location_active(&actor, location_id, req.active)
            .await?,
    ))
}
