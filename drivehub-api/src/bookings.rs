use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use drivehub_booking::{Reservation, ReservationStatus, TripDetails};
use drivehub_core::repository::ReservationFilter;
use drivehub_core::Actor;
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", get(list_bookings))
        .route("/bookings/{reservation_id}", get(get_booking))
        .route("/bookings/{reservation_id}/status", post(set_status))
        .route("/bookings/{reservation_id}/trip", put(record_trip))
}

#[derive(Debug, Deserialize)]
pub struct BookingListQuery {
    pub vehicle_id: Option<Uuid>,
    pub status: Option<ReservationStatus>,
}

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: ReservationStatus,
    #[serde(default)]
    pub force: bool,
}

/// GET /admin/bookings
async fn list_bookings(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<BookingListQuery>,
) -> Result<Json<Vec<Reservation>>, AppError> {
    let filter = ReservationFilter {
        vehicle_id: query.vehicle_id,
        status: query.status,
    };
    Ok(Json(state.bookings.list_reservations(&actor, filter).await?))
}

async fn get_booking(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(reservation_id): Path<Uuid>,
) -> Result<Json<Reservation>, AppError> {
    Ok(Json(state.bookings.get_reservation(&actor, reservation_id).await?))
}

/// POST /admin/bookings/{id}/status
async fn set_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(reservation_id): Path<Uuid>,
    Json(req): Json<StatusChangeRequest>,
) -> Result<Json<Reservation>, AppError> {
    let updated = state
        .bookings
        .set_status(&actor, reservation_id, req.status, req.force)
        .await?;
    Ok(Json(updated))
}

/// PUT /admin/bookings/{id}/trip
async fn record_trip(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(reservation_id): Path<Uuid>,
    Json(trip): Json<TripDetails>,
) -> Result<Json<Reservation>, AppError> {
    Ok(Json(
        state
            .bookings
            .record_trip_details(&actor, reservation_id, trip)
            .await?,
    ))
}
