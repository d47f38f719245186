//! Customer-facing routes. No session is read here.

use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use drivehub_booking::{BookingRequest, RenterDetails};
use drivehub_catalog::{Location, VehicleListing};
use drivehub_core::{Availability, BookingUploads, Quote, Upload};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

/// Three phone photos as base64 plus the renter fields.
pub const BOOKING_BODY_LIMIT: usize = 32 * 1024 * 1024;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/locations", get(list_locations))
        .route("/vehicles", get(list_vehicles))
        .route("/vehicles/{vehicle_id}", get(get_vehicle))
        .route("/vehicles/{vehicle_id}/quote", get(quote))
        .route("/vehicles/{vehicle_id}/availability", get(availability))
        .route(
            "/bookings",
            post(submit_booking).layer(DefaultBodyLimit::max(BOOKING_BODY_LIMIT)),
        )
}

#[derive(Debug, Deserialize)]
pub struct VehicleQuery {
    pub location_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// A file sent inline as base64.
#[derive(Debug, Deserialize)]
pub struct DocumentPayload {
    pub file_name: String,
    #[serde(default)]
    pub content_type: Option<String>,
    pub data: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DocumentsPayload {
    pub id_proof: Option<DocumentPayload>,
    pub live_photo: Option<DocumentPayload>,
    pub signature: Option<DocumentPayload>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitBookingRequest {
    pub vehicle_id: Uuid,
    #[serde(default)]
    pub renter: RenterDetails,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub documents: DocumentsPayload,
}

#[derive(Debug, Serialize)]
pub struct BookingAccepted {
    pub reservation_id: Uuid,
    pub status: String,
    pub total_amount: i64,
}

fn decode_upload(field: &str, payload: Option<DocumentPayload>) -> Result<Option<Upload>, AppError> {
    payload
        .map(|doc| {
            let bytes = STANDARD
                .decode(doc.data.as_bytes())
                .map_err(|e| AppError::validation(field, format!("not valid base64: {e}")))?;
            Ok(Upload {
                file_name: doc.file_name,
                content_type: doc.content_type,
                bytes,
            })
        })
        .transpose()
}

async fn list_locations(State(state): State<AppState>) -> Result<Json<Vec<Location>>, AppError> {
    Ok(Json(state.fleet.list_active_locations().await?))
}

async fn list_vehicles(
    State(state): State<AppState>,
    Query(query): Query<VehicleQuery>,
) -> Result<Json<Vec<VehicleListing>>, AppError> {
    Ok(Json(state.fleet.list_available_vehicles(query.location_id).await?))
}

async fn get_vehicle(
    State(state): State<AppState>,
    Path(vehicle_id): Path<Uuid>,
) -> Result<Json<VehicleListing>, AppError> {
    Ok(Json(state.fleet.get_listing(vehicle_id).await?))
}

async fn quote(
    State(state): State<AppState>,
    Path(vehicle_id): Path<Uuid>,
    Query(window): Query<WindowQuery>,
) -> Result<Json<Quote>, AppError> {
    Ok(Json(state.bookings.quote(vehicle_id, window.start, window.end).await?))
}

async fn availability(
    State(state): State<AppState>,
    Path(vehicle_id): Path<Uuid>,
    Query(window): Query<WindowQuery>,
) -> Result<Json<Availability>, AppError> {
    Ok(Json(
        state
            .bookings
            .check_availability(vehicle_id, window.start, window.end)
            .await?,
    ))
}

/// POST /bookings
async fn submit_booking(
    State(state): State<AppState>,
    Json(req): Json<SubmitBookingRequest>,
) -> Result<(StatusCode, Json<BookingAccepted>), AppError> {
    let uploads = BookingUploads {
        id_proof: decode_upload("id_proof", req.documents.id_proof)?,
        live_photo: decode_upload("live_photo", req.documents.live_photo)?,
        signature: decode_upload("signature", req.documents.signature)?,
    };
    let request = BookingRequest {
        vehicle_id: req.vehicle_id,
        renter: req.renter,
        start: req.start,
        end: req.end,
    };

    let reservation = state.bookings.submit_booking(request, uploads).await?;

    Ok((
        StatusCode::CREATED,
        Json(BookingAccepted {
            reservation_id: reservation.id,
            status: reservation.status.to_string(),
            total_amount: reservation.total_amount,
        }),
    ))
}
