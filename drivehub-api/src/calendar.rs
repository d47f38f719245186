use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use drivehub_booking::calendar::RowView;
use drivehub_booking::{CellAction, Reservation};
use drivehub_core::{Actor, BlockRequest};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/calendar", get(month))
        .route("/calendar/cell", get(select_cell))
        .route("/blocks", post(block_vehicle))
}

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Deserialize)]
pub struct CellQuery {
    pub vehicle_id: Uuid,
    pub date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    pub rows: Vec<RowView>,
}

/// GET /admin/calendar?year=&month=
async fn month(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthView>, AppError> {
    let grid = state.bookings.calendar(&actor, query.year, query.month).await?;
    Ok(Json(MonthView {
        year: grid.year,
        month: grid.month,
        rows: grid.materialize(),
    }))
}

async fn select_cell(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<CellQuery>,
) -> Result<Json<CellAction>, AppError> {
    Ok(Json(
        state
            .bookings
            .select_cell(&actor, query.vehicle_id, query.date)
            .await?,
    ))
}

/// POST /admin/blocks
async fn block_vehicle(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<BlockRequest>,
) -> Result<(StatusCode, Json<Reservation>), AppError> {
    let block = state.bookings.block_vehicle(&actor, req).await?;
    Ok((StatusCode::CREATED, Json(block)))
}
