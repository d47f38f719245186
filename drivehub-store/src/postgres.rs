use async_trait::async_trait;
use chrono::{DateTime, Utc};
use drivehub_booking::{
    find_conflict, DocumentRefs, Interval, OverlapPolicy, Renter, Reservation, ReservationDraft,
    ReservationStatus, TripDetails,
};
use drivehub_catalog::{Location, OwnerShare, SharePercentage, Vehicle};
use drivehub_core::repository::{
    LocationRepository, ReservationFilter, ReservationRepository, StoreError, StoreResult,
    VehicleFilter, VehicleRepository,
};
use drivehub_shared::Masked;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_sqlx(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(e.to_string())
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            StoreError::Rejected(db.message().to_string())
        }
        other => StoreError::Rejected(other.to_string()),
    }
}

fn corrupt(column: &str, detail: impl std::fmt::Display) -> StoreError {
    StoreError::Rejected(format!("unreadable {column}: {detail}"))
}

/// Unit enums are stored as their serde names.
fn to_text<T: Serialize>(value: &T) -> StoreResult<String> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => Ok(s),
        Ok(other) => Err(corrupt("enum", other)),
        Err(e) => Err(corrupt("enum", e)),
    }
}

fn from_text<T: DeserializeOwned>(column: &str, text: String) -> StoreResult<T> {
    serde_json::from_value(serde_json::Value::String(text)).map_err(|e| corrupt(column, e))
}

#[derive(sqlx::FromRow)]
struct LocationRow {
    id: Uuid,
    name: String,
    active: bool,
}

#[derive(sqlx::FromRow)]
struct VehicleRow {
    id: Uuid,
    name: String,
    seating: String,
    year: i32,
    transmission: String,
    fuel: String,
    price_24h: i64,
    price_12h: i64,
    mileage: Option<String>,
    image_url: Option<String>,
    location_id: Uuid,
    is_available: bool,
    registration_number: Option<String>,
    owner_name: Option<String>,
    owner_phone: Option<String>,
    owner_share_percentage: i16,
}

impl TryFrom<VehicleRow> for Vehicle {
    type Error = StoreError;

    fn try_from(row: VehicleRow) -> Result<Self, Self::Error> {
        let share_percentage = SharePercentage::try_from(i64::from(row.owner_share_percentage))
            .map_err(|e| corrupt("owner_share_percentage", e))?;
        Ok(Vehicle {
            id: row.id,
            name: row.name,
            seating: from_text("seating", row.seating)?,
            year: row.year,
            transmission: from_text("transmission", row.transmission)?,
            fuel: from_text("fuel", row.fuel)?,
            price_24h: row.price_24h,
            price_12h: row.price_12h,
            mileage: row.mileage,
            image_url: row.image_url,
            location_id: row.location_id,
            is_available: row.is_available,
            registration_number: row.registration_number.map(Masked),
            owner: OwnerShare {
                owner_name: row.owner_name,
                owner_phone: row.owner_phone.map(Masked),
                share_percentage,
            },
        })
    }
}

#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: Uuid,
    vehicle_id: Uuid,
    location_id: Uuid,
    renter_name: String,
    renter_phone: String,
    renter_email: String,
    renter_occupation: String,
    renter_address: String,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    total_amount: i64,
    status: String,
    block_reason: Option<String>,
    id_proof_url: Option<String>,
    live_photo_url: Option<String>,
    signature_url: Option<String>,
    start_km: Option<i64>,
    end_km: Option<i64>,
    discount: Option<i64>,
    admin_notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = StoreError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        Ok(Reservation {
            id: row.id,
            vehicle_id: row.vehicle_id,
            location_id: row.location_id,
            renter: Renter {
                name: row.renter_name,
                phone: Masked(row.renter_phone),
                email: Masked(row.renter_email),
                occupation: row.renter_occupation,
                address: row.renter_address,
            },
            interval: Interval::new(row.start_at, row.end_at).map_err(|e| corrupt("interval", e))?,
            total_amount: row.total_amount,
            status: row.status.parse().map_err(|e| corrupt("status", e))?,
            block_reason: row.block_reason,
            documents: DocumentRefs {
                id_proof_url: row.id_proof_url,
                live_photo_url: row.live_photo_url,
                signature_url: row.signature_url,
            },
            trip: TripDetails {
                start_km: row.start_km,
                end_km: row.end_km,
                discount: row.discount,
                admin_notes: row.admin_notes,
            },
            created_at: row.created_at,
        })
    }
}

const VEHICLE_COLUMNS: &str = "id, name, seating, year, transmission, fuel, price_24h, price_12h, \
     mileage, image_url, location_id, is_available, registration_number, owner_name, \
     owner_phone, owner_share_percentage";

const RESERVATION_COLUMNS: &str = "id, vehicle_id, location_id, renter_name, renter_phone, \
     renter_email, renter_occupation, renter_address, start_at, end_at, total_amount, status, \
     block_reason, id_proof_url, live_photo_url, signature_url, start_km, end_km, discount, \
     admin_notes, created_at";

fn rows_to_reservations(rows: Vec<ReservationRow>) -> StoreResult<Vec<Reservation>> {
    rows.into_iter().map(Reservation::try_from).collect()
}

/// Take the vehicle's row lock so competing writers for the same vehicle serialize
/// behind this transaction.
async fn lock_vehicle(tx: &mut Transaction<'_, Postgres>, vehicle_id: Uuid) -> StoreResult<()> {
    sqlx::query("SELECT id FROM vehicles WHERE id = $1 FOR UPDATE")
        .bind(vehicle_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_sqlx)?
        .ok_or(StoreError::NotFound {
            entity: "vehicle",
            id: vehicle_id,
        })?;
    Ok(())
}

/// Reservations on `vehicle_id` that could collide with `interval`, read inside `tx`.
async fn overlapping(
    tx: &mut Transaction<'_, Postgres>,
    vehicle_id: Uuid,
    interval: &Interval,
) -> StoreResult<Vec<Reservation>> {
    let sql = format!(
        "SELECT {RESERVATION_COLUMNS} FROM reservations \
         WHERE vehicle_id = $1 AND start_at < $3 AND end_at > $2 ORDER BY created_at"
    );
    let rows: Vec<ReservationRow> = sqlx::query_as(&sql)
        .bind(vehicle_id)
        .bind(interval.start())
        .bind(interval.end())
        .fetch_all(&mut **tx)
        .await
        .map_err(map_sqlx)?;
    rows_to_reservations(rows)
}

#[async_trait]
impl LocationRepository for PgStore {
    async fn list_locations(&self) -> StoreResult<Vec<Location>> {
        let rows: Vec<LocationRow> = sqlx::query_as("SELECT id, name, active FROM locations ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(rows
            .into_iter()
            .map(|r| Location {
                id: r.id,
                name: r.name,
                active: r.active,
            })
            .collect())
    }

    async fn create_location(&self, location: &Location) -> StoreResult<()> {
        sqlx::query("INSERT INTO locations (id, name, active) VALUES ($1, $2, $3)")
            .bind(location.id)
            .bind(&location.name)
            .bind(location.active)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn set_location_active(&self, id: Uuid, active: bool) -> StoreResult<Location> {
        let row: LocationRow =
            sqlx::query_as("UPDATE locations SET active = $2 WHERE id = $1 RETURNING id, name, active")
                .bind(id)
                .bind(active)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx)?
                .ok_or(StoreError::NotFound { entity: "location", id })?;
        Ok(Location {
            id: row.id,
            name: row.name,
            active: row.active,
        })
    }
}

#[async_trait]
impl VehicleRepository for PgStore {
    async fn list_vehicles(&self, filter: &VehicleFilter) -> StoreResult<Vec<Vehicle>> {
        let sql = format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles \
             WHERE ($1::uuid IS NULL OR location_id = $1) AND (NOT $2 OR is_available) \
             ORDER BY name, id"
        );
        let rows: Vec<VehicleRow> = sqlx::query_as(&sql)
            .bind(filter.location_id)
            .bind(filter.available_only)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        rows.into_iter().map(Vehicle::try_from).collect()
    }

    async fn get_vehicle(&self, id: Uuid) -> StoreResult<Option<Vehicle>> {
        let sql = format!("SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE id = $1");
        let row: Option<VehicleRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.map(Vehicle::try_from).transpose()
    }

    async fn create_vehicle(&self, vehicle: &Vehicle) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO vehicles (id, name, seating, year, transmission, fuel, price_24h, price_12h,
                mileage, image_url, location_id, is_available, registration_number, owner_name,
                owner_phone, owner_share_percentage)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(vehicle.id)
        .bind(&vehicle.name)
        .bind(to_text(&vehicle.seating)?)
        .bind(vehicle.year)
        .bind(to_text(&vehicle.transmission)?)
        .bind(to_text(&vehicle.fuel)?)
        .bind(vehicle.price_24h)
        .bind(vehicle.price_12h)
        .bind(&vehicle.mileage)
        .bind(&vehicle.image_url)
        .bind(vehicle.location_id)
        .bind(vehicle.is_available)
        .bind(vehicle.registration_number.as_ref().map(|r| r.expose().clone()))
        .bind(&vehicle.owner.owner_name)
        .bind(vehicle.owner.owner_phone.as_ref().map(|p| p.expose().clone()))
        .bind(i16::from(vehicle.owner.share_percentage.value()))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn update_vehicle(&self, vehicle: &Vehicle) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE vehicles SET name = $2, seating = $3, year = $4, transmission = $5, fuel = $6,
                price_24h = $7, price_12h = $8, mileage = $9, image_url = $10, location_id = $11,
                is_available = $12, registration_number = $13, owner_name = $14, owner_phone = $15,
                owner_share_percentage = $16
            WHERE id = $1
            "#,
        )
        .bind(vehicle.id)
        .bind(&vehicle.name)
        .bind(to_text(&vehicle.seating)?)
        .bind(vehicle.year)
        .bind(to_text(&vehicle.transmission)?)
        .bind(to_text(&vehicle.fuel)?)
        .bind(vehicle.price_24h)
        .bind(vehicle.price_12h)
        .bind(&vehicle.mileage)
        .bind(&vehicle.image_url)
        .bind(vehicle.location_id)
        .bind(vehicle.is_available)
        .bind(vehicle.registration_number.as_ref().map(|r| r.expose().clone()))
        .bind(&vehicle.owner.owner_name)
        .bind(vehicle.owner.owner_phone.as_ref().map(|p| p.expose().clone()))
        .bind(i16::from(vehicle.owner.share_percentage.value()))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "vehicle",
                id: vehicle.id,
            });
        }
        Ok(())
    }

    async fn update_owner_share(&self, id: Uuid, share: SharePercentage) -> StoreResult<()> {
        let result = sqlx::query("UPDATE vehicles SET owner_share_percentage = $2 WHERE id = $1")
            .bind(id)
            .bind(i16::from(share.value()))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "vehicle", id });
        }
        Ok(())
    }

    async fn delete_vehicle(&self, id: Uuid, as_of: DateTime<Utc>) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        lock_vehicle(&mut tx, id).await?;

        let open: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM reservations
            WHERE vehicle_id = $1
              AND (status IN ('Pending', 'Approved') OR (status = 'Maintenance' AND end_at > $2))
            "#,
        )
        .bind(id)
        .bind(as_of)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        if open > 0 {
            return Err(StoreError::Referenced {
                vehicle_id: id,
                open: open as usize,
            });
        }

        sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        tx.commit().await.map_err(map_sqlx)?;
        Ok(())
    }
}

#[async_trait]
impl ReservationRepository for PgStore {
    async fn list_reservations(&self, filter: &ReservationFilter) -> StoreResult<Vec<Reservation>> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations \
             WHERE ($1::uuid IS NULL OR vehicle_id = $1) AND ($2::text IS NULL OR status = $2) \
             ORDER BY created_at DESC"
        );
        let rows: Vec<ReservationRow> = sqlx::query_as(&sql)
            .bind(filter.vehicle_id)
            .bind(filter.status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        rows_to_reservations(rows)
    }

    async fn get_reservation(&self, id: Uuid) -> StoreResult<Option<Reservation>> {
        let sql = format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1");
        let row: Option<ReservationRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.map(Reservation::try_from).transpose()
    }

    async fn create_reservation(
        &self,
        draft: ReservationDraft,
        policy: &OverlapPolicy,
    ) -> StoreResult<Reservation> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        lock_vehicle(&mut tx, draft.vehicle_id).await?;

        let existing = overlapping(&mut tx, draft.vehicle_id, &draft.interval).await?;
        if let Some(conflict) = find_conflict(&existing, draft.vehicle_id, &draft.interval, None, policy) {
            return Err(StoreError::Overlap(Box::new(conflict.clone())));
        }

        let reservation = draft.into_reservation();
        sqlx::query(
            r#"
            INSERT INTO reservations (id, vehicle_id, location_id, renter_name, renter_phone,
                renter_email, renter_occupation, renter_address, start_at, end_at, total_amount,
                status, block_reason, id_proof_url, live_photo_url, signature_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(reservation.id)
        .bind(reservation.vehicle_id)
        .bind(reservation.location_id)
        .bind(&reservation.renter.name)
        .bind(reservation.renter.phone.expose())
        .bind(reservation.renter.email.expose())
        .bind(&reservation.renter.occupation)
        .bind(&reservation.renter.address)
        .bind(reservation.interval.start())
        .bind(reservation.interval.end())
        .bind(reservation.total_amount)
        .bind(reservation.status.as_str())
        .bind(&reservation.block_reason)
        .bind(&reservation.documents.id_proof_url)
        .bind(&reservation.documents.live_photo_url)
        .bind(&reservation.documents.signature_url)
        .bind(reservation.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        tx.commit().await.map_err(map_sqlx)?;
        Ok(reservation)
    }

    async fn update_reservation_status(
        &self,
        id: Uuid,
        expected: ReservationStatus,
        status: ReservationStatus,
    ) -> StoreResult<Reservation> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let vehicle_id: Uuid = sqlx::query_scalar("SELECT vehicle_id FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx)?
            .ok_or(StoreError::NotFound { entity: "reservation", id })?;
        lock_vehicle(&mut tx, vehicle_id).await?;

        let sql = format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1 FOR UPDATE");
        let row: ReservationRow = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx)?
            .ok_or(StoreError::NotFound { entity: "reservation", id })?;
        let mut current = Reservation::try_from(row)?;

        if current.status != expected {
            return Err(StoreError::StaleStatus {
                id,
                expected,
                actual: current.status,
            });
        }
        if !expected.blocks_interval() && status.blocks_interval() {
            let existing = overlapping(&mut tx, vehicle_id, &current.interval).await?;
            if let Some(conflict) = find_conflict(
                &existing,
                vehicle_id,
                &current.interval,
                Some(id),
                &OverlapPolicy::strict(),
            ) {
                return Err(StoreError::Overlap(Box::new(conflict.clone())));
            }
        }

        sqlx::query("UPDATE reservations SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        tx.commit().await.map_err(map_sqlx)?;

        current.status = status;
        Ok(current)
    }

    async fn update_trip_details(&self, id: Uuid, trip: &TripDetails) -> StoreResult<Reservation> {
        let sql = format!(
            "UPDATE reservations SET start_km = $2, end_km = $3, discount = $4, admin_notes = $5 \
             WHERE id = $1 RETURNING {RESERVATION_COLUMNS}"
        );
        let row: ReservationRow = sqlx::query_as(&sql)
            .bind(id)
            .bind(trip.start_km)
            .bind(trip.end_km)
            .bind(trip.discount)
            .bind(&trip.admin_notes)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?
            .ok_or(StoreError::NotFound { entity: "reservation", id })?;
        Reservation::try_from(row)
    }
}
