use chrono::{DateTime, Datelike, NaiveDate, Utc};
use drivehub_booking::conflict::{all_conflicts, find_conflict};
use drivehub_booking::lifecycle::{check_transition, require_quote, validate_trip};
use drivehub_booking::{
    BookingRequest, CellAction, DocumentRefs, Interval, MonthGrid, OverlapPolicy, Renter,
    Reservation, ReservationDraft, ReservationStatus, ReservationSummary, TripDetails,
};
use drivehub_catalog::pricing;
use drivehub_shared::{BookingCreatedEvent, BookingEvent, BookingStatusChangedEvent};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::documents::Upload;
use crate::repository::{Collaborators, ReservationFilter, StoreError, VehicleFilter};
use crate::session::Actor;
use crate::{CoreError, CoreResult};

const DEFAULT_BLOCK_REASON: &str = "Maintenance";

/// The three files a customer must hand over with a booking.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingUploads {
    pub id_proof: Option<Upload>,
    pub live_photo: Option<Upload>,
    pub signature: Option<Upload>,
}

impl BookingUploads {
    fn require_all(&self) -> CoreResult<[(&'static str, &Upload); 3]> {
        Ok([
            required("id_proof", &self.id_proof)?,
            required("live_photo", &self.live_photo)?,
            required("signature", &self.signature)?,
        ])
    }
}

fn required<'a>(field: &'static str, upload: &'a Option<Upload>) -> CoreResult<(&'static str, &'a Upload)> {
    match upload {
        Some(u) if !u.is_empty() => Ok((field, u)),
        _ => Err(CoreError::validation(field, "is required")),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Quote {
    pub vehicle_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Zero means the interval does not price yet.
    pub amount: i64,
}

impl Quote {
    pub fn is_valid(&self) -> bool {
        self.amount > 0
    }
}

/// Customer-safe answer to "can I have this car then?".
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Availability {
    pub vehicle_id: Uuid,
    pub available: bool,
    pub blocking: Option<ReservationSummary>,
}

/// Operator request to take a vehicle off the road for whole days.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockRequest {
    pub vehicle_id: Uuid,
    pub start_date: NaiveDate,
    /// Same day as `start_date` when omitted.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub reason: Option<String>,
    /// Reservations the operator has been shown and explicitly agreed to overlap.
    #[serde(default)]
    pub acknowledged_conflicts: Vec<Uuid>,
}

/// Owns a reservation's path from submission through its status changes.
#[derive(Clone)]
pub struct BookingService {
    ctx: Collaborators,
}

impl BookingService {
    pub fn new(ctx: Collaborators) -> Self {
        Self { ctx }
    }

    pub async fn quote(&self, vehicle_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> CoreResult<Quote> {
        let vehicle = self.ctx.require_vehicle(vehicle_id).await?;
        Ok(Quote {
            vehicle_id,
            start,
            end,
            amount: pricing::price(&vehicle, start, end),
        })
    }

    pub async fn check_availability(
        &self,
        vehicle_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CoreResult<Availability> {
        let interval = Interval::new(start, end)?;
        let existing = self.vehicle_reservations(vehicle_id).await?;
        let blocking = find_conflict(&existing, vehicle_id, &interval, None, &OverlapPolicy::strict())
            .map(|r| r.summary().anonymized());
        Ok(Availability {
            vehicle_id,
            available: blocking.is_none(),
            blocking,
        })
    }

    /// Validate, price, upload documents and create a `Pending` reservation.
    ///
    /// Documents are only uploaded once everything else checks out, and the reservation
    /// is only written once all three uploads succeeded. The store repeats the overlap
    /// check atomically with the insert.
    pub async fn submit_booking(&self, request: BookingRequest, uploads: BookingUploads) -> CoreResult<Reservation> {
        let (renter, interval) = request.validate()?;
        let files = uploads.require_all()?;

        let vehicle = self.ctx.require_vehicle(request.vehicle_id).await?;
        if !self.ctx.customer_visible(&vehicle).await? {
            return Err(CoreError::validation("vehicle_id", "vehicle is not open for booking"));
        }
        let amount = require_quote(pricing::price(&vehicle, interval.start(), interval.end()))?;

        let existing = self.vehicle_reservations(vehicle.id).await?;
        if let Some(conflict) = find_conflict(&existing, vehicle.id, &interval, None, &OverlapPolicy::strict()) {
            warn!(vehicle_id = %vehicle.id, conflicting = %conflict.id, "Booking refused, slot already held");
            return Err(CoreError::ConflictError(conflict.summary().anonymized()));
        }

        let submission_id = Uuid::new_v4();
        let mut documents = DocumentRefs::default();
        for (field, upload) in files {
            let path = document_path(vehicle.id, submission_id, field, upload);
            let limit = self.ctx.rules.store_timeout;
            let url = match tokio::time::timeout(limit, self.ctx.documents.store(&upload.bytes, &path)).await {
                Ok(Ok(url)) => url,
                Ok(Err(e)) => {
                    return Err(CoreError::DocumentUploadError {
                        document: field,
                        message: e.to_string(),
                    })
                }
                Err(_) => {
                    return Err(CoreError::DocumentUploadError {
                        document: field,
                        message: format!("upload exceeded {limit:?}"),
                    })
                }
            };
            match field {
                "id_proof" => documents.id_proof_url = Some(url),
                "live_photo" => documents.live_photo_url = Some(url),
                _ => documents.signature_url = Some(url),
            }
        }
        documents.require_complete()?;

        let draft = ReservationDraft {
            vehicle_id: vehicle.id,
            location_id: vehicle.location_id,
            renter,
            interval,
            total_amount: amount,
            status: ReservationStatus::Pending,
            block_reason: None,
            documents,
        };
        let reservation = match self
            .ctx
            .bounded(self.ctx.reservations.create_reservation(draft, &OverlapPolicy::strict()))
            .await
        {
            Ok(r) => r,
            Err(StoreError::Overlap(existing)) => {
                warn!(
                    vehicle_id = %vehicle.id,
                    conflicting = %existing.id,
                    %submission_id,
                    "Lost the race for the slot; uploaded documents are orphaned"
                );
                return Err(CoreError::ConflictError(existing.summary().anonymized()));
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            reservation_id = %reservation.id,
            vehicle_id = %vehicle.id,
            amount,
            phone = %reservation.renter.phone,
            "Booking submitted"
        );
        self.ctx.notifier.publish(BookingEvent::BookingCreated(BookingCreatedEvent {
            reservation_id: reservation.id,
            vehicle_id: reservation.vehicle_id,
            renter_name: reservation.renter.name.clone(),
            start: reservation.interval.start(),
            end: reservation.interval.end(),
            total_amount: reservation.total_amount,
            timestamp: Utc::now().timestamp(),
        }));
        Ok(reservation)
    }

    /// Put a `Maintenance` block on a vehicle. Overlaps are refused unless each
    /// overlapping reservation is listed in `acknowledged_conflicts`.
    pub async fn block_vehicle(&self, actor: &Actor, request: BlockRequest) -> CoreResult<Reservation> {
        let admin = actor.require_admin()?;
        let vehicle = self.ctx.require_vehicle(request.vehicle_id).await?;
        let end_date = request.end_date.unwrap_or(request.start_date);
        let interval = Interval::whole_days(request.start_date, end_date)?;

        let policy = OverlapPolicy::acknowledging(request.acknowledged_conflicts.iter().copied());
        let existing = self.vehicle_reservations(vehicle.id).await?;
        if let Some(conflict) = find_conflict(&existing, vehicle.id, &interval, None, &policy) {
            let overlapping = all_conflicts(&existing, vehicle.id, &interval).len();
            warn!(
                vehicle_id = %vehicle.id,
                conflicting = %conflict.id,
                overlapping,
                "Block refused until the operator acknowledges the overlap"
            );
            return Err(CoreError::ConflictError(conflict.summary()));
        }

        let reason = request
            .reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_BLOCK_REASON.to_string());
        let draft = ReservationDraft {
            vehicle_id: vehicle.id,
            location_id: vehicle.location_id,
            renter: Renter::admin_block(),
            interval,
            total_amount: 0,
            status: ReservationStatus::Maintenance,
            block_reason: Some(reason),
            documents: DocumentRefs::default(),
        };
        let block = self
            .ctx
            .bounded(self.ctx.reservations.create_reservation(draft, &policy))
            .await?;

        if !policy.is_strict() {
            warn!(
                reservation_id = %block.id,
                acknowledged = ?request.acknowledged_conflicts,
                admin,
                "Block placed over acknowledged reservations"
            );
        }
        info!(reservation_id = %block.id, vehicle_id = %vehicle.id, admin, "Vehicle blocked");
        Ok(block)
    }

    /// Move a reservation along its lifecycle. `force` is the administrative override
    /// for otherwise refused moves between customer statuses.
    pub async fn set_status(
        &self,
        actor: &Actor,
        reservation_id: Uuid,
        target: ReservationStatus,
        force: bool,
    ) -> CoreResult<Reservation> {
        let admin = actor.require_admin()?;
        let current = self.ctx.require_reservation(reservation_id).await?;
        let from = current.status;
        check_transition(from, target, force)?;

        let updated = self
            .ctx
            .bounded(self.ctx.reservations.update_reservation_status(reservation_id, from, target))
            .await?;

        if force {
            warn!(%reservation_id, %from, to = %target, admin, "Status override applied");
        } else {
            info!(%reservation_id, %from, to = %target, admin, "Status changed");
        }
        self.ctx.notifier.publish(BookingEvent::StatusChanged(BookingStatusChangedEvent {
            reservation_id,
            vehicle_id: updated.vehicle_id,
            from_status: from.to_string(),
            to_status: target.to_string(),
            forced: force,
            timestamp: Utc::now().timestamp(),
        }));
        Ok(updated)
    }

    pub async fn record_trip_details(
        &self,
        actor: &Actor,
        reservation_id: Uuid,
        trip: TripDetails,
    ) -> CoreResult<Reservation> {
        let admin = actor.require_admin()?;
        let reservation = self.ctx.require_reservation(reservation_id).await?;
        validate_trip(&reservation, &trip)?;
        let updated = self
            .ctx
            .bounded(self.ctx.reservations.update_trip_details(reservation_id, &trip))
            .await?;
        info!(%reservation_id, admin, "Trip details recorded");
        Ok(updated)
    }

    pub async fn list_reservations(&self, actor: &Actor, filter: ReservationFilter) -> CoreResult<Vec<Reservation>> {
        actor.require_admin()?;
        Ok(self.ctx.bounded(self.ctx.reservations.list_reservations(&filter)).await?)
    }

    pub async fn get_reservation(&self, actor: &Actor, reservation_id: Uuid) -> CoreResult<Reservation> {
        actor.require_admin()?;
        self.ctx.require_reservation(reservation_id).await
    }

    pub async fn calendar(&self, actor: &Actor, year: i32, month: u32) -> CoreResult<MonthGrid> {
        actor.require_admin()?;
        let vehicles = self
            .ctx
            .bounded(self.ctx.vehicles.list_vehicles(&VehicleFilter::default()))
            .await?;
        let reservations = self
            .ctx
            .bounded(self.ctx.reservations.list_reservations(&ReservationFilter::default()))
            .await?;
        Ok(MonthGrid::project(&vehicles, &reservations, year, month)?)
    }

    /// What clicking a calendar cell offers. Never writes.
    pub async fn select_cell(&self, actor: &Actor, vehicle_id: Uuid, date: NaiveDate) -> CoreResult<CellAction> {
        let grid = self.calendar(actor, date.year(), date.month()).await?;
        grid.select(vehicle_id, date)
            .ok_or(CoreError::NotFound { entity: "vehicle", id: vehicle_id })
    }

    async fn vehicle_reservations(&self, vehicle_id: Uuid) -> CoreResult<Vec<Reservation>> {
        Ok(self
            .ctx
            .bounded(self.ctx.reservations.list_reservations(&ReservationFilter::for_vehicle(vehicle_id)))
            .await?)
    }
}

fn document_path(vehicle_id: Uuid, submission_id: Uuid, field: &str, upload: &Upload) -> String {
    match upload.extension() {
        Some(ext) => format!("bookings/{vehicle_id}/{submission_id}/{field}.{ext}"),
        None => format!("bookings/{vehicle_id}/{submission_id}/{field}"),
    }
}
