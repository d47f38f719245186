use async_trait::async_trait;
use chrono::{DateTime, Utc};
use drivehub_booking::{OverlapPolicy, Reservation, ReservationDraft, ReservationStatus, TripDetails};
use drivehub_catalog::{Location, SharePercentage, Vehicle};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::documents::DocumentStore;
use crate::notify::NotificationSink;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The write would double-book; carries the reservation found in the way.
    #[error("Overlaps existing reservation {}", .0.id)]
    Overlap(Box<Reservation>),

    #[error("Reservation {id} is {actual}, expected {expected}")]
    StaleStatus {
        id: Uuid,
        expected: ReservationStatus,
        actual: ReservationStatus,
    },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Vehicle {vehicle_id} is referenced by {open} open reservation(s)")]
    Referenced { vehicle_id: Uuid, open: usize },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store call exceeded {0:?}")]
    Timeout(Duration),

    #[error("Store rejected the write: {0}")]
    Rejected(String),
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable(_) | StoreError::Timeout(_) | StoreError::StaleStatus { .. }
        )
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Default)]
pub struct VehicleFilter {
    pub location_id: Option<Uuid>,
    pub available_only: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ReservationFilter {
    pub vehicle_id: Option<Uuid>,
    pub status: Option<ReservationStatus>,
}

impl ReservationFilter {
    pub fn for_vehicle(vehicle_id: Uuid) -> Self {
        Self {
            vehicle_id: Some(vehicle_id),
            status: None,
        }
    }
}

#[async_trait]
pub trait VehicleRepository: Send + Sync {
    async fn list_vehicles(&self, filter: &VehicleFilter) -> StoreResult<Vec<Vehicle>>;

    async fn get_vehicle(&self, id: Uuid) -> StoreResult<Option<Vehicle>>;

    async fn create_vehicle(&self, vehicle: &Vehicle) -> StoreResult<()>;

    async fn update_vehicle(&self, vehicle: &Vehicle) -> StoreResult<()>;

    async fn update_owner_share(&self, id: Uuid, share: SharePercentage) -> StoreResult<()>;

    /// Refuses with [`StoreError::Referenced`] while any reservation is still open as of
    /// `as_of`; the check and the delete happen under one lock or transaction.
    async fn delete_vehicle(&self, id: Uuid, as_of: DateTime<Utc>) -> StoreResult<()>;
}

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Newest first.
    async fn list_reservations(&self, filter: &ReservationFilter) -> StoreResult<Vec<Reservation>>;

    async fn get_reservation(&self, id: Uuid) -> StoreResult<Option<Reservation>>;

    /// Insert `draft` only if `drivehub_booking::find_conflict` finds nothing among the
    /// vehicle's reservations, evaluated atomically with the insert. Fails with
    /// [`StoreError::Overlap`] otherwise.
    async fn create_reservation(
        &self,
        draft: ReservationDraft,
        policy: &OverlapPolicy,
    ) -> StoreResult<Reservation>;

    /// Compare-and-set on the status. When the change makes a non-blocking reservation
    /// blocking again the overlap check is repeated inside the same critical section.
    async fn update_reservation_status(
        &self,
        id: Uuid,
        expected: ReservationStatus,
        status: ReservationStatus,
    ) -> StoreResult<Reservation>;

    async fn update_trip_details(&self, id: Uuid, trip: &TripDetails) -> StoreResult<Reservation>;
}

#[async_trait]
pub trait LocationRepository: Send + Sync {
    async fn list_locations(&self) -> StoreResult<Vec<Location>>;

    async fn create_location(&self, location: &Location) -> StoreResult<()>;

    async fn set_location_active(&self, id: Uuid, active: bool) -> StoreResult<Location>;
}

/// Tunables the services need from configuration.
#[derive(Debug, Clone)]
pub struct ServiceRules {
    /// Upper bound on any single collaborator call.
    pub store_timeout: Duration,
    pub default_owner_share: SharePercentage,
}

impl Default for ServiceRules {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(5),
            default_owner_share: SharePercentage::FULL,
        }
    }
}

/// Handles to every external collaborator, shared by both services.
#[derive(Clone)]
pub struct Collaborators {
    pub vehicles: Arc<dyn VehicleRepository>,
    pub reservations: Arc<dyn ReservationRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub documents: Arc<dyn DocumentStore>,
    pub notifier: Arc<dyn NotificationSink>,
    pub rules: ServiceRules,
}

impl Collaborators {
    /// Run a store call under the configured timeout.
    pub async fn bounded<T, F>(&self, call: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        let limit = self.rules.store_timeout;
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(timeout_ms = limit.as_millis() as u64, "Store call timed out");
                Err(StoreError::Timeout(limit))
            }
        }
    }

    pub(crate) async fn require_vehicle(&self, id: Uuid) -> crate::CoreResult<Vehicle> {
        self.bounded(self.vehicles.get_vehicle(id))
            .await?
            .ok_or(crate::CoreError::NotFound { entity: "vehicle", id })
    }

    pub(crate) async fn find_location(&self, id: Uuid) -> crate::CoreResult<Option<Location>> {
        let locations = self.bounded(self.locations.list_locations()).await?;
        Ok(locations.into_iter().find(|l| l.id == id))
    }

    /// Bookable and listed in an active location.
    pub(crate) async fn customer_visible(&self, vehicle: &Vehicle) -> crate::CoreResult<bool> {
        if !vehicle.is_available {
            return Ok(false);
        }
        Ok(self
            .find_location(vehicle.location_id)
            .await?
            .is_some_and(|l| l.active))
    }

    pub(crate) async fn require_reservation(&self, id: Uuid) -> crate::CoreResult<Reservation> {
        self.bounded(self.reservations.get_reservation(id))
            .await?
            .ok_or(crate::CoreError::NotFound { entity: "reservation", id })
    }
}
