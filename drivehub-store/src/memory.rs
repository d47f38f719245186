use async_trait::async_trait;
use chrono::{DateTime, Utc};
use drivehub_booking::{
    find_conflict, OverlapPolicy, Reservation, ReservationDraft, ReservationStatus, TripDetails,
};
use drivehub_catalog::{Location, SharePercentage, Vehicle};
use drivehub_core::repository::{
    LocationRepository, ReservationFilter, ReservationRepository, StoreError, StoreResult,
    VehicleFilter, VehicleRepository,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    locations: Vec<Location>,
    vehicles: HashMap<Uuid, Vehicle>,
    /// Insertion order, oldest first.
    reservations: Vec<Reservation>,
}

impl Tables {
    fn require_location(&self, id: Uuid) -> StoreResult<()> {
        if self.locations.iter().any(|l| l.id == id) {
            Ok(())
        } else {
            Err(StoreError::Rejected(format!("location {id} does not exist")))
        }
    }
}

/// Process-local store. Every write takes the table lock, so the overlap check and the
/// insert it guards cannot interleave with another writer.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
    latency: Option<Duration>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call, for exercising timeouts.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    async fn lag(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl LocationRepository for InMemoryStore {
    async fn list_locations(&self) -> StoreResult<Vec<Location>> {
        self.lag().await;
        Ok(self.tables.read().await.locations.clone())
    }

    async fn create_location(&self, location: &Location) -> StoreResult<()> {
        self.lag().await;
        let mut tables = self.tables.write().await;
        if tables.locations.iter().any(|l| l.id == location.id) {
            return Err(StoreError::Rejected(format!("location {} already exists", location.id)));
        }
        tables.locations.push(location.clone());
        Ok(())
    }

    async fn set_location_active(&self, id: Uuid, active: bool) -> StoreResult<Location> {
        self.lag().await;
        let mut tables = self.tables.write().await;
        let location = tables
            .locations
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(StoreError::NotFound { entity: "location", id })?;
        location.active = active;
        Ok(location.clone())
    }
}

#[async_trait]
impl VehicleRepository for InMemoryStore {
    async fn list_vehicles(&self, filter: &VehicleFilter) -> StoreResult<Vec<Vehicle>> {
        self.lag().await;
        let tables = self.tables.read().await;
        let mut vehicles: Vec<Vehicle> = tables
            .vehicles
            .values()
            .filter(|v| filter.location_id.map_or(true, |loc| v.location_id == loc))
            .filter(|v| !filter.available_only || v.is_available)
            .cloned()
            .collect();
        vehicles.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(vehicles)
    }

    async fn get_vehicle(&self, id: Uuid) -> StoreResult<Option<Vehicle>> {
        self.lag().await;
        Ok(self.tables.read().await.vehicles.get(&id).cloned())
    }

    async fn create_vehicle(&self, vehicle: &Vehicle) -> StoreResult<()> {
        self.lag().await;
        let mut tables = self.tables.write().await;
        if tables.vehicles.contains_key(&vehicle.id) {
            return Err(StoreError::Rejected(format!("vehicle {} already exists", vehicle.id)));
        }
        tables.require_location(vehicle.location_id)?;
        tables.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(())
    }

    async fn update_vehicle(&self, vehicle: &Vehicle) -> StoreResult<()> {
        self.lag().await;
        let mut tables = self.tables.write().await;
        tables.require_location(vehicle.location_id)?;
        let slot = tables.vehicles.get_mut(&vehicle.id).ok_or(StoreError::NotFound {
            entity: "vehicle",
            id: vehicle.id,
        })?;
        *slot = vehicle.clone();
        Ok(())
    }

    async fn update_owner_share(&self, id: Uuid, share: SharePercentage) -> StoreResult<()> {
        self.lag().await;
        let mut tables = self.tables.write().await;
        let vehicle = tables
            .vehicles
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "vehicle", id })?;
        vehicle.owner.share_percentage = share;
        Ok(())
    }

    async fn delete_vehicle(&self, id: Uuid, as_of: DateTime<Utc>) -> StoreResult<()> {
        self.lag().await;
        let mut tables = self.tables.write().await;
        if !tables.vehicles.contains_key(&id) {
            return Err(StoreError::NotFound { entity: "vehicle", id });
        }
        let open = tables
            .reservations
            .iter()
            .filter(|r| r.vehicle_id == id && r.is_open(as_of))
            .count();
        if open > 0 {
            return Err(StoreError::Referenced { vehicle_id: id, open });
        }
        tables.vehicles.remove(&id);
        tables.reservations.retain(|r| r.vehicle_id != id);
        Ok(())
    }
}

#[async_trait]
impl ReservationRepository for InMemoryStore {
    async fn list_reservations(&self, filter: &ReservationFilter) -> StoreResult<Vec<Reservation>> {
        self.lag().await;
        let tables = self.tables.read().await;
        Ok(tables
            .reservations
            .iter()
            .rev()
            .filter(|r| filter.vehicle_id.map_or(true, |v| r.vehicle_id == v))
            .filter(|r| filter.status.map_or(true, |s| r.status == s))
            .cloned()
            .collect())
    }

    async fn get_reservation(&self, id: Uuid) -> StoreResult<Option<Reservation>> {
        self.lag().await;
        let tables = self.tables.read().await;
        Ok(tables.reservations.iter().find(|r| r.id == id).cloned())
    }

    async fn create_reservation(
        &self,
        draft: ReservationDraft,
        policy: &OverlapPolicy,
    ) -> StoreResult<Reservation> {
        self.lag().await;
        let mut tables = self.tables.write().await;
        if !tables.vehicles.contains_key(&draft.vehicle_id) {
            return Err(StoreError::NotFound {
                entity: "vehicle",
                id: draft.vehicle_id,
            });
        }
        if let Some(existing) =
            find_conflict(&tables.reservations, draft.vehicle_id, &draft.interval, None, policy)
        {
            return Err(StoreError::Overlap(Box::new(existing.clone())));
        }

        let reservation = draft.into_reservation();
        tables.reservations.push(reservation.clone());
        Ok(reservation)
    }

    async fn update_reservation_status(
        &self,
        id: Uuid,
        expected: ReservationStatus,
        status: ReservationStatus,
    ) -> StoreResult<Reservation> {
        self.lag().await;
        let mut tables = self.tables.write().await;
        let idx = tables
            .reservations
            .iter()
            .position(|r| r.id == id)
            .ok_or(StoreError::NotFound { entity: "reservation", id })?;

        let current = &tables.reservations[idx];
        if current.status != expected {
            return Err(StoreError::StaleStatus {
                id,
                expected,
                actual: current.status,
            });
        }
        if !expected.blocks_interval() && status.blocks_interval() {
            if let Some(existing) = find_conflict(
                &tables.reservations,
                current.vehicle_id,
                &current.interval,
                Some(id),
                &OverlapPolicy::strict(),
            ) {
                return Err(StoreError::Overlap(Box::new(existing.clone())));
            }
        }

        let reservation = &mut tables.reservations[idx];
        reservation.status = status;
        Ok(reservation.clone())
    }

    async fn update_trip_details(&self, id: Uuid, trip: &TripDetails) -> StoreResult<Reservation> {
        self.lag().await;
        let mut tables = self.tables.write().await;
        let reservation = tables
            .reservations
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound { entity: "reservation", id })?;
        reservation.trip = trip.clone();
        Ok(reservation.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use drivehub_booking::{DocumentRefs, Interval, Renter};
    use drivehub_catalog::{FuelType, OwnerShare, SeatingClass, Transmission};

    fn vehicle(location_id: Uuid) -> Vehicle {
        Vehicle {
            id: Uuid::new_v4(),
            name: "Swift".to_string(),
            seating: SeatingClass::FourSeater,
            year: 2022,
            transmission: Transmission::Manual,
            fuel: FuelType::Petrol,
            price_24h: 2400,
            price_12h: 2000,
            mileage: None,
            image_url: None,
            location_id,
            is_available: true,
            registration_number: None,
            owner: OwnerShare {
                owner_name: None,
                owner_phone: None,
                share_percentage: SharePercentage::FULL,
            },
        }
    }

    fn draft(vehicle: &Vehicle, start_day: u32, end_day: u32) -> ReservationDraft {
        let interval = Interval::new(
            Utc.with_ymd_and_hms(2024, 3, start_day, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, end_day, 10, 0, 0).unwrap(),
        )
        .unwrap();
        ReservationDraft {
            vehicle_id: vehicle.id,
            location_id: vehicle.location_id,
            renter: Renter::admin_block(),
            interval,
            total_amount: 2400,
            status: ReservationStatus::Pending,
            block_reason: None,
            documents: DocumentRefs::default(),
        }
    }

    async fn seeded() -> (InMemoryStore, Vehicle) {
        let store = InMemoryStore::new();
        let location = Location::new("Kochi");
        let v = vehicle(location.id);
        store.create_location(&location).await.unwrap();
        store.create_vehicle(&v).await.unwrap();
        (store, v)
    }

    #[tokio::test]
    async fn test_vehicle_needs_known_location() {
        let (store, v) = seeded().await;
        let stray = vehicle(Uuid::new_v4());
        assert!(matches!(store.create_vehicle(&stray).await, Err(StoreError::Rejected(_))));
        assert!(store.get_vehicle(stray.id).await.unwrap().is_none());

        let moved = Vehicle {
            location_id: Uuid::new_v4(),
            ..v.clone()
        };
        assert!(matches!(store.update_vehicle(&moved).await, Err(StoreError::Rejected(_))));
        let kept = store.get_vehicle(v.id).await.unwrap().unwrap();
        assert_eq!(kept.location_id, v.location_id);
    }

    #[tokio::test]
    async fn test_create_rejects_overlap_atomically() {
        let (store, v) = seeded().await;
        let first = store
            .create_reservation(draft(&v, 1, 3), &OverlapPolicy::strict())
            .await
            .unwrap();

        let err = store
            .create_reservation(draft(&v, 2, 4), &OverlapPolicy::strict())
            .await
            .unwrap_err();
        match err {
            StoreError::Overlap(existing) => assert_eq!(existing.id, first.id),
            other => panic!("expected overlap, got {other:?}"),
        }

        // back-to-back is fine
        store
            .create_reservation(draft(&v, 3, 5), &OverlapPolicy::strict())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_submissions_only_one_wins() {
        let (store, v) = seeded().await;
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let d = draft(&v, 10, 12);
            handles.push(tokio::spawn(async move {
                store.create_reservation(d, &OverlapPolicy::strict()).await
            }));
        }
        let mut won = 0;
        for h in handles {
            if h.await.unwrap().is_ok() {
                won += 1;
            }
        }
        assert_eq!(won, 1);
    }

    #[tokio::test]
    async fn test_status_cas_and_revival_recheck() {
        let (store, v) = seeded().await;
        let first = store
            .create_reservation(draft(&v, 1, 3), &OverlapPolicy::strict())
            .await
            .unwrap();
        store
            .update_reservation_status(first.id, ReservationStatus::Pending, ReservationStatus::Rejected)
            .await
            .unwrap();

        let err = store
            .update_reservation_status(first.id, ReservationStatus::Pending, ReservationStatus::Approved)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::StaleStatus { actual: ReservationStatus::Rejected, .. }));

        let second = store
            .create_reservation(draft(&v, 2, 4), &OverlapPolicy::strict())
            .await
            .unwrap();

        let err = store
            .update_reservation_status(first.id, ReservationStatus::Rejected, ReservationStatus::Pending)
            .await
            .unwrap_err();
        match err {
            StoreError::Overlap(existing) => assert_eq!(existing.id, second.id),
            other => panic!("expected overlap, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_refused_while_open() {
        let (store, v) = seeded().await;
        let r = store
            .create_reservation(draft(&v, 1, 3), &OverlapPolicy::strict())
            .await
            .unwrap();

        let err = store.delete_vehicle(v.id, Utc::now()).await.unwrap_err();
        assert!(matches!(err, StoreError::Referenced { open: 1, .. }));

        store
            .update_reservation_status(r.id, ReservationStatus::Pending, ReservationStatus::Rejected)
            .await
            .unwrap();
        store.delete_vehicle(v.id, Utc::now()).await.unwrap();
        assert!(store.get_vehicle(v.id).await.unwrap().is_none());
        assert!(store
            .list_reservations(&ReservationFilter::for_vehicle(v.id))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let (store, v) = seeded().await;
        let a = store
            .create_reservation(draft(&v, 1, 2), &OverlapPolicy::strict())
            .await
            .unwrap();
        let b = store
            .create_reservation(draft(&v, 5, 6), &OverlapPolicy::strict())
            .await
            .unwrap();
        let listed = store.list_reservations(&ReservationFilter::default()).await.unwrap();
        assert_eq!(listed.iter().map(|r| r.id).collect::<Vec<_>>(), vec![b.id, a.id]);
    }
}
