use chrono::Utc;
use drivehub_booking::{DashboardStats, FleetRevenueReport, RevenueAllocation};
use drivehub_catalog::{Location, SharePercentage, Vehicle, VehicleDraft, VehicleListing};
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;

use crate::repository::{Collaborators, ReservationFilter, VehicleFilter};
use crate::session::Actor;
use crate::{CoreError, CoreResult};

/// Vehicle master data, owner shares and the revenue views built on them.
#[derive(Clone)]
pub struct FleetService {
    ctx: Collaborators,
}

impl FleetService {
    pub fn new(ctx: Collaborators) -> Self {
        Self { ctx }
    }

    pub async fn list_active_locations(&self) -> CoreResult<Vec<Location>> {
        let locations = self.ctx.bounded(self.ctx.locations.list_locations()).await?;
        Ok(locations.into_iter().filter(|l| l.active).collect())
    }

    /// Every location, inactive ones included.
    pub async fn list_locations(&self, actor: &Actor) -> CoreResult<Vec<Location>> {
        actor.require_admin()?;
        Ok(self.ctx.bounded(self.ctx.locations.list_locations()).await?)
    }

    pub async fn create_location(&self, actor: &Actor, name: &str) -> CoreResult<Location> {
        let admin = actor.require_admin()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::validation("name", "must not be empty"));
        }
        let location = Location::new(name);
        self.ctx.bounded(self.ctx.locations.create_location(&location)).await?;
        info!(location_id = %location.id, name, admin, "Location created");
        Ok(location)
    }

    /// Deactivating hides the location and its vehicles from customers; existing
    /// reservations are untouched.
    pub async fn set_location_active(&self, actor: &Actor, location_id: Uuid, active: bool) -> CoreResult<Location> {
        let admin = actor.require_admin()?;
        let location = self
            .ctx
            .bounded(self.ctx.locations.set_location_active(location_id, active))
            .await?;
        info!(%location_id, active, admin, "Location visibility changed");
        Ok(location)
    }

    /// What customers may browse: bookable vehicles in active locations, without
    /// registration numbers or owner details.
    pub async fn list_available_vehicles(&self, location_id: Option<Uuid>) -> CoreResult<Vec<VehicleListing>> {
        let active: HashSet<Uuid> = self
            .list_active_locations()
            .await?
            .into_iter()
            .map(|l| l.id)
            .collect();
        if location_id.is_some_and(|id| !active.contains(&id)) {
            return Ok(Vec::new());
        }

        let filter = VehicleFilter {
            location_id,
            available_only: true,
        };
        let vehicles = self.ctx.bounded(self.ctx.vehicles.list_vehicles(&filter)).await?;
        Ok(vehicles
            .iter()
            .filter(|v| v.is_available && active.contains(&v.location_id))
            .map(Vehicle::listing)
            .collect())
    }

    pub async fn get_listing(&self, vehicle_id: Uuid) -> CoreResult<VehicleListing> {
        let vehicle = self.ctx.require_vehicle(vehicle_id).await?;
        if !self.ctx.customer_visible(&vehicle).await? {
            return Err(CoreError::NotFound { entity: "vehicle", id: vehicle_id });
        }
        Ok(vehicle.listing())
    }

    pub async fn list_vehicles(&self, actor: &Actor, filter: VehicleFilter) -> CoreResult<Vec<Vehicle>> {
        actor.require_admin()?;
        Ok(self.ctx.bounded(self.ctx.vehicles.list_vehicles(&filter)).await?)
    }

    pub async fn create_vehicle(&self, actor: &Actor, draft: VehicleDraft) -> CoreResult<Vehicle> {
        let admin = actor.require_admin()?;
        let vehicle = draft.into_vehicle(self.ctx.rules.default_owner_share)?;
        self.require_location(vehicle.location_id).await?;
        self.ctx.bounded(self.ctx.vehicles.create_vehicle(&vehicle)).await?;
        info!(vehicle_id = %vehicle.id, name = %vehicle.name, registration = ?vehicle.registration_number, admin, "Vehicle created");
        Ok(vehicle)
    }

    pub async fn update_vehicle(&self, actor: &Actor, vehicle_id: Uuid, draft: VehicleDraft) -> CoreResult<Vehicle> {
        let admin = actor.require_admin()?;
        let mut vehicle = self.ctx.require_vehicle(vehicle_id).await?;
        vehicle.apply(draft)?;
        self.require_location(vehicle.location_id).await?;
        self.ctx.bounded(self.ctx.vehicles.update_vehicle(&vehicle)).await?;
        info!(%vehicle_id, admin, "Vehicle updated");
        Ok(vehicle)
    }

    async fn require_location(&self, location_id: Uuid) -> CoreResult<()> {
        match self.ctx.find_location(location_id).await? {
            Some(_) => Ok(()),
            None => Err(CoreError::validation("location_id", "unknown location")),
        }
    }

    /// Refused while Pending/Approved bookings or unfinished blocks still reference it.
    pub async fn delete_vehicle(&self, actor: &Actor, vehicle_id: Uuid) -> CoreResult<()> {
        let admin = actor.require_admin()?;
        self.ctx.require_vehicle(vehicle_id).await?;
        self.ctx
            .bounded(self.ctx.vehicles.delete_vehicle(vehicle_id, Utc::now()))
            .await?;
        info!(%vehicle_id, admin, "Vehicle deleted");
        Ok(())
    }

    /// Takes effect for every later revenue computation, past bookings included.
    pub async fn update_owner_share(&self, actor: &Actor, vehicle_id: Uuid, percentage: i64) -> CoreResult<Vehicle> {
        let admin = actor.require_admin()?;
        let share = SharePercentage::try_from(percentage)?;
        let mut vehicle = self.ctx.require_vehicle(vehicle_id).await?;
        let previous = vehicle.owner.share_percentage;
        self.ctx
            .bounded(self.ctx.vehicles.update_owner_share(vehicle_id, share))
            .await?;
        vehicle.owner.share_percentage = share;
        info!(
            %vehicle_id,
            from = previous.value(),
            to = share.value(),
            admin,
            "Owner share updated"
        );
        Ok(vehicle)
    }

    pub async fn vehicle_revenue(&self, actor: &Actor, vehicle_id: Uuid) -> CoreResult<RevenueAllocation> {
        actor.require_admin()?;
        let vehicle = self.ctx.require_vehicle(vehicle_id).await?;
        let reservations = self
            .ctx
            .bounded(self.ctx.reservations.list_reservations(&ReservationFilter::for_vehicle(vehicle_id)))
            .await?;
        Ok(RevenueAllocation::allocate(&vehicle, &reservations))
    }

    pub async fn revenue_report(&self, actor: &Actor, location_id: Option<Uuid>) -> CoreResult<FleetRevenueReport> {
        actor.require_admin()?;
        let (vehicles, reservations) = self.snapshot().await?;
        Ok(FleetRevenueReport::build(&vehicles, &reservations, location_id))
    }

    pub async fn dashboard(&self, actor: &Actor) -> CoreResult<DashboardStats> {
        actor.require_admin()?;
        let (vehicles, reservations) = self.snapshot().await?;
        Ok(DashboardStats::compute(&vehicles, &reservations))
    }

    async fn snapshot(&self) -> CoreResult<(Vec<Vehicle>, Vec<drivehub_booking::Reservation>)> {
        let vehicles = self
            .ctx
            .bounded(self.ctx.vehicles.list_vehicles(&VehicleFilter::default()))
            .await?;
        let reservations = self
            .ctx
            .bounded(self.ctx.reservations.list_reservations(&ReservationFilter::default()))
            .await?;
        Ok((vehicles, reservations))
    }
}
