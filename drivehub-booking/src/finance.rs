use drivehub_catalog::{SharePercentage, Vehicle};
use serde::Serialize;
use uuid::Uuid;

use crate::models::Reservation;

/// Owner/operator split of one vehicle's realized revenue.
///
/// Recomputed from the reservation set on every call with the vehicle's *current* share
/// percentage, so changing the percentage moves historical figures too. There is no
/// ledger snapshot.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RevenueAllocation {
    pub vehicle_id: Uuid,
    pub vehicle_name: String,
    pub owner_name: Option<String>,
    pub share_percentage: SharePercentage,
    pub booking_count: usize,
    pub total_revenue: i64,
    pub owner_earnings: i64,
    pub company_earnings: i64,
}

impl RevenueAllocation {
    /// Only `Approved` and `Completed` reservations of `vehicle` count.
    pub fn allocate(vehicle: &Vehicle, reservations: &[Reservation]) -> Self {
        let realized = reservations
            .iter()
            .filter(|r| r.vehicle_id == vehicle.id && r.status.is_realized());

        let (booking_count, total_revenue) =
            realized.fold((0usize, 0i64), |(count, sum), r| (count + 1, sum + r.total_amount));
        let share = vehicle.owner.share_percentage;
        let (owner_earnings, company_earnings) = share.split(total_revenue);

        Self {
            vehicle_id: vehicle.id,
            vehicle_name: vehicle.name.clone(),
            owner_name: vehicle.owner.owner_name.clone(),
            share_percentage: share,
            booking_count,
            total_revenue,
            owner_earnings,
            company_earnings,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FleetRevenueReport {
    pub location_id: Option<Uuid>,
    pub vehicles: Vec<RevenueAllocation>,
    pub total_revenue: i64,
    pub owner_earnings: i64,
    pub company_earnings: i64,
}

impl FleetRevenueReport {
    pub fn build(vehicles: &[Vehicle], reservations: &[Reservation], location_id: Option<Uuid>) -> Self {
        let allocations: Vec<RevenueAllocation> = vehicles
            .iter()
            .filter(|v| location_id.map_or(true, |loc| v.location_id == loc))
            .map(|v| RevenueAllocation::allocate(v, reservations))
            .collect();

        Self {
            location_id,
            total_revenue: allocations.iter().map(|a| a.total_revenue).sum(),
            owner_earnings: allocations.iter().map(|a| a.owner_earnings).sum(),
            company_earnings: allocations.iter().map(|a| a.company_earnings).sum(),
            vehicles: allocations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::DocumentRefs;
    use crate::models::{Interval, Renter, ReservationDraft, ReservationStatus};
    use chrono::{Duration, TimeZone, Utc};
    use drivehub_catalog::{FuelType, SeatingClass, Transmission, VehicleDraft};

    fn vehicle(share: Option<i64>) -> Vehicle {
        VehicleDraft {
            name: "Ertiga".to_string(),
            seating: SeatingClass::SixSevenSeater,
            year: 2020,
            transmission: Transmission::Manual,
            fuel: FuelType::Petrol,
            price_24h: 3200,
            price_12h: 2600,
            mileage: None,
            image_url: None,
            location_id: Uuid::new_v4(),
            registration_number: None,
            is_available: true,
            owner_name: Some("K. Iyer".to_string()),
            owner_phone: None,
            share_percentage: share,
        }
        .into_vehicle(SharePercentage::default())
        .unwrap()
    }

    fn reservation(vehicle_id: Uuid, amount: i64, status: ReservationStatus, offset_days: i64) -> Reservation {
        let start = Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap() + Duration::days(offset_days);
        ReservationDraft {
            vehicle_id,
            location_id: Uuid::new_v4(),
            renter: Renter::admin_block(),
            interval: Interval::new(start, start + Duration::hours(10)).unwrap(),
            total_amount: amount,
            status,
            block_reason: None,
            documents: DocumentRefs::default(),
        }
        .into_reservation()
    }

    #[test]
    fn test_only_realized_revenue_counts() {
        let car = vehicle(Some(70));
        let reservations = vec![
            reservation(car.id, 2000, ReservationStatus::Approved, 0),
            reservation(car.id, 5000, ReservationStatus::Completed, 1),
            reservation(car.id, 9000, ReservationStatus::Pending, 2),
            reservation(car.id, 9000, ReservationStatus::Rejected, 3),
            reservation(car.id, 9000, ReservationStatus::Maintenance, 4),
            reservation(Uuid::new_v4(), 9000, ReservationStatus::Completed, 5),
        ];

        let allocation = RevenueAllocation::allocate(&car, &reservations);
        assert_eq!(allocation.booking_count, 2);
        assert_eq!(allocation.total_revenue, 7000);
        assert_eq!(allocation.owner_earnings, 4900);
        assert_eq!(allocation.company_earnings, 2100);
    }

    #[test]
    fn test_split_sums_to_total_for_every_share() {
        let mut car = vehicle(None);
        let reservations = vec![
            reservation(car.id, 3333, ReservationStatus::Completed, 0),
            reservation(car.id, 1, ReservationStatus::Approved, 1),
        ];
        for pct in 0..=100 {
            car.owner.share_percentage = SharePercentage::try_from(pct).unwrap();
            let a = RevenueAllocation::allocate(&car, &reservations);
            assert_eq!(a.owner_earnings + a.company_earnings, a.total_revenue);
        }
    }

    #[test]
    fn test_share_change_shifts_past_revenue() {
        let mut car = vehicle(None);
        let reservations = vec![
            reservation(car.id, 6000, ReservationStatus::Completed, 0),
            reservation(car.id, 4000, ReservationStatus::Completed, 1),
        ];

        let before = RevenueAllocation::allocate(&car, &reservations);
        assert_eq!((before.owner_earnings, before.company_earnings), (10_000, 0));

        car.owner.share_percentage = SharePercentage::try_from(60).unwrap();
        let after = RevenueAllocation::allocate(&car, &reservations);
        assert_eq!(after.total_revenue, 10_000);
        assert_eq!((after.owner_earnings, after.company_earnings), (6000, 4000));
    }

    #[test]
    fn test_fleet_report_filters_by_location() {
        let a = vehicle(Some(50));
        let b = vehicle(Some(100));
        let reservations = vec![
            reservation(a.id, 1000, ReservationStatus::Completed, 0),
            reservation(b.id, 3000, ReservationStatus::Approved, 0),
        ];
        let fleet = vec![a.clone(), b];

        let all = FleetRevenueReport::build(&fleet, &reservations, None);
        assert_eq!(all.total_revenue, 4000);
        assert_eq!(all.owner_earnings, 3500);
        assert_eq!(all.company_earnings, 500);

        let only_a = FleetRevenueReport::build(&fleet, &reservations, Some(a.location_id));
        assert_eq!(only_a.vehicles.len(), 1);
        assert_eq!(only_a.total_revenue, 1000);
    }
}
