use drivehub_catalog::Vehicle;
use serde::Serialize;

use crate::models::{Reservation, ReservationStatus};

/// Headline numbers for the back-office dashboard. Administrative blocks are not
/// bookings and are left out of every count.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_bookings: usize,
    pub pending: usize,
    pub approved: usize,
    pub completed: usize,
    pub rejected: usize,
    pub realized_revenue: i64,
    pub total_vehicles: usize,
    pub active_vehicles: usize,
}

impl DashboardStats {
    pub fn compute(vehicles: &[Vehicle], reservations: &[Reservation]) -> Self {
        let mut stats = DashboardStats {
            total_vehicles: vehicles.len(),
            active_vehicles: vehicles.iter().filter(|v| v.is_available).count(),
            ..Default::default()
        };

        for reservation in reservations.iter().filter(|r| !r.is_block()) {
            stats.total_bookings += 1;
            match reservation.status {
                ReservationStatus::Pending => stats.pending += 1,
                ReservationStatus::Approved => stats.approved += 1,
                ReservationStatus::Completed => stats.completed += 1,
                ReservationStatus::Rejected => stats.rejected += 1,
                ReservationStatus::Maintenance => {}
            }
            if reservation.status.is_realized() {
                stats.realized_revenue += reservation.total_amount;
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::DocumentRefs;
    use crate::models::{Interval, Renter, ReservationDraft};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn reservation(amount: i64, status: ReservationStatus) -> Reservation {
        let start = Utc.with_ymd_and_hms(2025, 8, 1, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 8, 2, 9, 0, 0).unwrap();
        ReservationDraft {
            vehicle_id: Uuid::new_v4(),
            location_id: Uuid::new_v4(),
            renter: Renter::admin_block(),
            interval: Interval::new(start, end).unwrap(),
            total_amount: amount,
            status,
            block_reason: None,
            documents: DocumentRefs::default(),
        }
        .into_reservation()
    }

    #[test]
    fn test_counts_skip_blocks() {
        let reservations = vec![
            reservation(2000, ReservationStatus::Pending),
            reservation(2400, ReservationStatus::Approved),
            reservation(4800, ReservationStatus::Completed),
            reservation(2400, ReservationStatus::Rejected),
            reservation(0, ReservationStatus::Maintenance),
        ];
        let stats = DashboardStats::compute(&[], &reservations);
        assert_eq!(stats.total_bookings, 4);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.approved, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.realized_revenue, 7200);
        assert_eq!(stats.total_vehicles, 0);
    }
}
