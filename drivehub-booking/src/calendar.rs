use chrono::{Datelike, Duration, NaiveDate};
use drivehub_catalog::Vehicle;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Reservation, ReservationSummary};
use crate::BookingError;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "state", content = "reservation", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CellState {
    Available,
    Booked(ReservationSummary),
    Maintenance(ReservationSummary),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub state: CellState,
}

/// What clicking a cell leads to. Neither variant changes any data.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CellAction {
    /// Open the block form; the end date defaults to the clicked day.
    OfferBlock {
        vehicle_id: Uuid,
        start_date: NaiveDate,
        default_end_date: NaiveDate,
    },
    /// Show who holds the slot and stop there until the operator decides.
    Occupied { reservation: ReservationSummary },
}

/// One vehicle's line in the month view.
#[derive(Debug, Clone)]
pub struct VehicleRow {
    pub vehicle_id: Uuid,
    pub vehicle_name: String,
    first_day: NaiveDate,
    days: u32,
    occupying: Vec<Reservation>,
}

impl VehicleRow {
    /// Day cells for the month, computed as they are pulled.
    pub fn cells(&self) -> impl Iterator<Item = DayCell> + '_ {
        (0..self.days).map(move |offset| {
            let date = self.first_day + Duration::days(i64::from(offset));
            DayCell {
                date,
                state: self.state_on(date),
            }
        })
    }

    /// Maintenance wins over a customer booking covering the same day.
    pub fn state_on(&self, date: NaiveDate) -> CellState {
        let mut booked = None;
        for reservation in self.occupying.iter().filter(|r| r.interval.covers_day(date)) {
            if reservation.is_block() {
                return CellState::Maintenance(reservation.summary());
            }
            booked.get_or_insert(reservation);
        }
        match booked {
            Some(r) => CellState::Booked(r.summary()),
            None => CellState::Available,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RowView {
    pub vehicle_id: Uuid,
    pub vehicle_name: String,
    pub cells: Vec<DayCell>,
}

/// Day-granular availability for a fleet over one calendar month.
#[derive(Debug, Clone)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub rows: Vec<VehicleRow>,
}

impl MonthGrid {
    /// Build the grid from scratch. Rejected reservations are dropped up front; every
    /// other status occupies its days.
    pub fn project(
        vehicles: &[Vehicle],
        reservations: &[Reservation],
        year: i32,
        month: u32,
    ) -> Result<Self, BookingError> {
        let first_day = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| BookingError::Validation {
            field: "month",
            reason: format!("{year}-{month:02} is not a calendar month"),
        })?;
        let days = days_in_month(first_day);
        let last_day = first_day + Duration::days(i64::from(days) - 1);

        let rows = vehicles
            .iter()
            .map(|vehicle| VehicleRow {
                vehicle_id: vehicle.id,
                vehicle_name: vehicle.name.clone(),
                first_day,
                days,
                occupying: reservations
                    .iter()
                    .filter(|r| {
                        r.vehicle_id == vehicle.id
                            && r.status.blocks_interval()
                            && r.interval.start().date_naive() <= last_day
                            && r.interval.end() > first_day.and_time(chrono::NaiveTime::MIN).and_utc()
                    })
                    .cloned()
                    .collect(),
            })
            .collect();

        Ok(Self { year, month, rows })
    }

    pub fn row(&self, vehicle_id: Uuid) -> Option<&VehicleRow> {
        self.rows.iter().find(|row| row.vehicle_id == vehicle_id)
    }

    /// Resolve a click on `(vehicle_id, date)`. `None` when the vehicle or date is not
    /// part of this grid.
    pub fn select(&self, vehicle_id: Uuid, date: NaiveDate) -> Option<CellAction> {
        let row = self.row(vehicle_id)?;
        if date.year() != self.year || date.month() != self.month {
            return None;
        }
        Some(match row.state_on(date) {
            CellState::Available => CellAction::OfferBlock {
                vehicle_id,
                start_date: date,
                default_end_date: date,
            },
            CellState::Booked(reservation) | CellState::Maintenance(reservation) => {
                CellAction::Occupied { reservation }
            }
        })
    }

    pub fn materialize(&self) -> Vec<RowView> {
        self.rows
            .iter()
            .map(|row| RowView {
                vehicle_id: row.vehicle_id,
                vehicle_name: row.vehicle_name.clone(),
                cells: row.cells().collect(),
            })
            .collect()
    }
}

fn days_in_month(first_day: NaiveDate) -> u32 {
    let next = if first_day.month() == 12 {
        NaiveDate::from_ymd_opt(first_day.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first_day.year(), first_day.month() + 1, 1)
    };
    next.map_or(31, |n| (n - first_day).num_days() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::DocumentRefs;
    use crate::models::{Interval, Renter, ReservationDraft, ReservationStatus};
    use chrono::{TimeZone, Utc};
    use drivehub_catalog::{FuelType, SeatingClass, SharePercentage, Transmission, VehicleDraft};

    fn vehicle(name: &str) -> Vehicle {
        VehicleDraft {
            name: name.to_string(),
            seating: SeatingClass::FourSeater,
            year: 2023,
            transmission: Transmission::Automatic,
            fuel: FuelType::Electric,
            price_24h: 3000,
            price_12h: 2200,
            mileage: None,
            image_url: None,
            location_id: Uuid::new_v4(),
            registration_number: None,
            is_available: true,
            owner_name: None,
            owner_phone: None,
            share_percentage: None,
        }
        .into_vehicle(SharePercentage::default())
        .unwrap()
    }

    fn booking(vehicle: &Vehicle, from: (u32, u32), to: (u32, u32), status: ReservationStatus) -> Reservation {
        let start = Utc.with_ymd_and_hms(2025, 2, from.0, from.1, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 2, to.0, to.1, 0, 0).unwrap();
        ReservationDraft {
            vehicle_id: vehicle.id,
            location_id: vehicle.location_id,
            renter: Renter::admin_block(),
            interval: Interval::new(start, end).unwrap(),
            total_amount: 0,
            status,
            block_reason: (status == ReservationStatus::Maintenance).then(|| "Service".to_string()),
            documents: DocumentRefs::default(),
        }
        .into_reservation()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, d).unwrap()
    }

    #[test]
    fn test_grid_shape() {
        let fleet = vec![vehicle("Nexon EV"), vehicle("City")];
        let grid = MonthGrid::project(&fleet, &[], 2025, 2).unwrap();
        assert_eq!(grid.rows.len(), 2);
        assert_eq!(grid.rows[0].cells().count(), 28);
        assert!(grid.rows[0].cells().all(|c| c.state == CellState::Available));

        let leap = MonthGrid::project(&fleet, &[], 2024, 2).unwrap();
        assert_eq!(leap.rows[1].cells().count(), 29);
        assert!(MonthGrid::project(&fleet, &[], 2025, 13).is_err());
    }

    #[test]
    fn test_cell_states() {
        let car = vehicle("Nexon EV");
        let reservations = vec![
            booking(&car, (3, 10), (4, 9), ReservationStatus::Approved),
            booking(&car, (10, 0), (11, 0), ReservationStatus::Rejected),
            booking(&car, (15, 9), (15, 18), ReservationStatus::Pending),
            booking(&car, (15, 0), (17, 0), ReservationStatus::Maintenance),
        ];
        let grid = MonthGrid::project(std::slice::from_ref(&car), &reservations, 2025, 2).unwrap();
        let row = grid.row(car.id).unwrap();

        assert!(matches!(row.state_on(day(3)), CellState::Booked(_)));
        assert!(matches!(row.state_on(day(4)), CellState::Booked(_)));
        assert_eq!(row.state_on(day(5)), CellState::Available);
        assert_eq!(row.state_on(day(10)), CellState::Available);
        assert!(matches!(row.state_on(day(15)), CellState::Maintenance(_)));
        assert!(matches!(row.state_on(day(16)), CellState::Maintenance(_)));
        assert_eq!(row.state_on(day(17)), CellState::Available);
    }

    #[test]
    fn test_booking_spanning_months_is_clipped() {
        let car = vehicle("Creta");
        let start = Utc.with_ymd_and_hms(2025, 1, 30, 10, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 2, 2, 10, 0, 0).unwrap();
        let mut spanning = booking(&car, (1, 0), (1, 1), ReservationStatus::Approved);
        spanning.interval = Interval::new(start, end).unwrap();

        let grid = MonthGrid::project(std::slice::from_ref(&car), &[spanning], 2025, 2).unwrap();
        let busy: Vec<u32> = grid.rows[0]
            .cells()
            .filter(|c| c.state != CellState::Available)
            .map(|c| c.date.day())
            .collect();
        assert_eq!(busy, vec![1, 2]);
    }

    #[test]
    fn test_select_cell() {
        let car = vehicle("Nexon EV");
        let reservations = vec![booking(&car, (3, 10), (3, 20), ReservationStatus::Pending)];
        let grid = MonthGrid::project(std::slice::from_ref(&car), &reservations, 2025, 2).unwrap();

        assert_eq!(
            grid.select(car.id, day(5)),
            Some(CellAction::OfferBlock {
                vehicle_id: car.id,
                start_date: day(5),
                default_end_date: day(5),
            })
        );
        match grid.select(car.id, day(3)) {
            Some(CellAction::Occupied { reservation }) => {
                assert_eq!(reservation.id, reservations[0].id);
                assert_eq!(reservation.status, ReservationStatus::Pending);
            }
            other => panic!("expected occupied cell, got {other:?}"),
        }
        assert!(grid.select(Uuid::new_v4(), day(3)).is_none());
        assert!(grid.select(car.id, NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()).is_none());
    }

    #[test]
    fn test_maintenance_summary_hides_renter() {
        let car = vehicle("Nexon EV");
        let reservations = vec![booking(&car, (20, 0), (21, 0), ReservationStatus::Maintenance)];
        let grid = MonthGrid::project(std::slice::from_ref(&car), &reservations, 2025, 2).unwrap();
        match grid.rows[0].state_on(day(20)) {
            CellState::Maintenance(summary) => {
                assert!(summary.renter_name.is_none());
                assert_eq!(summary.block_reason.as_deref(), Some("Service"));
            }
            other => panic!("expected maintenance, got {other:?}"),
        }
    }
}
