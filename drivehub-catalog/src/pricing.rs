use chrono::{DateTime, Utc};

use crate::vehicle::Vehicle;

/// Rentals up to this many whole hours are billed at the flat half-day rate.
pub const HALF_DAY_HOURS: i64 = 12;
const DAY_HOURS: i64 = 24;

/// Quote a rental of `vehicle` over `[start, end)`.
///
/// Elapsed time is counted in whole hours, truncated. Up to and including
/// [`HALF_DAY_HOURS`] the vehicle's 12-hour rate applies as a flat fee; beyond that
/// every started day is billed at the 24-hour rate. An empty or inverted interval
/// quotes `0`, which callers must read as "no valid quote yet".
pub fn price(vehicle: &Vehicle, start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    if end <= start {
        return 0;
    }

    let hours = (end - start).num_hours();
    if hours <= HALF_DAY_HOURS {
        return vehicle.price_12h;
    }

    billable_days(hours) * vehicle.price_24h
}

/// Whole days needed to cover `hours`, rounded up.
pub fn billable_days(hours: i64) -> i64 {
    (hours + DAY_HOURS - 1) / DAY_HOURS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicle::{FuelType, SeatingClass, Transmission, VehicleDraft};
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn vehicle() -> Vehicle {
        VehicleDraft {
            name: "Swift Dzire".to_string(),
            seating: SeatingClass::FourSeater,
            year: 2022,
            transmission: Transmission::Manual,
            fuel: FuelType::Petrol,
            price_24h: 2400,
            price_12h: 2000,
            mileage: None,
            image_url: None,
            location_id: Uuid::new_v4(),
            registration_number: None,
            is_available: true,
            owner_name: None,
            owner_phone: None,
            share_percentage: None,
        }
        .into_vehicle(Default::default())
        .unwrap()
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_half_day_is_flat() {
        let v = vehicle();
        assert_eq!(price(&v, at(10), at(20)), 2000);
        assert_eq!(price(&v, at(10), at(10) + Duration::minutes(30)), 2000);
        // exactly twelve hours still uses the half-day rate
        assert_eq!(price(&v, at(8), at(20)), 2000);
    }

    #[test]
    fn test_thirteen_hours_is_one_day() {
        let v = vehicle();
        assert_eq!(price(&v, at(10), at(23)), 2400);
    }

    #[test]
    fn test_partial_hours_are_truncated() {
        let v = vehicle();
        let start = at(8);
        assert_eq!(price(&v, start, start + Duration::minutes(12 * 60 + 59)), 2000);
    }

    #[test]
    fn test_multi_day_rounds_up() {
        let v = vehicle();
        let start = at(0);
        assert_eq!(price(&v, start, start + Duration::hours(24)), 2400);
        assert_eq!(price(&v, start, start + Duration::hours(25)), 4800);
        assert_eq!(price(&v, start, start + Duration::hours(48)), 4800);
        assert_eq!(price(&v, start, start + Duration::hours(50)), 7200);
    }

    #[test]
    fn test_invalid_interval_quotes_zero() {
        let v = vehicle();
        assert_eq!(price(&v, at(12), at(12)), 0);
        assert_eq!(price(&v, at(12), at(10)), 0);
    }

    #[test]
    fn test_repeated_quotes_agree() {
        let v = vehicle();
        let first = price(&v, at(1), at(1) + Duration::hours(73));
        for _ in 0..5 {
            assert_eq!(price(&v, at(1), at(1) + Duration::hours(73)), first);
        }
        assert_eq!(first, 4 * 2400);
    }

    #[test]
    fn test_billable_days() {
        assert_eq!(billable_days(13), 1);
        assert_eq!(billable_days(24), 1);
        assert_eq!(billable_days(25), 2);
        assert_eq!(billable_days(72), 3);
    }
}
