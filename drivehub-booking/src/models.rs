use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use drivehub_shared::Masked;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::lifecycle::DocumentRefs;
use crate::BookingError;

/// Workflow status of a reservation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ReservationStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
    /// Administrative block. Never reached from, or left for, a customer status.
    Maintenance,
}

impl ReservationStatus {
    pub const ALL: [ReservationStatus; 5] = [
        ReservationStatus::Pending,
        ReservationStatus::Approved,
        ReservationStatus::Rejected,
        ReservationStatus::Completed,
        ReservationStatus::Maintenance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "Pending",
            ReservationStatus::Approved => "Approved",
            ReservationStatus::Rejected => "Rejected",
            ReservationStatus::Completed => "Completed",
            ReservationStatus::Maintenance => "Maintenance",
        }
    }

    /// Every status except `Rejected` holds its interval, including unconfirmed requests.
    pub fn blocks_interval(&self) -> bool {
        !matches!(self, ReservationStatus::Rejected)
    }

    /// Revenue counts only once a booking is approved.
    pub fn is_realized(&self) -> bool {
        matches!(self, ReservationStatus::Approved | ReservationStatus::Completed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Rejected | ReservationStatus::Completed | ReservationStatus::Maintenance
        )
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReservationStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| BookingError::Validation {
                field: "status",
                reason: format!("unknown status {s:?}"),
            })
    }
}

/// Half-open time range `[start, end)` with `start < end`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RawInterval")]
pub struct Interval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawInterval> for Interval {
    type Error = BookingError;

    fn try_from(raw: RawInterval) -> Result<Self, Self::Error> {
        Interval::new(raw.start, raw.end)
    }
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, BookingError> {
        if start >= end {
            return Err(BookingError::Validation {
                field: "end",
                reason: format!("must be after start ({start} >= {end})"),
            });
        }
        Ok(Self { start, end })
    }

    /// Whole calendar days `[first 00:00, last + 1 day 00:00)` in UTC.
    pub fn whole_days(first: NaiveDate, last: NaiveDate) -> Result<Self, BookingError> {
        if last < first {
            return Err(BookingError::Validation {
                field: "end_date",
                reason: format!("{last} is before {first}"),
            });
        }
        let end = day_start(last)
            .checked_add_signed(Duration::days(1))
            .ok_or_else(|| BookingError::Validation {
                field: "end_date",
                reason: format!("{last} is out of range"),
            })?;
        Interval::new(day_start(first), end)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// True when any instant of `day` (UTC) falls inside the interval.
    pub fn covers_day(&self, day: NaiveDate) -> bool {
        let day_start = day_start(day);
        // Past the last representable day, the day runs to the end of time.
        let before_next = match day_start.checked_add_signed(Duration::days(1)) {
            Some(next) => self.start < next,
            None => true,
        };
        before_next && self.end > day_start
    }
}

fn day_start(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// Identity fields of the person renting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Renter {
    pub name: String,
    pub phone: Masked<String>,
    pub email: Masked<String>,
    pub occupation: String,
    pub address: String,
}

impl Renter {
    /// Placeholder identity carried by administrative blocks.
    pub fn admin_block() -> Self {
        Self {
            name: "ADMIN_BLOCK".to_string(),
            phone: Masked::new(String::new()),
            email: Masked::new(String::new()),
            occupation: "Admin".to_string(),
            address: "Admin".to_string(),
        }
    }
}

/// Odometer and settlement fields filled in once a rental is underway or done.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TripDetails {
    pub start_km: Option<i64>,
    pub end_km: Option<i64>,
    pub discount: Option<i64>,
    pub admin_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reservation {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub location_id: Uuid,
    pub renter: Renter,
    pub interval: Interval,
    /// Frozen at creation; never recomputed from later rate changes.
    pub total_amount: i64,
    pub status: ReservationStatus,
    /// Free-text reason for administrative blocks, `None` for customer bookings.
    pub block_reason: Option<String>,
    pub documents: DocumentRefs,
    pub trip: TripDetails,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    pub fn is_block(&self) -> bool {
        self.status == ReservationStatus::Maintenance
    }

    /// Still ties up its vehicle: a request or approval awaiting completion, or a
    /// block that has not ended by `as_of`.
    pub fn is_open(&self, as_of: DateTime<Utc>) -> bool {
        match self.status {
            ReservationStatus::Pending | ReservationStatus::Approved => true,
            ReservationStatus::Maintenance => self.interval.end() > as_of,
            ReservationStatus::Rejected | ReservationStatus::Completed => false,
        }
    }

    pub fn summary(&self) -> ReservationSummary {
        ReservationSummary {
            id: self.id,
            status: self.status,
            start: self.interval.start(),
            end: self.interval.end(),
            renter_name: (!self.is_block()).then(|| self.renter.name.clone()),
            block_reason: self.block_reason.clone(),
        }
    }
}

/// A reservation that has passed validation but has not been persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationDraft {
    pub vehicle_id: Uuid,
    pub location_id: Uuid,
    pub renter: Renter,
    pub interval: Interval,
    pub total_amount: i64,
    pub status: ReservationStatus,
    pub block_reason: Option<String>,
    pub documents: DocumentRefs,
}

impl ReservationDraft {
    pub fn into_reservation(self) -> Reservation {
        Reservation {
            id: Uuid::new_v4(),
            vehicle_id: self.vehicle_id,
            location_id: self.location_id,
            renter: self.renter,
            interval: self.interval,
            total_amount: self.total_amount,
            status: self.status,
            block_reason: self.block_reason,
            documents: self.documents,
            trip: TripDetails::default(),
            created_at: Utc::now(),
        }
    }
}

/// What an operator sees about an occupying reservation. Customers only ever get the
/// variant produced by [`ReservationSummary::anonymized`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReservationSummary {
    pub id: Uuid,
    pub status: ReservationStatus,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub renter_name: Option<String>,
    pub block_reason: Option<String>,
}

impl ReservationSummary {
    pub fn anonymized(mut self) -> Self {
        self.renter_name = None;
        self.block_reason = None;
        self
    }
}
