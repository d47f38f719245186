use chrono::{DateTime, Utc};
use drivehub_shared::Masked;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Interval, Renter, Reservation, ReservationStatus, TripDetails};
use crate::BookingError;

/// Where the uploaded identity proof, live photo and signature ended up.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentRefs {
    pub id_proof_url: Option<String>,
    pub live_photo_url: Option<String>,
    pub signature_url: Option<String>,
}

impl DocumentRefs {
    pub fn require_complete(&self) -> Result<(), BookingError> {
        for (field, value) in [
            ("id_proof_url", &self.id_proof_url),
            ("live_photo_url", &self.live_photo_url),
            ("signature_url", &self.signature_url),
        ] {
            if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
                return Err(BookingError::missing(field));
            }
        }
        Ok(())
    }
}

/// Renter fields as typed into the booking form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenterDetails {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub occupation: String,
    #[serde(default)]
    pub address: String,
}

/// A customer's request before pricing and document upload.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub vehicle_id: Uuid,
    pub renter: RenterDetails,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl BookingRequest {
    /// Check every required renter field and the interval. Reports the first missing
    /// field in form order.
    pub fn validate(&self) -> Result<(Renter, Interval), BookingError> {
        let r = &self.renter;
        for (field, value) in [
            ("name", &r.name),
            ("phone", &r.phone),
            ("email", &r.email),
            ("occupation", &r.occupation),
            ("address", &r.address),
        ] {
            if value.trim().is_empty() {
                return Err(BookingError::missing(field));
            }
        }
        if !r.email.contains('@') {
            return Err(BookingError::Validation {
                field: "email",
                reason: "is not an email address".to_string(),
            });
        }

        let start = self.start.ok_or_else(|| BookingError::missing("start"))?;
        let end = self.end.ok_or_else(|| BookingError::missing("end"))?;
        let interval = Interval::new(start, end)?;

        let renter = Renter {
            name: r.name.trim().to_string(),
            phone: Masked::new(r.phone.trim().to_string()),
            email: Masked::new(r.email.trim().to_string()),
            occupation: r.occupation.trim().to_string(),
            address: r.address.trim().to_string(),
        };
        Ok((renter, interval))
    }
}

/// A quote of zero means the interval did not price, never a free rental.
pub fn require_quote(amount: i64) -> Result<i64, BookingError> {
    if amount <= 0 {
        return Err(BookingError::Validation {
            field: "total_amount",
            reason: "interval does not produce a valid quote".to_string(),
        });
    }
    Ok(amount)
}

/// Admin-driven transitions: `Pending -> Approved`, `Pending -> Rejected` and
/// `Approved -> Completed`. With `force` any move between customer statuses is let
/// through; moves into or out of `Maintenance` are refused either way.
pub fn check_transition(
    from: ReservationStatus,
    to: ReservationStatus,
    force: bool,
) -> Result<(), BookingError> {
    use ReservationStatus::*;

    let refused = Err(BookingError::InvalidTransition { from, to });
    if from == to || from == Maintenance || to == Maintenance {
        return refused;
    }
    if force {
        return Ok(());
    }
    match (from, to) {
        (Pending, Approved) | (Pending, Rejected) | (Approved, Completed) => Ok(()),
        _ => refused,
    }
}

/// Odometer readings and discounts only make sense on a rental that went ahead.
pub fn validate_trip(reservation: &Reservation, trip: &TripDetails) -> Result<(), BookingError> {
    if !reservation.status.is_realized() {
        return Err(BookingError::Validation {
            field: "status",
            reason: format!("trip details need an Approved or Completed booking, not {}", reservation.status),
        });
    }
    for (field, value) in [("start_km", trip.start_km), ("end_km", trip.end_km)] {
        if value.is_some_and(|km| km < 0) {
            return Err(BookingError::Validation {
                field,
                reason: "must not be negative".to_string(),
            });
        }
    }
    if let (Some(start), Some(end)) = (trip.start_km, trip.end_km) {
        if end < start {
            return Err(BookingError::Validation {
                field: "end_km",
                reason: format!("{end} is below the starting reading {start}"),
            });
        }
    }
    if let Some(discount) = trip.discount {
        if !(0..=reservation.total_amount).contains(&discount) {
            return Err(BookingError::Validation {
                field: "discount",
                reason: format!("must be between 0 and {}", reservation.total_amount),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReservationDraft;
    use chrono::TimeZone;

    fn request() -> BookingRequest {
        BookingRequest {
            vehicle_id: Uuid::new_v4(),
            renter: RenterDetails {
                name: "Asha Rao".to_string(),
                phone: "9876543210".to_string(),
                email: "asha@example.com".to_string(),
                occupation: "Engineer".to_string(),
                address: "12 MG Road".to_string(),
            },
            start: Some(Utc.with_ymd_and_hms(2025, 7, 1, 10, 0, 0).unwrap()),
            end: Some(Utc.with_ymd_and_hms(2025, 7, 1, 20, 0, 0).unwrap()),
        }
    }

    #[test]
    fn test_complete_request_validates() {
        let (renter, interval) = request().validate().unwrap();
        assert_eq!(renter.name, "Asha Rao");
        assert_eq!(renter.phone.expose(), "9876543210");
        assert_eq!((interval.end() - interval.start()).num_hours(), 10);
    }

    #[test]
    fn test_missing_field_is_named() {
        let mut req = request();
        req.renter.occupation = "   ".to_string();
        assert_eq!(req.validate().unwrap_err(), BookingError::missing("occupation"));

        let mut req = request();
        req.end = None;
        assert_eq!(req.validate().unwrap_err(), BookingError::missing("end"));
    }

    #[test]
    fn test_inverted_interval_rejected() {
        let mut req = request();
        std::mem::swap(&mut req.start, &mut req.end);
        assert!(matches!(req.validate(), Err(BookingError::Validation { field: "end", .. })));
    }

    #[test]
    fn test_documents_must_all_be_present() {
        let mut docs = DocumentRefs {
            id_proof_url: Some("file:///id.jpg".to_string()),
            live_photo_url: Some("file:///photo.jpg".to_string()),
            signature_url: Some(String::new()),
        };
        assert_eq!(docs.require_complete().unwrap_err(), BookingError::missing("signature_url"));
        docs.signature_url = Some("file:///sig.png".to_string());
        assert!(docs.require_complete().is_ok());
    }

    #[test]
    fn test_zero_quote_rejected() {
        assert!(require_quote(0).is_err());
        assert_eq!(require_quote(2000).unwrap(), 2000);
    }

    #[test]
    fn test_expected_transitions() {
        use ReservationStatus::*;
        assert!(check_transition(Pending, Approved, false).is_ok());
        assert!(check_transition(Pending, Rejected, false).is_ok());
        assert!(check_transition(Approved, Completed, false).is_ok());
    }

    #[test]
    fn test_nonsensical_transitions_refused() {
        use ReservationStatus::*;
        assert_eq!(
            check_transition(Rejected, Approved, false).unwrap_err(),
            BookingError::InvalidTransition { from: Rejected, to: Approved }
        );
        assert!(check_transition(Completed, Pending, false).is_err());
        assert!(check_transition(Pending, Completed, false).is_err());
        assert!(check_transition(Approved, Approved, false).is_err());
    }

    #[test]
    fn test_force_never_crosses_block_boundary() {
        use ReservationStatus::*;
        assert!(check_transition(Rejected, Approved, true).is_ok());
        assert!(check_transition(Maintenance, Approved, true).is_err());
        assert!(check_transition(Pending, Maintenance, true).is_err());
    }

    #[test]
    fn test_trip_details_rules() {
        let (renter, interval) = request().validate().unwrap();
        let mut reservation = ReservationDraft {
            vehicle_id: Uuid::new_v4(),
            location_id: Uuid::new_v4(),
            renter,
            interval,
            total_amount: 2000,
            status: ReservationStatus::Pending,
            block_reason: None,
            documents: DocumentRefs::default(),
        }
        .into_reservation();

        let trip = TripDetails {
            start_km: Some(1200),
            end_km: Some(1350),
            discount: Some(200),
            admin_notes: None,
        };
        assert!(validate_trip(&reservation, &trip).is_err());

        reservation.status = ReservationStatus::Completed;
        assert!(validate_trip(&reservation, &trip).is_ok());

        let backwards = TripDetails { end_km: Some(1000), ..trip.clone() };
        assert!(matches!(
            validate_trip(&reservation, &backwards),
            Err(BookingError::Validation { field: "end_km", .. })
        ));

        let too_generous = TripDetails { discount: Some(2500), ..trip };
        assert!(matches!(
            validate_trip(&reservation, &too_generous),
            Err(BookingError::Validation { field: "discount", .. })
        ));
    }
}
