//! Overlap detection shared by every path that puts a reservation on the timeline.
//!
//! Customer submissions, administrative blocks, forced status revivals and the
//! storage-layer re-check inside the write transaction all go through
//! [`find_conflict`], so there is exactly one definition of "double-booked".

use std::collections::HashSet;
use uuid::Uuid;

use crate::models::{Interval, Reservation};

/// Which overlapping reservations the caller has explicitly accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlapPolicy {
    acknowledged: HashSet<Uuid>,
}

impl OverlapPolicy {
    /// Any overlap is a conflict.
    pub fn strict() -> Self {
        Self::default()
    }

    /// Overlaps with the listed reservations were surfaced to an operator and confirmed.
    pub fn acknowledging(ids: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            acknowledged: ids.into_iter().collect(),
        }
    }

    pub fn is_strict(&self) -> bool {
        self.acknowledged.is_empty()
    }

    fn accepts(&self, reservation: &Reservation) -> bool {
        self.acknowledged.contains(&reservation.id)
    }
}

/// First reservation in `existing` for `vehicle_id` that still holds its interval and
/// overlaps `candidate`. `Rejected` reservations never conflict. `exclude` skips the
/// reservation being re-checked against its own siblings.
pub fn find_conflict<'a, I>(
    existing: I,
    vehicle_id: Uuid,
    candidate: &Interval,
    exclude: Option<Uuid>,
    policy: &OverlapPolicy,
) -> Option<&'a Reservation>
where
    I: IntoIterator<Item = &'a Reservation>,
{
    existing.into_iter().find(|r| {
        r.vehicle_id == vehicle_id
            && Some(r.id) != exclude
            && r.status.blocks_interval()
            && r.interval.overlaps(candidate)
            && !policy.accepts(r)
    })
}

/// All reservations that would conflict, for presenting to an operator before an override.
pub fn all_conflicts<'a, I>(existing: I, vehicle_id: Uuid, candidate: &Interval) -> Vec<&'a Reservation>
where
    I: IntoIterator<Item = &'a Reservation>,
{
    existing
        .into_iter()
        .filter(|r| {
            r.vehicle_id == vehicle_id
                && r.status.blocks_interval()
                && r.interval.overlaps(candidate)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::DocumentRefs;
    use crate::models::{Renter, ReservationDraft, ReservationStatus};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, hour, 0, 0).unwrap()
    }

    fn reservation(vehicle_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>, status: ReservationStatus) -> Reservation {
        ReservationDraft {
            vehicle_id,
            location_id: Uuid::new_v4(),
            renter: Renter::admin_block(),
            interval: Interval::new(start, end).unwrap(),
            total_amount: 2400,
            status,
            block_reason: None,
            documents: DocumentRefs::default(),
        }
        .into_reservation()
    }

    #[test]
    fn test_every_non_rejected_status_blocks() {
        let vehicle = Uuid::new_v4();
        let candidate = Interval::new(at(2, 10), at(2, 18)).unwrap();

        for status in [
            ReservationStatus::Pending,
            ReservationStatus::Approved,
            ReservationStatus::Completed,
            ReservationStatus::Maintenance,
        ] {
            let existing = vec![reservation(vehicle, at(2, 8), at(2, 12), status)];
            let hit = find_conflict(&existing, vehicle, &candidate, None, &OverlapPolicy::strict());
            assert_eq!(hit.map(|r| r.id), Some(existing[0].id), "{status} should block");
        }
    }

    #[test]
    fn test_rejected_never_blocks() {
        let vehicle = Uuid::new_v4();
        let existing = vec![reservation(vehicle, at(2, 10), at(2, 18), ReservationStatus::Rejected)];
        let identical = Interval::new(at(2, 10), at(2, 18)).unwrap();
        assert!(find_conflict(&existing, vehicle, &identical, None, &OverlapPolicy::strict()).is_none());
    }

    #[test]
    fn test_other_vehicles_and_adjacent_slots_ignored() {
        let vehicle = Uuid::new_v4();
        let existing = vec![
            reservation(Uuid::new_v4(), at(2, 10), at(2, 18), ReservationStatus::Approved),
            reservation(vehicle, at(1, 10), at(2, 10), ReservationStatus::Approved),
            reservation(vehicle, at(2, 18), at(3, 10), ReservationStatus::Approved),
        ];
        let candidate = Interval::new(at(2, 10), at(2, 18)).unwrap();
        assert!(find_conflict(&existing, vehicle, &candidate, None, &OverlapPolicy::strict()).is_none());
    }

    #[test]
    fn test_first_conflict_is_returned() {
        let vehicle = Uuid::new_v4();
        let existing = vec![
            reservation(vehicle, at(5, 0), at(6, 0), ReservationStatus::Pending),
            reservation(vehicle, at(5, 12), at(7, 0), ReservationStatus::Maintenance),
        ];
        let candidate = Interval::new(at(5, 6), at(6, 6)).unwrap();
        let hit = find_conflict(&existing, vehicle, &candidate, None, &OverlapPolicy::strict()).unwrap();
        assert_eq!(hit.id, existing[0].id);
        assert_eq!(all_conflicts(&existing, vehicle, &candidate).len(), 2);
    }

    #[test]
    fn test_acknowledged_overlaps_pass_but_others_still_block() {
        let vehicle = Uuid::new_v4();
        let existing = vec![
            reservation(vehicle, at(5, 0), at(6, 0), ReservationStatus::Pending),
            reservation(vehicle, at(5, 12), at(7, 0), ReservationStatus::Approved),
        ];
        let candidate = Interval::new(at(5, 6), at(6, 6)).unwrap();

        let partial = OverlapPolicy::acknowledging([existing[0].id]);
        let hit = find_conflict(&existing, vehicle, &candidate, None, &partial).unwrap();
        assert_eq!(hit.id, existing[1].id);

        let full = OverlapPolicy::acknowledging(existing.iter().map(|r| r.id));
        assert!(find_conflict(&existing, vehicle, &candidate, None, &full).is_none());
    }

    #[test]
    fn test_exclude_skips_self() {
        let vehicle = Uuid::new_v4();
        let existing = vec![reservation(vehicle, at(5, 0), at(6, 0), ReservationStatus::Pending)];
        let same = existing[0].interval;
        assert!(find_conflict(&existing, vehicle, &same, Some(existing[0].id), &OverlapPolicy::strict()).is_none());
    }
}
