use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{BookingId, RedemptionId};
use crate::model::status::BookingStatus;

/// Read-only view of the booking a redemption consumed a session for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingSnapshot {
    pub id: BookingId,
    pub status: BookingStatus,
    pub start_time: Option<DateTime<Utc>>,
}

impl BookingSnapshot {
    #[must_use]
    pub fn new(id: BookingId, status: BookingStatus, start_time: Option<DateTime<Utc>>) -> Self {
        Self {
            id,
            status,
            start_time,
        }
    }
}

/// One session of a package consumed against a booking.
///
/// `slot` is the 1-based session number assigned by the backend. Older
/// payloads omit it, in which case list order decides the slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redemption {
    pub id: RedemptionId,
    pub booking_id: BookingId,
    pub created_at: DateTime<Utc>,
    pub slot: Option<u32>,
    pub booking: Option<BookingSnapshot>,
}

impl Redemption {
    #[must_use]
    pub fn new(id: RedemptionId, booking_id: BookingId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            booking_id,
            created_at,
            slot: None,
            booking: None,
        }
    }

    #[must_use]
    pub fn with_slot(mut self, slot: u32) -> Self {
        self.slot = Some(slot);
        self
    }

    #[must_use]
    pub fn with_booking(mut self, booking: BookingSnapshot) -> Self {
        self.booking = Some(booking);
        self
    }

    /// The booking snapshot, if present and pointing at `booking_id`.
    #[must_use]
    pub fn resolved_booking(&self) -> Option<&BookingSnapshot> {
        self.booking
            .as_ref()
            .filter(|booking| booking.id == self.booking_id)
    }

    #[must_use]
    pub fn booking_status(&self) -> Option<BookingStatus> {
        self.resolved_booking().map(|booking| booking.status)
    }
}
