use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Monotonic room identifier, assigned by the store starting at 1.
pub type RoomId = i64;

/// Monotonic booking identifier, assigned by the store starting at 1.
pub type BookingId = i64;

/// Half-open date range `[start, end)`. The end date is checkout day:
/// a booking ending on the 20th and one starting on the 20th do not collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateSpan {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        debug_assert!(start < end, "DateSpan start must be before end");
        Self { start, end }
    }

    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn overlaps(&self, other: &DateSpan) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// One booking as stored inside its room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRow {
    pub id: BookingId,
    pub span: DateSpan,
}

#[derive(Debug, Clone)]
pub struct RoomState {
    pub id: RoomId,
    pub description: String,
    /// Nightly price in minor units (cents). Rendered with two decimals.
    pub price_cents: i64,
    pub created_at: DateTime<Utc>,
    /// All bookings, sorted by `span.start`.
    pub bookings: Vec<BookingRow>,
}

impl RoomState {
    pub fn new(id: RoomId, description: String, price_cents: i64, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            description,
            price_cents,
            created_at,
            bookings: Vec::new(),
        }
    }

    /// Insert booking maintaining sort order by span.start.
    pub fn insert_booking(&mut self, booking: BookingRow) {
        let pos = self
            .bookings
            .binary_search_by_key(&booking.span.start, |b| b.span.start)
            .unwrap_or_else(|e| e);
        self.bookings.insert(pos, booking);
    }

    /// Remove booking by id.
    pub fn remove_booking(&mut self, id: BookingId) -> Option<BookingRow> {
        if let Some(pos) = self.bookings.iter().position(|b| b.id == id) {
            Some(self.bookings.remove(pos))
        } else {
            None
        }
    }

    /// Return only bookings whose span overlaps the query window.
    /// Uses binary search to skip bookings starting at or after `query.end`.
    pub fn overlapping(&self, query: &DateSpan) -> impl Iterator<Item = &BookingRow> {
        // Everything at index >= right_bound starts at or after query.end → can't overlap.
        let right_bound = self
            .bookings
            .partition_point(|b| b.span.start < query.end);
        self.bookings[..right_bound]
            .iter()
            .filter(move |b| b.span.end > query.start)
    }
}

/// The event types — flat, no nesting. This is the WAL record format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    RoomCreated {
        id: RoomId,
        description: String,
        price_cents: i64,
        created_at: DateTime<Utc>,
    },
    RoomDeleted {
        id: RoomId,
    },
    BookingCreated {
        id: BookingId,
        room_id: RoomId,
        span: DateSpan,
    },
    BookingDeleted {
        id: BookingId,
        room_id: RoomId,
    },
}

// ── Query result types ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub id: RoomId,
    pub description: String,
    pub price_cents: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingInfo {
    pub id: BookingId,
    pub room_id: RoomId,
    pub start: NaiveDate,
    pub end: NaiveDate,
}
