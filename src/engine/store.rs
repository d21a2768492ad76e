use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::DashMap;

use crate::model::*;

use super::SharedRoomState;

/// In-process storage: the room table, the booking→room index, and the id
/// allocators. The engine is the only consumer; durability comes from the
/// WAL, not from here.
pub struct RoomStore {
    rooms: DashMap<RoomId, SharedRoomState>,
    booking_to_room: DashMap<BookingId, RoomId>,
    next_room_id: AtomicI64,
    next_booking_id: AtomicI64,
}

impl Default for RoomStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomStore {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            booking_to_room: DashMap::new(),
            next_room_id: AtomicI64::new(1),
            next_booking_id: AtomicI64::new(1),
        }
    }

    // ── Room table ───────────────────────────────────────────

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn contains_room(&self, id: &RoomId) -> bool {
        self.rooms.contains_key(id)
    }

    pub fn get_room(&self, id: &RoomId) -> Option<SharedRoomState> {
        self.rooms.get(id).map(|e| e.value().clone())
    }

    pub fn insert_room(&self, id: RoomId, state: SharedRoomState) {
        self.observe_room_id(id);
        self.rooms.insert(id, state);
    }

    pub fn remove_room(&self, id: &RoomId) -> Option<(RoomId, SharedRoomState)> {
        self.rooms.remove(id)
    }

    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.iter().map(|e| *e.key()).collect()
    }

    // ── Booking index ────────────────────────────────────────

    pub fn get_room_for_booking(&self, booking_id: &BookingId) -> Option<RoomId> {
        self.booking_to_room.get(booking_id).map(|e| *e.value())
    }

    pub fn map_booking(&self, booking_id: BookingId, room_id: RoomId) {
        self.booking_to_room.insert(booking_id, room_id);
    }

    pub fn unmap_booking(&self, booking_id: &BookingId) {
        self.booking_to_room.remove(booking_id);
    }

    // ── Id allocation ────────────────────────────────────────
    //
    // Ids are handed out monotonically within a process lifetime. Replay
    // re-seeds the counters to max(seen) + 1 via the observe_* calls.

    pub fn alloc_room_id(&self) -> RoomId {
        self.next_room_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn alloc_booking_id(&self) -> BookingId {
        self.next_booking_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn observe_room_id(&self, id: RoomId) {
        self.next_room_id.fetch_max(id + 1, Ordering::Relaxed);
    }

    pub fn observe_booking_id(&self, id: BookingId) {
        self.next_booking_id.fetch_max(id + 1, Ordering::Relaxed);
    }

    // ── Event application ────────────────────────────────────

    /// Apply a booking event to a room's state and keep the index in step.
    /// Caller holds the room lock. Room create/delete is handled at the
    /// table level, not here.
    pub fn apply_booking_event(&self, rs: &mut RoomState, event: &Event) {
        match event {
            Event::BookingCreated { id, room_id, span } => {
                rs.insert_booking(BookingRow { id: *id, span: *span });
                self.map_booking(*id, *room_id);
                self.observe_booking_id(*id);
            }
            Event::BookingDeleted { id, .. } => {
                rs.remove_booking(*id);
                self.unmap_booking(id);
                self.observe_booking_id(*id);
            }
            Event::RoomCreated { .. } | Event::RoomDeleted { .. } => {}
        }
    }
}
