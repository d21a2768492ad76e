use crate::model::*;

use super::{Engine, EngineError};

/// Room listing sort key. Closed set — anything unrecognized falls back
/// to `Id`, so callers can pass query-string input straight through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Price,
    Created,
}

impl SortField {
    /// Recognized keys: `id`, `price`, `date`.
    pub fn parse(s: &str) -> Self {
        match s {
            "price" => SortField::Price,
            "date" => SortField::Created,
            _ => SortField::Id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Only `desc` flips the order; everything else means ascending.
    pub fn parse(s: &str) -> Self {
        match s {
            "desc" => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }
}

impl Engine {
    /// Snapshot of the full room inventory, sorted; id breaks ties so the
    /// ordering is stable across calls.
    pub async fn list_rooms(&self, sort: SortField, order: SortOrder) -> Vec<RoomInfo> {
        let mut rooms = Vec::with_capacity(self.store.room_count());
        for id in self.store.room_ids() {
            let Some(rs) = self.store.get_room(&id) else {
                continue;
            };
            let guard = rs.read().await;
            rooms.push(RoomInfo {
                id: guard.id,
                description: guard.description.clone(),
                price_cents: guard.price_cents,
                created_at: guard.created_at,
            });
        }

        match sort {
            SortField::Id => rooms.sort_by_key(|r| r.id),
            SortField::Price => {
                rooms.sort_by(|a, b| a.price_cents.cmp(&b.price_cents).then(a.id.cmp(&b.id)))
            }
            SortField::Created => {
                rooms.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
            }
        }
        if order == SortOrder::Desc {
            rooms.reverse();
        }
        rooms
    }

    pub async fn get_room(&self, id: RoomId) -> Result<RoomInfo, EngineError> {
        let rs = self
            .store
            .get_room(&id)
            .ok_or(EngineError::RoomNotFound(id))?;
        let guard = rs.read().await;
        Ok(RoomInfo {
            id: guard.id,
            description: guard.description.clone(),
            price_cents: guard.price_cents,
            created_at: guard.created_at,
        })
    }

    /// All bookings for a room, ascending by start date. Asking about a
    /// room that doesn't exist is an error, not an empty list.
    pub async fn list_bookings(&self, room_id: RoomId) -> Result<Vec<BookingInfo>, EngineError> {
        let rs = self
            .store
            .get_room(&room_id)
            .ok_or(EngineError::RoomNotFound(room_id))?;
        let guard = rs.read().await;
        // RoomState keeps bookings sorted by span.start already.
        Ok(guard
            .bookings
            .iter()
            .map(|b| BookingInfo {
                id: b.id,
                room_id,
                start: b.span.start,
                end: b.span.end,
            })
            .collect())
    }

    pub async fn get_booking(&self, id: BookingId) -> Result<BookingInfo, EngineError> {
        let room_id = self
            .store
            .get_room_for_booking(&id)
            .ok_or(EngineError::BookingNotFound(id))?;
        let rs = self
            .store
            .get_room(&room_id)
            .ok_or(EngineError::BookingNotFound(id))?;
        let guard = rs.read().await;
        guard
            .bookings
            .iter()
            .find(|b| b.id == id)
            .map(|b| BookingInfo {
                id: b.id,
                room_id,
                start: b.span.start,
                end: b.span.end,
            })
            .ok_or(EngineError::BookingNotFound(id))
    }
}
