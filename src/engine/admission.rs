use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{oneshot, RwLock};

use crate::limits::*;
use crate::model::*;

use super::conflict::{check_no_conflict, validate_span};
use super::{Engine, EngineError, WalCommand};

impl Engine {
    pub async fn create_room(
        &self,
        description: String,
        price_cents: i64,
    ) -> Result<RoomInfo, EngineError> {
        if self.store.room_count() >= MAX_ROOMS {
            return Err(EngineError::LimitExceeded("too many rooms"));
        }
        if description.len() > MAX_DESCRIPTION_LEN {
            return Err(EngineError::LimitExceeded("description too long"));
        }

        let id = self.store.alloc_room_id();
        let created_at = Utc::now();
        let event = Event::RoomCreated {
            id,
            description: description.clone(),
            price_cents,
            created_at,
        };
        self.wal_append(&event).await?;
        let rs = RoomState::new(id, description.clone(), price_cents, created_at);
        self.store.insert_room(id, Arc::new(RwLock::new(rs)));
        Ok(RoomInfo {
            id,
            description,
            price_cents,
            created_at,
        })
    }

    /// Delete a room and every booking it holds. The bookings live inside
    /// the room's state, so removing the room is the cascade; only the
    /// booking index needs explicit cleanup. Runs under the room's write
    /// lock: admissions parked on the lock find the room gone when they
    /// wake, and of two racing deletes only one logs a record.
    pub async fn delete_room(&self, id: RoomId) -> Result<(), EngineError> {
        let rs = self
            .store
            .get_room(&id)
            .ok_or(EngineError::RoomNotFound(id))?;
        let guard = rs.write().await;
        // A racing delete may have won while we waited on the lock
        if !self.store.contains_room(&id) {
            return Err(EngineError::RoomNotFound(id));
        }

        let event = Event::RoomDeleted { id };
        self.wal_append(&event).await?;
        self.store.remove_room(&id);
        for b in &guard.bookings {
            self.store.unmap_booking(&b.id);
        }
        Ok(())
    }

    /// Admit a booking: resolve the room, then under its write lock re-check
    /// liveness and scan for overlaps before committing. The lock is held
    /// across check + WAL append + apply, so two racing overlapping requests
    /// can never both land, and a delete that got the lock first leaves
    /// nothing to book.
    pub async fn create_booking(
        &self,
        room_id: RoomId,
        span: DateSpan,
    ) -> Result<BookingInfo, EngineError> {
        validate_span(&span)?;
        let rs = self
            .store
            .get_room(&room_id)
            .ok_or(EngineError::RoomNotFound(room_id))?;
        let mut guard = rs.write().await;
        // The room may have been deleted while we waited on the lock
        if !self.store.contains_room(&room_id) {
            return Err(EngineError::RoomNotFound(room_id));
        }
        if guard.bookings.len() >= MAX_BOOKINGS_PER_ROOM {
            return Err(EngineError::LimitExceeded("too many bookings on room"));
        }

        check_no_conflict(&guard, &span)?;

        let id = self.store.alloc_booking_id();
        let event = Event::BookingCreated { id, room_id, span };
        self.persist_and_apply(&mut guard, &event).await?;
        Ok(BookingInfo {
            id,
            room_id,
            start: span.start,
            end: span.end,
        })
    }

    pub async fn delete_booking(&self, id: BookingId) -> Result<RoomId, EngineError> {
        let (room_id, mut guard) = self.resolve_booking_write(&id).await?;
        let event = Event::BookingDeleted { id, room_id };
        self.persist_and_apply(&mut guard, &event).await?;
        Ok(room_id)
    }

    /// Compact the WAL by rewriting it with only the events needed to
    /// recreate the current state. The writer task folds that set out of
    /// the log itself, so a mutation racing this call is either already in
    /// the history it folds or lands in the fresh file after the swap.
    pub async fn compact_wal(&self) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Compact { response: tx })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))
    }

    pub async fn wal_appends_since_compact(&self) -> u64 {
        let (tx, rx) = oneshot::channel();
        if self
            .wal_tx
            .send(WalCommand::AppendsSinceCompact { response: tx })
            .await
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}
