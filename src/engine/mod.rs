mod admission;
mod conflict;
mod error;
mod queries;
mod store;

pub use error::EngineError;
pub use queries::{SortField, SortOrder};

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, RwLock};

use crate::model::*;
use crate::wal::Wal;

use store::RoomStore;

pub type SharedRoomState = Arc<RwLock<RoomState>>;

// ── Group-commit WAL channel ─────────────────────────────

pub(super) enum WalCommand {
    Append {
        event: Event,
        response: oneshot::Sender<io::Result<()>>,
    },
    Compact {
        response: oneshot::Sender<io::Result<()>>,
    },
    AppendsSinceCompact {
        response: oneshot::Sender<u64>,
    },
}

/// Background task that owns the WAL and batches appends for group commit.
/// 1. Block until the first Append arrives.
/// 2. Buffer it (no fsync).
/// 3. Drain all immediately available Appends (the batch window).
/// 4. Single flush_sync for the whole batch.
/// 5. Respond Ok to all senders.
async fn wal_writer_loop(mut wal: Wal, mut rx: mpsc::Receiver<WalCommand>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            WalCommand::Append { event, response } => {
                let mut batch = vec![(event, response)];

                // Drain all immediately available appends
                loop {
                    match rx.try_recv() {
                        Ok(WalCommand::Append { event, response }) => {
                            batch.push((event, response));
                        }
                        Ok(other) => {
                            // Flush current batch first, then handle the non-append command
                            metrics::histogram!(crate::observability::WAL_FLUSH_BATCH_SIZE)
                                .record(batch.len() as f64);
                            let flush_start = std::time::Instant::now();
                            let result = flush_batch(&mut wal, &mut batch);
                            metrics::histogram!(crate::observability::WAL_FLUSH_DURATION_SECONDS)
                                .record(flush_start.elapsed().as_secs_f64());
                            respond_batch(&mut batch, &result);
                            handle_non_append(&mut wal, other);
                            break;
                        }
                        Err(_) => break, // channel empty — flush batch
                    }
                }

                if !batch.is_empty() {
                    metrics::histogram!(crate::observability::WAL_FLUSH_BATCH_SIZE)
                        .record(batch.len() as f64);
                    let flush_start = std::time::Instant::now();
                    let result = flush_batch(&mut wal, &mut batch);
                    metrics::histogram!(crate::observability::WAL_FLUSH_DURATION_SECONDS)
                        .record(flush_start.elapsed().as_secs_f64());
                    respond_batch(&mut batch, &result);
                }
            }
            other => handle_non_append(&mut wal, other),
        }
    }
}

fn flush_batch(wal: &mut Wal, batch: &mut [(Event, oneshot::Sender<io::Result<()>>)]) -> io::Result<()> {
    let mut append_err: Option<io::Error> = None;
    for (event, _) in batch.iter() {
        if let Err(e) = wal.append_buffered(event) {
            append_err = Some(e);
            break;
        }
    }
    // Always flush — even on append error — so partially buffered bytes
    // don't leak into the next batch (callers were told this batch failed).
    let flush_err = wal.flush_sync().err();
    if let Some(e) = append_err {
        return Err(e);
    }
    if let Some(e) = flush_err {
        return Err(e);
    }
    Ok(())
}

fn respond_batch(batch: &mut Vec<(Event, oneshot::Sender<io::Result<()>>)>, result: &io::Result<()>) {
    for (_, tx) in batch.drain(..) {
        let r = match result {
            Ok(()) => Ok(()),
            Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
        };
        let _ = tx.send(r);
    }
}

fn handle_non_append(wal: &mut Wal, cmd: WalCommand) {
    match cmd {
        WalCommand::Compact { response } => {
            // Fold the minimal set out of the file, not out of live memory:
            // every append that precedes this command is already flushed, so
            // the fold sees the complete history in commit order.
            let result = Wal::replay(wal.path())
                .map(|history| compact_events(&history))
                .and_then(|events| Wal::write_compact_file(wal.path(), &events))
                .and_then(|()| wal.swap_compact_file());
            let _ = response.send(result);
        }
        WalCommand::AppendsSinceCompact { response } => {
            let _ = response.send(wal.appends_since_compact());
        }
        WalCommand::Append { .. } => unreachable!(),
    }
}

/// Fold an event history down to the minimal set that recreates its final
/// state: one RoomCreated per surviving room, one BookingCreated per
/// surviving booking, in id order.
fn compact_events(history: &[Event]) -> Vec<Event> {
    let mut rooms: BTreeMap<RoomId, (Event, BTreeMap<BookingId, DateSpan>)> = BTreeMap::new();
    for event in history {
        match event {
            Event::RoomCreated { id, .. } => {
                rooms.insert(*id, (event.clone(), BTreeMap::new()));
            }
            Event::RoomDeleted { id } => {
                rooms.remove(id);
            }
            Event::BookingCreated { id, room_id, span } => {
                if let Some((_, bookings)) = rooms.get_mut(room_id) {
                    bookings.insert(*id, *span);
                }
            }
            Event::BookingDeleted { id, room_id } => {
                if let Some((_, bookings)) = rooms.get_mut(room_id) {
                    bookings.remove(id);
                }
            }
        }
    }

    let mut minimal = Vec::new();
    for (room_id, (created, bookings)) in rooms {
        minimal.push(created);
        for (id, span) in bookings {
            minimal.push(Event::BookingCreated { id, room_id, span });
        }
    }
    minimal
}

/// The admission controller and query engine over the room inventory.
/// Holds the store plus the channel to the WAL writer task; all mutations
/// go WAL-first, then apply in memory.
pub struct Engine {
    store: RoomStore,
    wal_tx: mpsc::Sender<WalCommand>,
}

impl Engine {
    pub fn new(wal_path: PathBuf) -> std::io::Result<Self> {
        let events = Wal::replay(&wal_path)?;
        let wal = Wal::open(&wal_path)?;
        let (wal_tx, wal_rx) = mpsc::channel(4096);
        tokio::spawn(wal_writer_loop(wal, wal_rx));

        let engine = Self {
            store: RoomStore::new(),
            wal_tx,
        };

        // Replay events — we're the sole owner of these Arcs, so try_read/try_write
        // always succeed instantly (no contention). Never use blocking_read/blocking_write
        // here because this runs inside an async context.
        for event in &events {
            match event {
                Event::RoomCreated { id, description, price_cents, created_at } => {
                    let rs = RoomState::new(*id, description.clone(), *price_cents, *created_at);
                    engine.store.insert_room(*id, Arc::new(RwLock::new(rs)));
                }
                Event::RoomDeleted { id } => {
                    engine.store.observe_room_id(*id);
                    if let Some((_, rs)) = engine.store.remove_room(id) {
                        let guard = rs.try_read().expect("replay: uncontended read");
                        for b in &guard.bookings {
                            engine.store.unmap_booking(&b.id);
                        }
                    }
                }
                Event::BookingCreated { room_id, .. } | Event::BookingDeleted { room_id, .. } => {
                    if let Some(rs) = engine.store.get_room(room_id) {
                        let mut guard = rs.try_write().expect("replay: uncontended write");
                        engine.store.apply_booking_event(&mut guard, event);
                    }
                }
            }
        }

        Ok(engine)
    }

    /// Write event to WAL via the background group-commit writer.
    async fn wal_append(&self, event: &Event) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Append {
                event: event.clone(),
                response: tx,
            })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))
    }

    pub fn room_count(&self) -> usize {
        self.store.room_count()
    }

    pub fn room_exists(&self, id: RoomId) -> bool {
        self.store.contains_room(&id)
    }

    /// WAL-append + apply in one call. The WAL ack comes back before the
    /// in-memory state changes, so a crash never loses an acknowledged write.
    pub(super) async fn persist_and_apply(
        &self,
        rs: &mut RoomState,
        event: &Event,
    ) -> Result<(), EngineError> {
        self.wal_append(event).await?;
        self.store.apply_booking_event(rs, event);
        Ok(())
    }

    /// Lookup booking → room, get room, acquire write lock. The index is
    /// re-read under the lock: a cascade or a racing delete may have taken
    /// the booking while we waited.
    pub(super) async fn resolve_booking_write(
        &self,
        booking_id: &BookingId,
    ) -> Result<(RoomId, tokio::sync::OwnedRwLockWriteGuard<RoomState>), EngineError> {
        let room_id = self
            .store
            .get_room_for_booking(booking_id)
            .ok_or(EngineError::BookingNotFound(*booking_id))?;
        let rs = self
            .store
            .get_room(&room_id)
            .ok_or(EngineError::BookingNotFound(*booking_id))?;
        let guard = rs.write_owned().await;
        if self.store.get_room_for_booking(booking_id) != Some(room_id) {
            return Err(EngineError::BookingNotFound(*booking_id));
        }
        Ok((room_id, guard))
    }
}
