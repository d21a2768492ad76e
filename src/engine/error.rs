use crate::model::{BookingId, RoomId};

#[derive(Debug)]
pub enum EngineError {
    RoomNotFound(RoomId),
    BookingNotFound(BookingId),
    Conflict(BookingId),
    InvalidSpan(&'static str),
    LimitExceeded(&'static str),
    WalError(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::RoomNotFound(id) => write!(f, "room not found: {id}"),
            EngineError::BookingNotFound(id) => write!(f, "booking not found: {id}"),
            EngineError::Conflict(id) => write!(f, "conflicts with booking: {id}"),
            EngineError::InvalidSpan(msg) => write!(f, "invalid date range: {msg}"),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::WalError(e) => write!(f, "WAL error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
