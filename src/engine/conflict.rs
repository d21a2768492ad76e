use chrono::Datelike;

use crate::model::*;

use super::EngineError;

/// Structural checks on a date range before it may touch room state.
/// Callers upstream have usually validated already; mutations re-check
/// because the engine is also driven directly by tests and future callers.
pub(crate) fn validate_span(span: &DateSpan) -> Result<(), EngineError> {
    use crate::limits::*;
    if span.start >= span.end {
        return Err(EngineError::InvalidSpan("start must be before end"));
    }
    if span.start.year() < MIN_VALID_YEAR || span.end.year() > MAX_VALID_YEAR {
        return Err(EngineError::LimitExceeded("date out of range"));
    }
    if span.nights() > MAX_STAY_NIGHTS {
        return Err(EngineError::LimitExceeded("stay too long"));
    }
    Ok(())
}

/// Scan the room's bookings for any overlap with `span` under half-open
/// semantics. First hit wins; nothing is written on conflict.
pub(crate) fn check_no_conflict(rs: &RoomState, span: &DateSpan) -> Result<(), EngineError> {
    if let Some(existing) = rs.overlapping(span).next() {
        return Err(EngineError::Conflict(existing.id));
    }
    Ok(())
}
