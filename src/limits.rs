//! Hard caps on stored data. All violations surface as `LimitExceeded`
//! before anything is written.

/// Max rooms in the inventory.
pub const MAX_ROOMS: usize = 100_000;

/// Max bookings held by a single room.
pub const MAX_BOOKINGS_PER_ROOM: usize = 10_000;

/// Max length of a room description, in bytes.
pub const MAX_DESCRIPTION_LEN: usize = 512;

/// Longest bookable stay, in nights.
pub const MAX_STAY_NIGHTS: i64 = 1_000;

/// Dates outside this year window are rejected before they reach state.
pub const MIN_VALID_YEAR: i32 = 1970;
pub const MAX_VALID_YEAR: i32 = 9999;

/// Price shape: at most 8 integer digits and 2 fraction digits.
pub const MAX_PRICE_INT_DIGITS: usize = 8;
pub const PRICE_FRACTION_DIGITS: usize = 2;
