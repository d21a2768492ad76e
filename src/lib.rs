//! hotelier: a persistent room-inventory and booking service.
//!
//! State lives in memory behind per-room locks; every mutation is
//! written to a write-ahead log before it is applied, so a restart
//! replays the log and picks up where it left off. The HTTP layer in
//! [`http`] is a thin JSON surface over [`engine::Engine`].

pub mod engine;
pub mod http;
pub mod limits;
pub mod maintenance;
pub mod model;
pub mod observability;
pub mod validate;
pub mod wal;
