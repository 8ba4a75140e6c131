//! Weekly football stat ingestion: turns raw per-player stat lines into
//! gap-free per-player and per-team game-log series, resolves team outcomes
//! against the schedule, and keeps one SQLite partition per entity in sync
//! by appending only what is missing.

pub mod aggregate;
pub mod clean;
pub mod fake_feed;
pub mod feed;
pub mod game_log;
pub mod gap_fill;
pub mod http;
pub mod results;
pub mod schedule;
pub mod store;
pub mod sync;
