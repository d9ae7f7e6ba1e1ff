//! Operations dashboard backend for a small fleet of agents
//!
//! Tails each agent's append-only session logs to derive a liveness badge and
//! a merged activity feed, and scrapes coarse business counters out of
//! markdown notes. Every view is recomputed from disk on each poll.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod logging;
pub mod logs;
pub mod memory;
pub mod roster;
pub mod snapshot;
pub mod system;
pub mod web;
