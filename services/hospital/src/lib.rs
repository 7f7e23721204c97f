//! Hospital administration service
//!
//! A REST API over patients, doctors and appointments stored in PostgreSQL.
//! Appointment writes are guarded by the booking rule in [`booking`]: a
//! doctor never holds two live appointments in the same slot. Dashboard
//! rollups come from [`stats::StatsAggregator`].

pub mod booking;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod rate_limiter;
pub mod repositories;
pub mod routes;
pub mod seed;
pub mod state;
pub mod stats;
pub mod store;
pub mod validation;
