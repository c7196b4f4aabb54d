//! Practice backend: timed multiple-choice practice sessions with analytics.
//!
//! The binary in `main.rs` wires these modules together; integration tests
//! drive the router built by [`routes::build_router`].

pub mod analytics;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod generator;
pub mod practice;
pub mod protocol;
pub mod routes;
pub mod sampling;
pub mod scoring;
pub mod seeds;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod topics;
pub mod util;
