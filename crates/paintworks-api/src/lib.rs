//! Paintworks HTTP API: routes, request context, error mapping, telemetry.
//!
//! The binary in `main.rs` is the composition root: it builds the event type
//! registry, wires the stores, dispatchers, and background workers, and
//! serves the router assembled from [`routes`].

pub mod context;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;
