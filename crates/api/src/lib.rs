//! repcoach API server library.
//!
//! Exposes the building blocks (config, state, error handling, routes,
//! WebSocket session driver, pose-service client) so integration tests and
//! the binary entrypoint can both access them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod pose;
pub mod response;
pub mod routes;
pub mod state;
pub mod ws;
