//! Pixbyt HTTP server library.
//!
//! Exposes the building blocks (config, state, error handling, routes,
//! server lifecycle) so integration tests and the binary entrypoint can both
//! access them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod server;
pub mod state;
