//! Request middleware.
//!
//! - [`auth::require_basic_auth`] -- Rejects requests without the configured
//!   Basic auth credentials.

pub mod auth;
