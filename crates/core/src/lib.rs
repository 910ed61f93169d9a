//! Subprocess management for the Pixbyt server.
//!
//! Everything that touches the `meltano` CLI lives here, independent of the
//! HTTP layer:
//!
//! - [`launcher`] -- spawns children with the controlled environment.
//! - [`scheduler`] -- the scheduler process tied to the server lifetime.
//! - [`runner`] -- one-shot `meltano run <app>` invocations.
//! - [`env`] -- environment overlays and the Pixlet tap keys.

pub mod env;
pub mod error;
pub mod launcher;
pub mod runner;
pub mod scheduler;
