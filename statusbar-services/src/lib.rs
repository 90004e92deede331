//! Services for the ICONOMI status bar
//!
//! Wires the upstream clients to the shared state: two independent polling
//! loops keep the latest snapshot and quote fresh, and every change is
//! projected and pushed to a [`StatusSurface`].

pub mod status_service;
pub mod surface;

pub use status_service::{PollerConfig, StatusService};
pub use surface::StatusSurface;
