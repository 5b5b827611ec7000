//! Shared library surface for the saferoute server and its tests.

pub mod api;
pub mod config;
pub mod state;
