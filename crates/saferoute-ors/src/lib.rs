//! Saferoute ORS - OpenRouteService directions client
//!
//! Implements the `RouteClient` contract over the ORS v2 directions API.

pub mod client;
pub mod wire;

pub use client::OrsClient;
