//! API routes for the saferoute server.

pub mod request_id;
mod routes;

use axum::Router;
use std::sync::Arc;

pub use routes::{parse_route_params, ApiError};

pub fn routes() -> Router<Arc<crate::state::AppState>> {
    routes::create_router()
}

#[cfg(test)]
mod tests;
