//! Failure taxonomy shared by every stage of the detour pipeline.

use crate::pipeline::PipelineStage;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),
    #[error("invalid radius: {0} m (must be a positive number of meters)")]
    InvalidRadius(f64),
    #[error("projection failed: {0}")]
    Projection(String),
    #[error("hazard catalog could not be loaded: {0}")]
    CatalogLoad(String),
    #[error("no route found: {0}")]
    NoRouteFound(String),
    #[error("routing service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("invalid routing request: {0}")]
    InvalidRequest(String),
}

/// Coarse grouping callers use to tell "bad input" from "no solution" from
/// "upstream down".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    BadInput,
    NoSolution,
    UpstreamUnavailable,
    Internal,
}

impl Error {
    /// Stable machine-readable identifier for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidCoordinate(_) => "invalid_coordinate",
            Error::InvalidRadius(_) => "invalid_radius",
            Error::Projection(_) => "projection_error",
            Error::CatalogLoad(_) => "catalog_load_error",
            Error::NoRouteFound(_) => "no_route_found",
            Error::ServiceUnavailable(_) => "service_unavailable",
            Error::InvalidRequest(_) => "invalid_request",
        }
    }

    pub fn class(&self) -> FailureClass {
        match self {
            Error::InvalidCoordinate(_) | Error::InvalidRequest(_) | Error::Projection(_) => {
                FailureClass::BadInput
            }
            Error::NoRouteFound(_) => FailureClass::NoSolution,
            Error::ServiceUnavailable(_) => FailureClass::UpstreamUnavailable,
            Error::InvalidRadius(_) | Error::CatalogLoad(_) => FailureClass::Internal,
        }
    }

    /// Only transient upstream failures are worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::ServiceUnavailable(_))
    }
}

/// A pipeline run that stopped before producing a route.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("detour pipeline failed at {stage}: {error}")]
pub struct PipelineFailure {
    pub stage: PipelineStage,
    #[source]
    pub error: Error,
}

impl PipelineFailure {
    pub fn new(stage: PipelineStage, error: Error) -> Self {
        Self { stage, error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_keep_outcomes_apart() {
        assert_eq!(
            Error::NoRouteFound("blocked".into()).class(),
            FailureClass::NoSolution
        );
        assert_eq!(
            Error::ServiceUnavailable("timeout".into()).class(),
            FailureClass::UpstreamUnavailable
        );
        assert_eq!(
            Error::InvalidCoordinate("lat".into()).class(),
            FailureClass::BadInput
        );
        assert_eq!(
            Error::CatalogLoad("missing".into()).class(),
            FailureClass::Internal
        );
    }

    #[test]
    fn only_service_unavailable_is_transient() {
        assert!(Error::ServiceUnavailable("503".into()).is_transient());
        assert!(!Error::NoRouteFound("2009".into()).is_transient());
        assert!(!Error::InvalidRequest("400".into()).is_transient());
    }

    #[test]
    fn failure_message_names_stage() {
        let failure = PipelineFailure::new(
            PipelineStage::DetourRouted,
            Error::NoRouteFound("avoid polygons block every path".into()),
        );
        let message = failure.to_string();
        assert!(message.contains("detour_routed"));
        assert!(message.contains("no route found"));
    }
}
