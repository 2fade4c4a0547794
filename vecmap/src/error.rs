use crate::model::{GeometryKind, LayerId};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum Error {
    /// Completion attempted with too few vertices; the session keeps accumulating.
    #[error("{kind} needs at least {needed} distinct points, got {got}")]
    InvalidGeometry {
        kind: GeometryKind,
        needed: usize,
        got: usize,
    },
    #[error("map style is not loaded yet")]
    EngineNotReady,
    #[error("no interaction session is armed")]
    NotArmed,
    #[error("invalid layer id {0}")]
    UnknownLayer(LayerId),
    #[error("layer id {0} appears more than once")]
    DuplicateLayer(LayerId),
    #[error("feature index {index} out of range for layer {layer}")]
    UnknownFeature { layer: LayerId, index: usize },
    #[error("parameter '{0}' must be finite")]
    NonFinite(&'static str),
    #[error("invalid GeoJSON: {0}")]
    InvalidGeoJson(String),
    #[error("{what} exceeds the limit of {max}")]
    LimitExceeded { what: &'static str, max: usize },
}

impl Error {
    /// Stable machine-readable code, used by the wasm result objects.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidGeometry { .. } => "invalid_geometry",
            Error::EngineNotReady => "engine_not_ready",
            Error::NotArmed => "not_armed",
            Error::UnknownLayer(_) | Error::UnknownFeature { .. } => "invalid_id",
            Error::DuplicateLayer(_) => "duplicate_id",
            Error::NonFinite(_) => "non_finite",
            Error::InvalidGeoJson(_) => "invalid_geojson",
            Error::LimitExceeded { .. } => "limit_exceeded",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
