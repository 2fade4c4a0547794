use crate::geometry::limits::MAX_SESSION_POINTS;
use crate::geometry::measure::{path_length_km, KM_TO_MILES};
use crate::model::Coordinate;
use serde::{Deserialize, Serialize};

/// Snapshot of the measured path.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub points: Vec<Coordinate>,
    pub km: f64,
    pub miles: f64,
}

/// Click path for the distance tool.
#[derive(Clone, Debug, Default)]
pub struct MeasureSession {
    points: Vec<Coordinate>,
}

impl MeasureSession {
    pub fn new() -> Self {
        MeasureSession::default()
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn push(&mut self, coord: Coordinate) -> bool {
        if !coord.is_finite()
            || self.points.len() >= MAX_SESSION_POINTS
            || self.points.last() == Some(&coord)
        {
            return false;
        }
        self.points.push(coord);
        true
    }

    pub fn clear(&mut self) -> bool {
        let had = !self.points.is_empty();
        self.points.clear();
        had
    }

    pub fn measurement(&self) -> Measurement {
        let km = path_length_km(&self.points);
        Measurement {
            points: self.points.clone(),
            km,
            miles: km * KM_TO_MILES,
        }
    }
}
