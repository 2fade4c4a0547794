use crate::error::{Error, Result};
use crate::geometry::limits::MAX_SESSION_POINTS;
use crate::geometry::predicates::distinct_count;
use crate::model::{
    Coordinate, Feature, Geometry, GeometryKind, LayerId, PropertyValue, ANNOTATION_KEY,
    CREATED_AT_KEY,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// What a finished drawing turns into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DrawPurpose {
    NewLayer,
    #[serde(rename_all = "camelCase")]
    AppendToLayer { layer_id: LayerId },
    Annotation,
}

#[derive(Clone, Debug, Default, PartialEq)]
enum DrawState {
    #[default]
    Idle,
    Accumulating {
        kind: GeometryKind,
        purpose: DrawPurpose,
        points: Vec<Coordinate>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct DrawnFeature {
    pub feature: Feature,
    pub kind: GeometryKind,
    pub purpose: DrawPurpose,
}

/// Turns a sequence of map clicks into one point, line or polygon feature.
#[derive(Clone, Debug, Default)]
pub struct DrawingSession {
    state: DrawState,
}

impl DrawingSession {
    pub fn new() -> Self {
        DrawingSession::default()
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, DrawState::Accumulating { .. })
    }

    pub fn kind(&self) -> Option<GeometryKind> {
        match &self.state {
            DrawState::Accumulating { kind, .. } => Some(*kind),
            DrawState::Idle => None,
        }
    }

    pub fn purpose(&self) -> Option<DrawPurpose> {
        match &self.state {
            DrawState::Accumulating { purpose, .. } => Some(*purpose),
            DrawState::Idle => None,
        }
    }

    /// Clicked vertices so far, for transient marker rendering.
    pub fn points(&self) -> &[Coordinate] {
        match &self.state {
            DrawState::Accumulating { points, .. } => points,
            DrawState::Idle => &[],
        }
    }

    /// Start accumulating. A no-op returning false while already armed.
    pub fn arm(&mut self, kind: GeometryKind, purpose: DrawPurpose) -> bool {
        if self.is_armed() {
            return false;
        }
        self.state = DrawState::Accumulating {
            kind,
            purpose,
            points: Vec::new(),
        };
        true
    }

    /// Record a vertex. Point drawings complete on their first click.
    pub fn on_click(&mut self, coord: Coordinate) -> Option<DrawnFeature> {
        let kind = match &mut self.state {
            DrawState::Accumulating { kind, points, .. } => {
                if !coord.is_finite() || points.len() >= MAX_SESSION_POINTS {
                    return None;
                }
                // A double-click arrives as two clicks on the same spot first.
                if points.last() == Some(&coord) {
                    return None;
                }
                points.push(coord);
                *kind
            }
            DrawState::Idle => return None,
        };
        if kind == GeometryKind::Point {
            return self.complete().ok();
        }
        None
    }

    /// Finish a line or polygon once it has at least two points.
    pub fn on_double_click(&mut self) -> Option<DrawnFeature> {
        let ready = matches!(
            &self.state,
            DrawState::Accumulating { kind, points, .. }
                if *kind != GeometryKind::Point && points.len() >= 2
        );
        if ready {
            self.complete().ok()
        } else {
            None
        }
    }

    pub fn complete(&mut self) -> Result<DrawnFeature> {
        self.complete_at(Utc::now())
    }

    /// Build the geometry from the buffer. With too few points the session
    /// stays accumulating and keeps its points.
    pub fn complete_at(&mut self, now: DateTime<Utc>) -> Result<DrawnFeature> {
        let (kind, purpose, points) = match &self.state {
            DrawState::Accumulating {
                kind,
                purpose,
                points,
            } => (*kind, *purpose, points),
            DrawState::Idle => return Err(Error::NotArmed),
        };
        let got = match kind {
            GeometryKind::Point => points.len().min(1),
            GeometryKind::Line => points.len(),
            GeometryKind::Polygon => distinct_count(points),
        };
        if got < kind.min_points() {
            return Err(Error::InvalidGeometry {
                kind,
                needed: kind.min_points(),
                got,
            });
        }
        let geometry = match kind {
            GeometryKind::Point => Geometry::Point(points[0]),
            GeometryKind::Line => Geometry::LineString(points.clone()),
            GeometryKind::Polygon => {
                let mut ring = points.clone();
                ring.push(points[0]);
                Geometry::Polygon(vec![ring])
            }
        };
        let mut feature = Feature::new(geometry);
        if purpose == DrawPurpose::Annotation {
            feature
                .properties
                .insert(ANNOTATION_KEY.into(), PropertyValue::Bool(true));
            feature.properties.insert(
                CREATED_AT_KEY.into(),
                PropertyValue::String(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
            );
        }
        self.state = DrawState::Idle;
        Ok(DrawnFeature {
            feature,
            kind,
            purpose,
        })
    }

    /// Drop the buffer without emitting anything. Returns whether a session was armed.
    pub fn cancel(&mut self) -> bool {
        std::mem::take(&mut self.state) != DrawState::Idle
    }
}
