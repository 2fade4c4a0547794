// Engine-side ids for sources and paint layers

use crate::model::LayerId;
use crate::scene::surface::PaintKind;

const PREFIX: &str = "vm-";

pub const DRAFT_SOURCE: &str = "vm-draft";
pub const LASSO_SOURCE: &str = "vm-lasso";
pub const MEASURE_SOURCE: &str = "vm-measure";

/// Role of a paint layer within its source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PaintRole {
    Fill,
    Outline,
    Line,
    Circle,
}

impl PaintRole {
    pub fn kind(self) -> PaintKind {
        match self {
            PaintRole::Fill => PaintKind::Fill,
            PaintRole::Outline | PaintRole::Line => PaintKind::Line,
            PaintRole::Circle => PaintKind::Circle,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            PaintRole::Fill => "fill",
            PaintRole::Outline => "outline",
            PaintRole::Line => "line",
            PaintRole::Circle => "circle",
        }
    }

    fn from_suffix(s: &str) -> Option<PaintRole> {
        Some(match s {
            "fill" => PaintRole::Fill,
            "outline" => PaintRole::Outline,
            "line" => PaintRole::Line,
            "circle" => PaintRole::Circle,
            _ => return None,
        })
    }
}

pub fn source_id(layer: LayerId) -> String {
    format!("{PREFIX}{layer}")
}

pub fn paint_layer_id(source: &str, role: PaintRole) -> String {
    format!("{source}-{}", role.suffix())
}

/// Inverse of `paint_layer_id(source_id(layer), role)`. Overlay ids yield `None`.
pub fn parse_paint_layer_id(id: &str) -> Option<(LayerId, PaintRole)> {
    let rest = id.strip_prefix(PREFIX)?;
    let (layer, suffix) = rest.split_once('-')?;
    Some((layer.parse().ok()?, PaintRole::from_suffix(suffix)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        let id = paint_layer_id(&source_id(12), PaintRole::Outline);
        assert_eq!(id, "vm-12-outline");
        assert_eq!(parse_paint_layer_id(&id), Some((12, PaintRole::Outline)));
    }

    #[test]
    fn overlays_and_foreign_ids_do_not_parse() {
        assert_eq!(parse_paint_layer_id(&paint_layer_id(DRAFT_SOURCE, PaintRole::Circle)), None);
        assert_eq!(parse_paint_layer_id("osm"), None);
        assert_eq!(parse_paint_layer_id("vm-3-halo"), None);
    }
}
