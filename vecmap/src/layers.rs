use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::model::{Feature, GeometryKind, Layer, LayerId, LayerStyle, PropertyValue};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ordered layer list. Position is paint order: later layers draw on top.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LayerList {
    layers: Vec<Layer>,
    next_id: LayerId,
    palette_cursor: usize,
}

impl LayerList {
    pub fn new() -> Self {
        LayerList {
            next_id: 1,
            ..Default::default()
        }
    }

    fn next_id(&mut self) -> LayerId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn as_slice(&self) -> &[Layer] {
        &self.layers
    }

    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    pub fn position(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    /// Push a new layer on top and return its id.
    pub fn create_layer(
        &mut self,
        name: String,
        kind: GeometryKind,
        style: LayerStyle,
        features: Vec<Feature>,
    ) -> LayerId {
        let id = self.next_id();
        self.layers.push(Layer {
            id,
            name,
            geometry_kind: kind,
            visible: true,
            opacity: 1.0,
            selectable: true,
            style,
            features,
            annotation: false,
        });
        id
    }

    /// Create a layer for imported data, styled with the next palette colour.
    pub fn create_imported(
        &mut self,
        name: String,
        kind: GeometryKind,
        features: Vec<Feature>,
        config: &EngineConfig,
    ) -> LayerId {
        let style = config.palette_style(self.palette_cursor, kind);
        self.palette_cursor += 1;
        self.create_layer(name, kind, style, features)
    }

    pub fn reset_palette(&mut self) {
        self.palette_cursor = 0;
    }

    /// Replace the whole list. Ids stay as given; the id counter moves past them.
    /// A repeated id rejects the batch and leaves the list untouched. Opacity is
    /// clamped to 0..1, with non-finite values reset to opaque.
    pub fn replace_all(&mut self, mut layers: Vec<Layer>) -> Result<()> {
        let mut ids = HashSet::with_capacity(layers.len());
        if let Some(dup) = layers.iter().map(|l| l.id).find(|id| !ids.insert(*id)) {
            return Err(Error::DuplicateLayer(dup));
        }
        for l in &mut layers {
            l.opacity = if l.opacity.is_finite() {
                l.opacity.clamp(0.0, 1.0)
            } else {
                1.0
            };
        }
        let max = layers.iter().map(|l| l.id).max().unwrap_or(0);
        self.next_id = self.next_id.max(max + 1);
        self.layers = layers;
        Ok(())
    }

    pub fn remove_layer(&mut self, id: LayerId) -> Option<Layer> {
        let idx = self.position(id)?;
        Some(self.layers.remove(idx))
    }

    /// Swap with the previous layer (one step down in paint order).
    pub fn move_up(&mut self, id: LayerId) -> bool {
        match self.position(id) {
            Some(idx) if idx > 0 => {
                self.layers.swap(idx, idx - 1);
                true
            }
            _ => false,
        }
    }

    /// Swap with the next layer (one step up in paint order).
    pub fn move_down(&mut self, id: LayerId) -> bool {
        match self.position(id) {
            Some(idx) if idx + 1 < self.layers.len() => {
                self.layers.swap(idx, idx + 1);
                true
            }
            _ => false,
        }
    }

    pub fn set_visibility(&mut self, id: LayerId, visible: bool) -> bool {
        self.update(id, |l| l.visible = visible)
    }

    pub fn set_selectable(&mut self, id: LayerId, selectable: bool) -> bool {
        self.update(id, |l| l.selectable = selectable)
    }

    pub fn set_opacity(&mut self, id: LayerId, opacity: f64) -> bool {
        if !opacity.is_finite() {
            return false;
        }
        self.update(id, |l| l.opacity = opacity.clamp(0.0, 1.0))
    }

    /// Rename a layer. Names are trimmed; blank names are rejected.
    pub fn rename(&mut self, id: LayerId, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        self.update(id, |l| l.name = name.to_string())
    }

    pub fn set_style(&mut self, id: LayerId, style: LayerStyle) -> bool {
        self.update(id, |l| l.style = style)
    }

    fn update(&mut self, id: LayerId, f: impl FnOnce(&mut Layer)) -> bool {
        match self.get_mut(id) {
            Some(layer) => {
                f(layer);
                true
            }
            None => false,
        }
    }

    // Features

    /// Append and return the new feature's index.
    pub fn append_feature(&mut self, id: LayerId, feature: Feature) -> Option<usize> {
        let layer = self.get_mut(id)?;
        layer.features.push(feature);
        Some(layer.features.len() - 1)
    }

    pub fn remove_feature(&mut self, id: LayerId, index: usize) -> Option<Feature> {
        let layer = self.get_mut(id)?;
        if index >= layer.features.len() {
            return None;
        }
        Some(layer.features.remove(index))
    }

    pub fn set_feature_property(
        &mut self,
        id: LayerId,
        index: usize,
        key: &str,
        value: PropertyValue,
    ) -> bool {
        match self.get_mut(id).and_then(|l| l.features.get_mut(index)) {
            Some(f) => {
                f.properties.insert(key.to_string(), value);
                true
            }
            None => false,
        }
    }

    /// Union of property keys over the layer's features, in first-seen order.
    pub fn attribute_keys(&self, id: LayerId) -> Option<Vec<String>> {
        let layer = self.get(id)?;
        Some(union_keys(layer.features.iter()))
    }

    pub fn annotation_layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(|l| l.annotation)
    }
}

pub(crate) fn union_keys<'a>(features: impl Iterator<Item = &'a Feature>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for f in features {
        for k in f.properties.keys() {
            if seen.insert(k.as_str()) {
                keys.push(k.clone());
            }
        }
    }
    keys
}
