//! Retained-mode map surface for the terminal.
//!
//! Layers keep their geometry, style and bindings between frames. Mouse
//! positions are hit tested against layers with a click or tooltip binding.
//! Fill is rasterised into sample points once per view and reused until the
//! viewport or the layer set changes.

use std::collections::{BTreeMap, HashMap};

use super::geojson::{Bounds, Feature, FeatureId, Geometry, Position};
use super::style::LayerStyle;
use super::surface::{Bindings, GroupId, LayerId, MapSurface};
use super::viewport::{FitOptions, Viewport};

/// Braille dots per cell.
const DOTS_X: u16 = 2;
const DOTS_Y: u16 = 4;
/// Fill sample spacing, in dots.
const FILL_STEP: u16 = 2;

#[derive(Debug, Clone)]
pub struct SceneLayer {
    pub id: LayerId,
    pub group: GroupId,
    pub geometry: Option<Geometry>,
    pub style: LayerStyle,
    pub bindings: Bindings,
    pub bounds: Bounds,
}

impl SceneLayer {
    fn hit(&self, lon: f64, lat: f64, tolerance: f64) -> bool {
        self.geometry
            .as_ref()
            .is_some_and(|geometry| geometry.hit(lon, lat, tolerance))
    }
}

/// One fill sample: map position plus grid parity for opacity dithering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillSample {
    pub position: Position,
    pub ix: u32,
    pub iy: u32,
}

impl FillSample {
    /// Whether this sample is drawn at the given fill opacity.
    pub fn visible_at(&self, opacity: f32) -> bool {
        if opacity >= 0.7 {
            true
        } else if opacity >= 0.4 {
            (self.ix + self.iy) % 2 == 0
        } else if opacity > 0.0 {
            self.ix % 2 == 0 && self.iy % 2 == 0
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RasterKey {
    view: [u64; 4],
    cols: u16,
    rows: u16,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct CanvasSurface {
    next_id: u64,
    generation: u64,
    groups: BTreeMap<GroupId, Vec<LayerId>>,
    layers: BTreeMap<LayerId, SceneLayer>,
    viewport: Viewport,
    cols: u16,
    rows: u16,
    hovered: Option<LayerId>,
    raster_key: Option<RasterKey>,
    raster: HashMap<LayerId, Vec<FillSample>>,
}

impl CanvasSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Records the inner canvas area in cells.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        if cols > 0 && rows > 0 {
            self.cols = cols;
            self.rows = rows;
            self.viewport.set_size(cols, rows);
        }
    }

    pub fn advance(&mut self, now_seconds: f64) {
        self.viewport.advance(now_seconds);
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn has_group(&self, group: GroupId) -> bool {
        self.groups.contains_key(&group)
    }

    /// Layer handles of a group in creation order.
    pub fn group_layers(&self, group: GroupId) -> &[LayerId] {
        self.groups.get(&group).map_or(&[], Vec::as_slice)
    }

    pub fn layer(&self, layer: LayerId) -> Option<&SceneLayer> {
        self.layers.get(&layer)
    }

    /// Layers in draw order.
    pub fn layers(&self) -> impl Iterator<Item = &SceneLayer> {
        self.layers.values()
    }

    /// Style a layer is drawn with this frame, hover highlight included.
    pub fn effective_style(&self, layer: &SceneLayer) -> LayerStyle {
        if self.hovered == Some(layer.id) && layer.bindings.hover {
            layer.style.hovered()
        } else {
            layer.style
        }
    }

    /// Topmost interactive layer under cell `(col, row)` of the canvas.
    pub fn hit_test(&self, col: u16, row: u16) -> Option<LayerId> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        let (lon, lat) = self.viewport.cell_to_position(col, row);
        let tolerance = self.viewport.cell_span();

        self.layers
            .values()
            .rev()
            .filter(|layer| layer.bindings.click.is_some() || layer.bindings.tooltip.is_some())
            .filter(|layer| {
                layer.bounds.is_valid()
                    && Bounds::new(
                        layer.bounds.min_lon - tolerance,
                        layer.bounds.min_lat - tolerance,
                        layer.bounds.max_lon + tolerance,
                        layer.bounds.max_lat + tolerance,
                    )
                    .contains((lon, lat))
            })
            .find(|layer| layer.hit(lon, lat, tolerance))
            .map(|layer| layer.id)
    }

    /// Feature bound to the click handler under `(col, row)`.
    pub fn click(&self, col: u16, row: u16) -> Option<FeatureId> {
        let layer = self.hit_test(col, row)?;
        self.layers.get(&layer)?.bindings.click
    }

    /// Updates the hovered layer. Returns `true` when it changed.
    pub fn hover(&mut self, col: u16, row: u16) -> bool {
        let hovered = self.hit_test(col, row);
        let changed = hovered != self.hovered;
        self.hovered = hovered;
        changed
    }

    pub fn clear_hover(&mut self) {
        self.hovered = None;
    }

    /// Tooltip of the hovered layer.
    pub fn tooltip(&self) -> Option<&str> {
        let layer = self.layers.get(&self.hovered?)?;
        layer.bindings.tooltip.as_deref()
    }

    /// Recomputes fill samples when the view or the layer set changed.
    /// Skipped while the viewport is animating.
    pub fn refresh_raster(&mut self) {
        if self.viewport.is_animating() || self.cols == 0 || self.rows == 0 {
            return;
        }

        let view = self.viewport.bounds();
        let key = RasterKey {
            view: [
                view.min_lon.to_bits(),
                view.min_lat.to_bits(),
                view.max_lon.to_bits(),
                view.max_lat.to_bits(),
            ],
            cols: self.cols,
            rows: self.rows,
            generation: self.generation,
        };
        if self.raster_key == Some(key) {
            return;
        }

        let nx = u32::from(self.cols * DOTS_X / FILL_STEP);
        let ny = u32::from(self.rows * DOTS_Y / FILL_STEP);
        let dx = view.width() / f64::from(nx.max(1));
        let dy = view.height() / f64::from(ny.max(1));

        self.raster = self
            .layers
            .values()
            .filter(|layer| layer.bounds.is_valid() && layer.bounds.intersects(&view))
            .filter_map(|layer| {
                let geometry = layer.geometry.as_ref()?;
                let samples: Vec<FillSample> = (0..nx)
                    .flat_map(|ix| (0..ny).map(move |iy| (ix, iy)))
                    .filter_map(|(ix, iy)| {
                        let lon = (f64::from(ix) + 0.5).mul_add(dx, view.min_lon);
                        let lat = (f64::from(iy) + 0.5).mul_add(-dy, view.max_lat);
                        (layer.bounds.contains((lon, lat)) && geometry.contains(lon, lat))
                            .then_some(FillSample {
                                position: (lon, lat),
                                ix,
                                iy,
                            })
                    })
                    .collect();
                (!samples.is_empty()).then_some((layer.id, samples))
            })
            .collect();
        self.raster_key = Some(key);
    }

    /// Fill samples of a layer from the last raster pass.
    pub fn fill_samples(&self, layer: LayerId) -> &[FillSample] {
        if self.viewport.is_animating() {
            return &[];
        }
        self.raster.get(&layer).map_or(&[], Vec::as_slice)
    }
}

impl MapSurface for CanvasSurface {
    fn create_group(&mut self) -> GroupId {
        let group = GroupId(self.next());
        self.groups.insert(group, Vec::new());
        group
    }

    fn remove_group(&mut self, group: GroupId) {
        let Some(layers) = self.groups.remove(&group) else {
            return;
        };
        for layer in layers {
            self.layers.remove(&layer);
            self.raster.remove(&layer);
        }
        if self.hovered.is_some_and(|id| !self.layers.contains_key(&id)) {
            self.hovered = None;
        }
        self.generation += 1;
    }

    fn add_feature_layer(
        &mut self,
        group: GroupId,
        feature: &Feature,
        style: LayerStyle,
        bindings: Bindings,
    ) -> LayerId {
        let id = LayerId(self.next());
        let geometry = feature.geometry.clone().filter(Geometry::is_supported);
        let layer = SceneLayer {
            id,
            group,
            bounds: feature.bounds(),
            geometry,
            style,
            bindings,
        };
        self.layers.insert(id, layer);
        self.groups.entry(group).or_default().push(id);
        self.generation += 1;
        id
    }

    fn set_style(&mut self, layer: LayerId, style: LayerStyle) -> bool {
        match self.layers.get_mut(&layer) {
            Some(scene) => {
                scene.style = style;
                true
            }
            None => false,
        }
    }

    fn fit_bounds(&mut self, bounds: &Bounds, options: FitOptions) -> bool {
        self.viewport.fit_bounds(bounds, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MapLevel;
    use crate::map::geojson::tests::{collection, square};

    fn surface() -> CanvasSurface {
        let mut surface = CanvasSurface::new();
        surface.resize(80, 40);
        surface
    }

    fn bindings(id: FeatureId) -> Bindings {
        Bindings {
            tooltip: Some(format!("feature {id}")),
            click: Some(id),
            hover: true,
        }
    }

    #[test]
    fn groups_own_their_layers() {
        let mut surface = surface();
        let fc = collection(vec![square(1, "a", 12.0, 6.0, 1.0), square(2, "b", 14.0, 6.0, 1.0)]);
        let style = LayerStyle::unselected(MapLevel::Regions);

        let group = surface.create_group();
        let ids: Vec<LayerId> = fc
            .features
            .iter()
            .map(|f| surface.add_feature_layer(group, f, style, Bindings::default()))
            .collect();

        assert_eq!(surface.group_layers(group), ids.as_slice());
        assert_eq!(surface.len(), 2);

        surface.remove_group(group);
        assert!(surface.is_empty());
        assert!(!surface.has_group(group));
        assert!(!surface.set_style(ids[0], style));
    }

    #[test]
    fn click_and_hover_hit_the_feature_under_the_cursor() {
        let mut surface = surface();
        let fc = collection(vec![square(4, "Centre", 12.0, 6.0, 2.0)]);
        let group = surface.create_group();
        surface.add_feature_layer(
            group,
            &fc.features[0],
            LayerStyle::unselected(MapLevel::Regions),
            bindings(4),
        );
        surface.viewport_mut().set_view((12.0, 6.0), 6.0);

        // Canvas centre sits on the feature.
        assert_eq!(surface.click(40, 20), Some(4));
        assert!(surface.hover(40, 20));
        assert_eq!(surface.tooltip(), Some("feature 4"));

        let layer = surface.layers().next().unwrap();
        assert_eq!(surface.effective_style(layer).weight, 2);

        // Top-left corner is outside.
        assert_eq!(surface.click(0, 0), None);
        assert!(surface.hover(0, 0));
        assert_eq!(surface.tooltip(), None);

        assert_eq!(surface.click(200, 200), None);
    }

    #[test]
    fn raster_fills_visible_polygons_and_is_reused() {
        let mut surface = surface();
        let fc = collection(vec![square(1, "a", 12.0, 6.0, 2.0)]);
        let group = surface.create_group();
        let layer = surface.add_feature_layer(
            group,
            &fc.features[0],
            LayerStyle::unselected(MapLevel::Regions),
            Bindings::default(),
        );
        surface.viewport_mut().set_view((12.0, 6.0), 6.0);

        surface.refresh_raster();
        let samples = surface.fill_samples(layer).to_vec();
        assert!(!samples.is_empty());
        assert!(samples
            .iter()
            .all(|s| fc.features[0].contains(s.position.0, s.position.1)));

        surface.refresh_raster();
        assert_eq!(surface.fill_samples(layer), samples.as_slice());
    }

    #[test]
    fn fill_opacity_dithers_samples() {
        let sample = |ix, iy| FillSample {
            position: (0.0, 0.0),
            ix,
            iy,
        };
        assert!(sample(1, 0).visible_at(0.7));
        assert!(!sample(1, 0).visible_at(0.5));
        assert!(sample(1, 1).visible_at(0.5));
        assert!(!sample(1, 1).visible_at(0.2));
        assert!(sample(2, 2).visible_at(0.2));
    }
}
