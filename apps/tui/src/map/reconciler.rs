//! Keeps the rendered GeoJSON layer in step with the latest data.
//!
//! When a new collection has the same shape as the one on screen (same
//! level, same feature count, every id already indexed) only per-feature
//! styles are patched in place. Anything else tears the layer down and
//! rebuilds it, rebinding handlers and refitting the view.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::geojson::{Feature, FeatureCollection, FeatureId};
use super::style::{color_by_value, LayerStyle};
use super::surface::{Bindings, GroupId, LayerId, MapSurface};
use super::viewport::FitOptions;
use crate::domain::MapLevel;

pub const BUILD_PADDING: f64 = 50.0;
pub const SELECT_PADDING: f64 = 100.0;
pub const SELECT_MAX_ZOOM: f64 = 10.0;
pub const FIT_DURATION: Duration = Duration::from_millis(500);

/// Per-feature values driving a choropleth fill.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metric {
    values: HashMap<FeatureId, f64>,
    max: f64,
}

impl Metric {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (FeatureId, f64)>) -> Self {
        let values: HashMap<FeatureId, f64> = pairs
            .into_iter()
            .filter(|(_, value)| value.is_finite())
            .collect();
        let max = values.values().copied().fold(0.0, f64::max);
        Self { values, max }
    }

    pub fn value(&self, id: FeatureId) -> Option<f64> {
        self.values.get(&id).copied()
    }

    pub const fn max(&self) -> f64 {
        self.max
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Inputs of the per-feature style function.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleContext {
    pub level: MapLevel,
    pub selected: Option<FeatureId>,
    pub metric: Option<Arc<Metric>>,
}

impl StyleContext {
    pub fn style_for(&self, id: Option<FeatureId>) -> LayerStyle {
        if id.is_some() && id == self.selected {
            return LayerStyle::selected(self.level);
        }
        let base = LayerStyle::unselected(self.level);
        match (id, &self.metric) {
            (Some(id), Some(metric)) => metric
                .value(id)
                .map_or(base, |value| base.with_fill(color_by_value(value, metric.max()))),
            _ => base,
        }
    }

    fn bindings_for(&self, feature: &Feature) -> Bindings {
        let id = feature.id();
        Bindings {
            tooltip: Some(feature.name().to_string()),
            click: id,
            hover: id.is_none() || id != self.selected,
        }
    }
}

/// The overlay currently on screen.
#[derive(Debug, Clone)]
pub struct RenderedLayer {
    pub group: GroupId,
    pub index: HashMap<FeatureId, LayerId>,
    pub snapshot: Arc<FeatureCollection>,
    pub level: MapLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Styles patched in place on existing layers.
    Incremental { restyled: usize },
    /// Layer discarded and rebuilt from the new collection.
    Rebuilt { features: usize, fitted: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    Zoomed,
    /// No rendered feature carries that id.
    NotFound,
    /// The feature exists but has nothing to zoom to.
    NoGeometry,
}

#[derive(Debug, Default)]
pub struct Reconciler {
    rendered: Option<RenderedLayer>,
}

impl Reconciler {
    pub const fn new() -> Self {
        Self { rendered: None }
    }

    pub const fn rendered(&self) -> Option<&RenderedLayer> {
        self.rendered.as_ref()
    }

    pub fn layer_for(&self, id: FeatureId) -> Option<LayerId> {
        self.rendered.as_ref()?.index.get(&id).copied()
    }

    fn can_patch(&self, collection: &FeatureCollection, ctx: &StyleContext) -> bool {
        let Some(rendered) = &self.rendered else {
            return false;
        };
        rendered.level == ctx.level
            && rendered.snapshot.len() == collection.len()
            && collection
                .features
                .iter()
                .filter_map(Feature::id)
                .all(|id| rendered.index.contains_key(&id))
    }

    /// Brings the surface in line with `collection` styled by `ctx`.
    pub fn reconcile<S: MapSurface>(
        &mut self,
        surface: &mut S,
        collection: Arc<FeatureCollection>,
        ctx: &StyleContext,
    ) -> ReconcileOutcome {
        if self.can_patch(&collection, ctx) {
            if let Some(rendered) = self.rendered.as_mut() {
                let restyled = patch_styles(surface, rendered, &collection, ctx);
                rendered.snapshot = collection;
                tracing::debug!(restyled, "map layer restyled in place");
                return ReconcileOutcome::Incremental { restyled };
            }
        }

        self.rebuild(surface, collection, ctx)
    }

    fn rebuild<S: MapSurface>(
        &mut self,
        surface: &mut S,
        collection: Arc<FeatureCollection>,
        ctx: &StyleContext,
    ) -> ReconcileOutcome {
        if let Some(old) = self.rendered.take() {
            surface.remove_group(old.group);
        }

        let group = surface.create_group();
        let mut index = HashMap::with_capacity(collection.len());
        for feature in &collection.features {
            let id = feature.id();
            let layer = surface.add_feature_layer(
                group,
                feature,
                ctx.style_for(id),
                ctx.bindings_for(feature),
            );
            if let Some(id) = id {
                index.entry(id).or_insert(layer);
            }
        }

        let fitted = surface.fit_bounds(
            &collection.bounds(),
            FitOptions::animated(BUILD_PADDING, FIT_DURATION),
        );

        let features = collection.len();
        tracing::debug!(
            features,
            indexed = index.len(),
            level = ctx.level.as_str(),
            "map layer rebuilt"
        );

        self.rendered = Some(RenderedLayer {
            group,
            index,
            snapshot: collection,
            level: ctx.level,
        });

        ReconcileOutcome::Rebuilt { features, fitted }
    }

    /// Zooms to one rendered feature without touching the layer.
    pub fn select<S: MapSurface>(&self, surface: &mut S, id: FeatureId) -> SelectOutcome {
        let Some(feature) = self
            .rendered
            .as_ref()
            .and_then(|rendered| rendered.snapshot.find(id))
        else {
            return SelectOutcome::NotFound;
        };

        let options = FitOptions::animated(SELECT_PADDING, FIT_DURATION).max_zoom(SELECT_MAX_ZOOM);
        if surface.fit_bounds(&feature.bounds(), options) {
            SelectOutcome::Zoomed
        } else {
            SelectOutcome::NoGeometry
        }
    }

    /// Removes the rendered layer, if any.
    pub fn clear<S: MapSurface>(&mut self, surface: &mut S) {
        if let Some(old) = self.rendered.take() {
            surface.remove_group(old.group);
        }
    }
}

fn patch_styles<S: MapSurface>(
    surface: &mut S,
    rendered: &RenderedLayer,
    collection: &FeatureCollection,
    ctx: &StyleContext,
) -> usize {
    collection
        .features
        .iter()
        .filter_map(Feature::id)
        .filter_map(|id| rendered.index.get(&id).map(|layer| (id, *layer)))
        .filter(|(id, layer)| surface.set_style(*layer, ctx.style_for(Some(*id))))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::canvas::CanvasSurface;
    use crate::map::geojson::tests::{collection, square};
    use crate::map::style::{AMBER_400, GREEN_500};
    use serde_json::json;

    fn regions(ids: &[i64]) -> Arc<FeatureCollection> {
        Arc::new(collection(
            ids.iter()
                .enumerate()
                .map(|(i, id)| square(*id, &format!("R{id}"), 10.0 + i as f64 * 2.0, 6.0, 0.9))
                .collect(),
        ))
    }

    fn ctx(selected: Option<FeatureId>) -> StyleContext {
        StyleContext {
            level: MapLevel::Regions,
            selected,
            metric: None,
        }
    }

    fn surface() -> CanvasSurface {
        let mut surface = CanvasSurface::new();
        surface.resize(120, 40);
        surface
    }

    fn settle(surface: &mut CanvasSurface) {
        surface.advance(0.0);
        for step in 1..=10 {
            surface.advance(f64::from(step) * 0.2);
        }
    }

    #[test]
    fn first_render_builds_and_indexes_every_feature() {
        let mut surface = surface();
        let mut reconciler = Reconciler::new();

        let outcome = reconciler.reconcile(&mut surface, regions(&[1, 2, 3]), &ctx(None));

        assert_eq!(
            outcome,
            ReconcileOutcome::Rebuilt {
                features: 3,
                fitted: true
            }
        );
        let rendered = reconciler.rendered().unwrap();
        assert_eq!(rendered.index.len(), 3);
        assert_eq!(surface.group_layers(rendered.group).len(), 3);
        assert!(surface.viewport().is_animating());

        let layer = surface.layer(reconciler.layer_for(2).unwrap()).unwrap();
        assert_eq!(layer.bindings.tooltip.as_deref(), Some("R2"));
        assert_eq!(layer.bindings.click, Some(2));
        assert!(layer.bindings.hover);
    }

    #[test]
    fn same_count_and_ids_only_changes_styles() {
        let mut surface = surface();
        let mut reconciler = Reconciler::new();
        reconciler.reconcile(&mut surface, regions(&[1, 2, 3]), &ctx(None));
        settle(&mut surface);

        let before = reconciler.rendered().unwrap().clone();
        let layers_before = surface.group_layers(before.group).to_vec();
        let view_before = surface.viewport().clone();

        let outcome = reconciler.reconcile(&mut surface, regions(&[1, 2, 3]), &ctx(Some(2)));

        assert_eq!(outcome, ReconcileOutcome::Incremental { restyled: 3 });
        let after = reconciler.rendered().unwrap();
        assert_eq!(after.group, before.group);
        assert_eq!(after.index, before.index);
        assert_eq!(surface.group_layers(after.group), layers_before.as_slice());
        assert_eq!(surface.len(), 3);
        assert_eq!(surface.viewport(), &view_before);

        let selected = surface.layer(after.index[&2]).unwrap();
        assert_eq!(selected.style, LayerStyle::selected(MapLevel::Regions));
        let other = surface.layer(after.index[&1]).unwrap();
        assert_eq!(other.style, LayerStyle::unselected(MapLevel::Regions));
    }

    #[test]
    fn differing_count_replaces_every_handle() {
        let mut surface = surface();
        let mut reconciler = Reconciler::new();
        reconciler.reconcile(&mut surface, regions(&[1, 2, 3]), &ctx(None));
        let before = reconciler.rendered().unwrap().clone();

        let outcome = reconciler.reconcile(&mut surface, regions(&[1, 2, 3, 4]), &ctx(None));

        assert!(matches!(outcome, ReconcileOutcome::Rebuilt { features: 4, .. }));
        let after = reconciler.rendered().unwrap();
        assert_ne!(after.group, before.group);
        assert!(!surface.has_group(before.group));
        assert_eq!(surface.len(), 4);
        for old in before.index.values() {
            assert!(after.index.values().all(|new| new != old));
            assert!(surface.layer(*old).is_none());
        }
    }

    #[test]
    fn same_count_with_new_ids_rebuilds() {
        let mut surface = surface();
        let mut reconciler = Reconciler::new();
        reconciler.reconcile(&mut surface, regions(&[1, 2, 3]), &ctx(None));

        let outcome = reconciler.reconcile(&mut surface, regions(&[4, 5, 6]), &ctx(None));

        assert!(matches!(outcome, ReconcileOutcome::Rebuilt { features: 3, .. }));
        assert_eq!(reconciler.layer_for(1), None);
        assert!(reconciler.layer_for(5).is_some());
    }

    #[test]
    fn level_change_rebuilds_even_with_equal_count() {
        let mut surface = surface();
        let mut reconciler = Reconciler::new();
        reconciler.reconcile(&mut surface, regions(&[1, 2]), &ctx(None));

        let departements = StyleContext {
            level: MapLevel::Departements,
            ..ctx(None)
        };
        let outcome = reconciler.reconcile(&mut surface, regions(&[1, 2]), &departements);

        assert!(matches!(outcome, ReconcileOutcome::Rebuilt { .. }));
        assert_eq!(reconciler.rendered().unwrap().level, MapLevel::Departements);
    }

    #[test]
    fn features_without_id_are_drawn_but_not_indexed() {
        let mut surface = surface();
        let mut reconciler = Reconciler::new();
        let fc = Arc::new(collection(vec![
            square(1, "a", 10.0, 6.0, 1.0),
            json!({"type": "Feature", "geometry": {"type": "Point", "coordinates": [12.0, 6.0]}, "properties": {"nom": "Marché"}}),
        ]));

        reconciler.reconcile(&mut surface, fc.clone(), &ctx(None));
        assert_eq!(surface.len(), 2);
        assert_eq!(reconciler.rendered().unwrap().index.len(), 1);

        let outcome = reconciler.reconcile(&mut surface, fc, &ctx(Some(1)));
        assert_eq!(outcome, ReconcileOutcome::Incremental { restyled: 1 });
    }

    #[test]
    fn selecting_unknown_id_is_a_no_op() {
        let mut surface = surface();
        let mut reconciler = Reconciler::new();
        assert_eq!(reconciler.select(&mut surface, 1), SelectOutcome::NotFound);

        reconciler.reconcile(&mut surface, regions(&[1, 2, 3]), &ctx(None));
        settle(&mut surface);
        let view_before = surface.viewport().clone();
        let layers_before = surface.len();

        assert_eq!(reconciler.select(&mut surface, 42), SelectOutcome::NotFound);
        assert_eq!(surface.viewport(), &view_before);
        assert_eq!(surface.len(), layers_before);
    }

    #[test]
    fn selecting_known_id_zooms_to_that_feature() {
        let mut surface = surface();
        let mut reconciler = Reconciler::new();
        reconciler.reconcile(&mut surface, regions(&[1, 2, 3]), &ctx(None));
        settle(&mut surface);
        let group = reconciler.rendered().unwrap().group;

        assert_eq!(reconciler.select(&mut surface, 3), SelectOutcome::Zoomed);
        settle(&mut surface);

        let (lon, lat) = surface.viewport().center();
        assert!((lon - 14.0).abs() < 1e-9 && (lat - 6.0).abs() < 1e-9);
        assert!(surface.viewport().zoom() <= SELECT_MAX_ZOOM);
        assert_eq!(reconciler.rendered().unwrap().group, group);
    }

    #[test]
    fn metric_colours_unselected_features() {
        let mut surface = surface();
        let mut reconciler = Reconciler::new();
        let metric = Arc::new(Metric::from_pairs([(1, 100.0), (2, 30.0)]));
        let ctx = StyleContext {
            metric: Some(metric),
            ..ctx(Some(1))
        };

        reconciler.reconcile(&mut surface, regions(&[1, 2, 3]), &ctx);

        let style = |id| surface.layer(reconciler.layer_for(id).unwrap()).unwrap().style;
        assert_eq!(style(1).fill, GREEN_500);
        assert_eq!(style(2).fill, AMBER_400);
        assert_eq!(style(3), LayerStyle::unselected(MapLevel::Regions));
    }

    #[test]
    fn clear_removes_the_layer() {
        let mut surface = surface();
        let mut reconciler = Reconciler::new();
        reconciler.reconcile(&mut surface, regions(&[1, 2]), &ctx(None));

        reconciler.clear(&mut surface);

        assert!(reconciler.rendered().is_none());
        assert!(surface.is_empty());
        let outcome = reconciler.reconcile(&mut surface, regions(&[1, 2]), &ctx(None));
        assert!(matches!(outcome, ReconcileOutcome::Rebuilt { .. }));
    }
}
