//! A canvas surface plus the reconciler that keeps it in sync with the
//! current GeoJSON, selection and choropleth metric.

use std::sync::Arc;

use crate::domain::MapLevel;
use crate::map::{
    CanvasSurface, FeatureCollection, FeatureId, LayerStyle, MapSurface, Metric, ReconcileOutcome,
    Reconciler, SelectOutcome, StyleContext,
};

#[derive(Debug, Default)]
pub struct MapPanel {
    pub surface: CanvasSurface,
    reconciler: Reconciler,
    collection: Option<Arc<FeatureCollection>>,
    ctx: StyleContext,
}

impl MapPanel {
    pub fn new(level: MapLevel) -> Self {
        Self {
            ctx: StyleContext {
                level,
                ..StyleContext::default()
            },
            ..Self::default()
        }
    }

    pub const fn level(&self) -> MapLevel {
        self.ctx.level
    }

    pub const fn selected(&self) -> Option<FeatureId> {
        self.ctx.selected
    }

    pub fn metric(&self) -> Option<&Metric> {
        self.ctx.metric.as_deref()
    }

    pub fn collection(&self) -> Option<&FeatureCollection> {
        self.collection.as_deref()
    }

    /// Number of features on screen.
    pub fn feature_count(&self) -> usize {
        self.collection.as_ref().map_or(0, |c| c.len())
    }

    /// Ids in collection order, for keyboard cycling.
    pub fn feature_ids(&self) -> Vec<FeatureId> {
        self.collection
            .as_ref()
            .map(|c| c.features.iter().filter_map(|f| f.id()).collect())
            .unwrap_or_default()
    }

    /// Drops the rendered layer and the selection ahead of a level change.
    pub fn switch_level(&mut self, level: MapLevel) {
        self.reconciler.clear(&mut self.surface);
        self.collection = None;
        self.ctx = StyleContext {
            level,
            selected: None,
            metric: None,
        };
    }

    pub fn show(&mut self, collection: FeatureCollection) -> ReconcileOutcome {
        let collection = Arc::new(collection);
        self.collection = Some(Arc::clone(&collection));
        self.reconciler
            .reconcile(&mut self.surface, collection, &self.ctx)
    }

    fn restyle(&mut self) -> Option<ReconcileOutcome> {
        let collection = Arc::clone(self.collection.as_ref()?);
        Some(
            self.reconciler
                .reconcile(&mut self.surface, collection, &self.ctx),
        )
    }

    pub fn set_metric(&mut self, metric: Option<Metric>) -> Option<ReconcileOutcome> {
        self.ctx.metric = metric.map(Arc::new);
        self.restyle()
    }

    /// Marks `id` selected and zooms to it. Unknown ids change nothing.
    pub fn select(&mut self, id: FeatureId) -> SelectOutcome {
        if self.reconciler.layer_for(id).is_none() {
            return SelectOutcome::NotFound;
        }
        self.ctx.selected = Some(id);
        self.restyle();
        self.reconciler.select(&mut self.surface, id)
    }

    pub fn clear_selection(&mut self) {
        if self.ctx.selected.take().is_some() {
            self.restyle();
        }
    }

    /// Detail map variant: every feature faded, `target` emphasised and
    /// zoomed to.
    pub fn show_detail(&mut self, collection: FeatureCollection, target: FeatureId) -> SelectOutcome {
        self.ctx.selected = None;
        self.ctx.metric = None;
        self.show(collection);

        let Some(rendered) = self.reconciler.rendered() else {
            return SelectOutcome::NotFound;
        };
        let layers: Vec<_> = rendered.index.iter().map(|(id, layer)| (*id, *layer)).collect();
        for (id, layer) in layers {
            let style = if id == target {
                LayerStyle::detail_target()
            } else {
                LayerStyle::detail_context()
            };
            self.surface.set_style(layer, style);
        }
        self.reconciler.select(&mut self.surface, target)
    }

    /// Pans by a fraction of the visible window.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.surface.viewport_mut().pan(dx, dy);
    }

    pub fn zoom_by(&mut self, delta: f64) {
        self.surface.viewport_mut().zoom_by(delta);
    }

    pub fn reset_view(&mut self) {
        self.surface.viewport_mut().reset();
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.surface.resize(cols, rows);
    }

    pub fn tick(&mut self, now_seconds: f64) {
        self.surface.advance(now_seconds);
        self.surface.refresh_raster();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::geojson::tests::{collection, square};

    fn three() -> FeatureCollection {
        collection(vec![
            square(1, "Adamaoua", 13.5, 7.0, 1.0),
            square(2, "Centre", 11.5, 4.5, 1.0),
            square(3, "Est", 14.5, 4.0, 1.0),
        ])
    }

    #[test]
    fn select_restyles_in_place() {
        let mut panel = MapPanel::new(MapLevel::Regions);
        panel.resize(80, 40);
        assert!(matches!(panel.show(three()), ReconcileOutcome::Rebuilt { .. }));
        let before = panel.surface.len();

        assert_eq!(panel.select(2), SelectOutcome::Zoomed);
        assert_eq!(panel.selected(), Some(2));
        assert_eq!(panel.surface.len(), before);
        assert_eq!(panel.feature_ids(), vec![1, 2, 3]);
    }

    #[test]
    fn select_unknown_id_is_a_no_op() {
        let mut panel = MapPanel::new(MapLevel::Regions);
        panel.show(three());
        let center = panel.surface.viewport().center();

        assert_eq!(panel.select(99), SelectOutcome::NotFound);
        assert_eq!(panel.selected(), None);
        assert_eq!(panel.surface.viewport().center(), center);
    }

    #[test]
    fn metric_change_is_incremental() {
        let mut panel = MapPanel::new(MapLevel::Regions);
        panel.show(three());

        let outcome = panel.set_metric(Some(Metric::from_pairs([(1, 10.0), (2, 40.0)])));
        assert_eq!(outcome, Some(ReconcileOutcome::Incremental { restyled: 3 }));
        assert!(panel.metric().is_some());
    }

    #[test]
    fn switch_level_clears_layer_and_selection() {
        let mut panel = MapPanel::new(MapLevel::Regions);
        panel.show(three());
        panel.select(1);

        panel.switch_level(MapLevel::Communes);
        assert_eq!(panel.level(), MapLevel::Communes);
        assert_eq!(panel.selected(), None);
        assert_eq!(panel.feature_count(), 0);
        assert!(panel.surface.is_empty());
    }

    #[test]
    fn detail_map_emphasises_target() {
        let mut panel = MapPanel::new(MapLevel::Departements);
        panel.resize(60, 30);

        assert_eq!(panel.show_detail(three(), 3), SelectOutcome::Zoomed);
        let styles: Vec<_> = panel.surface.layers().map(|l| (l.bindings.click, l.style)).collect();
        for (id, style) in styles {
            if id == Some(3) {
                assert_eq!(style, LayerStyle::detail_target());
            } else {
                assert_eq!(style, LayerStyle::detail_context());
            }
        }
    }
}
