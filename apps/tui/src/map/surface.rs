use super::geojson::{Bounds, Feature, FeatureId};
use super::style::LayerStyle;
use super::viewport::FitOptions;

/// Handle to an overlay group attached to a map surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub(crate) u64);

/// Handle to one drawn feature inside a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub(crate) u64);

/// Interaction attached to a feature layer when it is created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    /// Text shown while the pointer is over the feature.
    pub tooltip: Option<String>,
    /// Feature reported when the layer is clicked.
    pub click: Option<FeatureId>,
    /// Whether hovering highlights the layer.
    pub hover: bool,
}

/// Something that can display GeoJSON features as styled layers.
pub trait MapSurface {
    fn create_group(&mut self) -> GroupId;

    /// Removes a group and every layer in it. Unknown groups are ignored.
    fn remove_group(&mut self, group: GroupId);

    fn add_feature_layer(
        &mut self,
        group: GroupId,
        feature: &Feature,
        style: LayerStyle,
        bindings: Bindings,
    ) -> LayerId;

    /// Restyles an existing layer in place. Returns `false` if the layer is
    /// gone.
    fn set_style(&mut self, layer: LayerId, style: LayerStyle) -> bool;

    /// Moves the view to show `bounds`. Returns `false` for invalid bounds.
    fn fit_bounds(&mut self, bounds: &Bounds, options: FitOptions) -> bool;
}
