pub mod canvas;
pub mod geojson;
pub mod reconciler;
pub mod style;
pub mod surface;
pub mod viewport;

pub use canvas::CanvasSurface;
pub use geojson::{Bounds, Feature, FeatureCollection, FeatureId, Geometry};
pub use reconciler::{Metric, ReconcileOutcome, Reconciler, SelectOutcome, StyleContext};
pub use style::LayerStyle;
pub use surface::{Bindings, GroupId, LayerId, MapSurface};
pub use viewport::{FitOptions, Viewport};
