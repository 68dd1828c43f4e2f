//! Map window in longitude/latitude space.
//!
//! The zoom scale follows the slippy-map convention (each level halves the
//! visible span). The viewport knows the canvas size in terminal cells so it
//! can keep the projection square and convert padding given in pixels.

use std::time::Duration;

use super::geojson::{Bounds, Position};

pub const DEFAULT_CENTER: Position = (12.3547, 7.3697);
pub const DEFAULT_ZOOM: f64 = 6.0;
pub const MIN_ZOOM: f64 = 5.0;
pub const MAX_ZOOM: f64 = 18.0;

/// Visible longitude span at zoom 0.
const BASE_SPAN: f64 = 1024.0;
/// Nominal pixel size of one terminal cell, used to convert padding.
const CELL_WIDTH_PX: f64 = 8.0;
const CELL_HEIGHT_PX: f64 = 16.0;
const MAX_FRAME_DELTA: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Padding on every side, in pixels.
    pub padding: f64,
    pub max_zoom: Option<f64>,
    pub animate: bool,
    pub duration: Duration,
}

impl FitOptions {
    pub const fn instant(padding: f64) -> Self {
        Self {
            padding,
            max_zoom: None,
            animate: false,
            duration: Duration::ZERO,
        }
    }

    pub const fn animated(padding: f64, duration: Duration) -> Self {
        Self {
            padding,
            max_zoom: None,
            animate: true,
            duration,
        }
    }

    #[must_use]
    pub const fn max_zoom(self, zoom: f64) -> Self {
        Self {
            max_zoom: Some(zoom),
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Transition {
    from_center: Position,
    from_zoom: f64,
    to_center: Position,
    to_zoom: f64,
    elapsed: f64,
    duration: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    center: Position,
    zoom: f64,
    cols: u16,
    rows: u16,
    transition: Option<Transition>,
    last_tick: Option<f64>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            cols: 80,
            rows: 24,
            transition: None,
            last_tick: None,
        }
    }
}

impl Viewport {
    pub const fn center(&self) -> Position {
        self.center
    }

    pub const fn zoom(&self) -> f64 {
        self.zoom
    }

    pub const fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    /// Records the canvas size in cells. Zero sizes are ignored.
    pub fn set_size(&mut self, cols: u16, rows: u16) {
        if cols > 0 && rows > 0 {
            self.cols = cols;
            self.rows = rows;
        }
    }

    fn aspect(&self) -> f64 {
        // Rows are twice as tall as columns are wide.
        f64::from(self.rows) * 2.0 / f64::from(self.cols)
    }

    fn span_at(&self, zoom: f64) -> (f64, f64) {
        let lon_span = BASE_SPAN / zoom.exp2();
        (lon_span, lon_span * self.aspect())
    }

    /// Visible `[lon, lat]` window.
    pub fn bounds(&self) -> Bounds {
        let (w, h) = self.span_at(self.zoom);
        let (lon, lat) = self.center;
        Bounds::new(lon - w / 2.0, lat - h / 2.0, lon + w / 2.0, lat + h / 2.0)
    }

    pub fn x_bounds(&self) -> [f64; 2] {
        let b = self.bounds();
        [b.min_lon, b.max_lon]
    }

    pub fn y_bounds(&self) -> [f64; 2] {
        let b = self.bounds();
        [b.min_lat, b.max_lat]
    }

    /// Map position under terminal cell `(col, row)` relative to the canvas.
    pub fn cell_to_position(&self, col: u16, row: u16) -> Position {
        let b = self.bounds();
        let fx = (f64::from(col) + 0.5) / f64::from(self.cols);
        let fy = (f64::from(row) + 0.5) / f64::from(self.rows);
        (
            fx.mul_add(b.width(), b.min_lon),
            (-fy).mul_add(b.height(), b.max_lat),
        )
    }

    /// Size of one cell in degrees, used as hit-test tolerance.
    pub fn cell_span(&self) -> f64 {
        self.bounds().width() / f64::from(self.cols)
    }

    pub fn set_view(&mut self, center: Position, zoom: f64) {
        self.transition = None;
        self.center = center;
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn zoom_by(&mut self, delta: f64) {
        self.set_view(self.center, self.zoom + delta);
    }

    /// Moves the centre by a fraction of the visible window.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let b = self.bounds();
        let (lon, lat) = self.center;
        self.set_view(
            (dx.mul_add(b.width(), lon), dy.mul_add(b.height(), lat)),
            self.zoom,
        );
    }

    pub fn reset(&mut self) {
        self.set_view(DEFAULT_CENTER, DEFAULT_ZOOM);
    }

    /// Zoom level at which `bounds` fits inside the padded canvas, snapped
    /// down to a whole level.
    pub fn zoom_for(&self, bounds: &Bounds, options: &FitOptions) -> f64 {
        let width_px = f64::from(self.cols) * CELL_WIDTH_PX;
        let height_px = f64::from(self.rows) * CELL_HEIGHT_PX;
        let usable_x = ((width_px - 2.0 * options.padding) / width_px).max(0.05);
        let usable_y = ((height_px - 2.0 * options.padding) / height_px).max(0.05);

        let upper = options.max_zoom.unwrap_or(MAX_ZOOM).min(MAX_ZOOM);
        let zoom_x = if bounds.width() > 0.0 {
            (BASE_SPAN * usable_x / bounds.width()).log2()
        } else {
            upper
        };
        let zoom_y = if bounds.height() > 0.0 {
            (BASE_SPAN * self.aspect() * usable_y / bounds.height()).log2()
        } else {
            upper
        };

        zoom_x.min(zoom_y).floor().clamp(MIN_ZOOM, upper.max(MIN_ZOOM))
    }

    /// Centres on `bounds` at the largest zoom that shows all of it.
    /// Invalid bounds leave the view untouched and return `false`.
    pub fn fit_bounds(&mut self, bounds: &Bounds, options: FitOptions) -> bool {
        if !bounds.is_valid() {
            return false;
        }

        let to_zoom = self.zoom_for(bounds, &options);
        let to_center = bounds.center();

        if options.animate && !options.duration.is_zero() {
            self.transition = Some(Transition {
                from_center: self.center,
                from_zoom: self.zoom,
                to_center,
                to_zoom,
                elapsed: 0.0,
                duration: options.duration.as_secs_f64(),
            });
            self.last_tick = None;
        } else {
            self.set_view(to_center, to_zoom);
        }
        true
    }

    /// Advances any running transition to `now_seconds`. Frame gaps are
    /// clamped so a stalled UI does not jump straight to the end.
    pub fn advance(&mut self, now_seconds: f64) {
        let delta = self
            .last_tick
            .map_or(0.0, |last| (now_seconds - last).clamp(0.0, MAX_FRAME_DELTA));
        self.last_tick = Some(now_seconds);

        let Some(mut transition) = self.transition else {
            return;
        };

        transition.elapsed += delta;
        let t = transition.elapsed / transition.duration;
        if t >= 1.0 {
            self.center = transition.to_center;
            self.zoom = transition.to_zoom;
            self.transition = None;
            return;
        }

        let eased = ease_out_quad(t);
        self.center = (
            lerp(transition.from_center.0, transition.to_center.0, eased),
            lerp(transition.from_center.1, transition.to_center.1, eased),
        );
        self.zoom = lerp(transition.from_zoom, transition.to_zoom, eased);
        self.transition = Some(transition);
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    (b - a).mul_add(t, a)
}

fn ease_out_quad(t: f64) -> f64 {
    1.0 - (1.0 - t) * (1.0 - t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        let diff = (actual - expected).abs();
        assert!(diff < 1e-9, "expected {expected}, got {actual}, diff {diff}");
    }

    fn viewport() -> Viewport {
        let mut viewport = Viewport::default();
        viewport.set_size(100, 50);
        viewport
    }

    #[test]
    fn zoom_is_clamped_to_limits() {
        let mut v = viewport();
        v.set_view(DEFAULT_CENTER, 2.0);
        assert_close(v.zoom(), MIN_ZOOM);
        v.zoom_by(40.0);
        assert_close(v.zoom(), MAX_ZOOM);
    }

    #[test]
    fn fit_centres_and_shows_whole_bounds() {
        let mut v = viewport();
        let bounds = Bounds::new(9.0, 2.0, 16.0, 13.0);

        assert!(v.fit_bounds(&bounds, FitOptions::instant(50.0)));

        assert_eq!(v.center(), (12.5, 7.5));
        let visible = v.bounds();
        assert!(visible.min_lon <= 9.0 && visible.max_lon >= 16.0);
        assert!(visible.min_lat <= 2.0 && visible.max_lat >= 13.0);
    }

    #[test]
    fn fit_respects_max_zoom() {
        let mut v = viewport();
        let tiny = Bounds::new(11.50, 3.80, 11.51, 3.81);

        v.fit_bounds(&tiny, FitOptions::instant(100.0).max_zoom(10.0));
        assert_close(v.zoom(), 10.0);

        let point = Bounds::new(11.5, 3.8, 11.5, 3.8);
        v.fit_bounds(&point, FitOptions::instant(0.0));
        assert_close(v.zoom(), MAX_ZOOM);
    }

    #[test]
    fn invalid_bounds_are_ignored() {
        let mut v = viewport();
        let before = v.clone();
        assert!(!v.fit_bounds(&Bounds::EMPTY, FitOptions::instant(50.0)));
        assert_eq!(v, before);
    }

    #[test]
    fn animated_fit_reaches_target_after_duration() {
        let mut v = viewport();
        let bounds = Bounds::new(13.0, 3.0, 14.0, 4.0);
        v.fit_bounds(
            &bounds,
            FitOptions::animated(100.0, Duration::from_millis(500)).max_zoom(10.0),
        );
        assert!(v.is_animating());
        assert_eq!(v.center(), DEFAULT_CENTER);

        v.advance(1.0);
        assert_eq!(v.center(), DEFAULT_CENTER);

        v.advance(1.2);
        assert!(v.is_animating());
        assert!(v.center().0 > DEFAULT_CENTER.0);

        v.advance(1.4);
        v.advance(1.6);
        assert!(!v.is_animating());
        assert_eq!(v.center(), (13.5, 3.5));
    }

    #[test]
    fn large_frame_gap_is_clamped() {
        let mut v = viewport();
        v.fit_bounds(
            &Bounds::new(13.0, 3.0, 14.0, 4.0),
            FitOptions::animated(0.0, Duration::from_secs(1)),
        );
        v.advance(0.0);
        v.advance(30.0);
        assert!(v.is_animating());
    }

    #[test]
    fn cell_to_position_maps_corners() {
        let mut v = viewport();
        v.set_view((10.0, 5.0), 8.0);
        let b = v.bounds();

        let (lon, lat) = v.cell_to_position(0, 0);
        assert!(lon > b.min_lon && lon < b.min_lon + v.cell_span());
        assert!(lat < b.max_lat);

        let (lon, _) = v.cell_to_position(99, 49);
        assert!(lon < b.max_lon);
    }
}
