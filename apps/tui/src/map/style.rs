use ratatui::style::Color;

use crate::domain::MapLevel;

/// Parses `#rrggbb` into a terminal colour.
pub fn hex(value: &str) -> Option<Color> {
    let digits = value.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(digits.get(range)?, 16).ok();
    Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

const fn rgb(value: u32) -> Color {
    let [_, r, g, b] = value.to_be_bytes();
    Color::Rgb(r, g, b)
}

pub const GREEN_300: Color = rgb(0x0086_efac);
pub const GREEN_500: Color = rgb(0x0022_c55e);
pub const GREEN_600: Color = rgb(0x0016_a34a);
pub const GREEN_700: Color = rgb(0x0015_803d);
pub const AMBER_400: Color = rgb(0x00fb_bf24);
pub const RED_400: Color = rgb(0x00f8_7171);

/// Per-level colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelPalette {
    pub fill: Color,
    pub border: Color,
    pub selected: Color,
}

pub const fn palette(level: MapLevel) -> LevelPalette {
    match level {
        MapLevel::Regions => LevelPalette {
            fill: GREEN_300,
            border: GREEN_600,
            selected: GREEN_500,
        },
        MapLevel::Departements => LevelPalette {
            fill: rgb(0x006e_e7b7),
            border: rgb(0x0005_9669),
            selected: rgb(0x0010_b981),
        },
        MapLevel::Communes => LevelPalette {
            fill: rgb(0x005e_ead4),
            border: rgb(0x000d_9488),
            selected: rgb(0x0014_b8a6),
        },
    }
}

/// Visual properties of one rendered feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerStyle {
    pub fill: Color,
    pub stroke: Color,
    pub weight: u8,
    pub fill_opacity: f32,
}

impl LayerStyle {
    pub fn selected(level: MapLevel) -> Self {
        Self {
            fill: palette(level).selected,
            stroke: GREEN_700,
            weight: 3,
            fill_opacity: 0.7,
        }
    }

    pub fn unselected(level: MapLevel) -> Self {
        let palette = palette(level);
        Self {
            fill: palette.fill,
            stroke: palette.border,
            weight: 1,
            fill_opacity: 0.5,
        }
    }

    /// Highlight applied while the pointer is over a feature. Never weakens
    /// an already stronger style.
    #[must_use]
    pub fn hovered(self) -> Self {
        Self {
            weight: self.weight.max(2),
            fill_opacity: self.fill_opacity.max(0.7),
            ..self
        }
    }

    /// Emphasis for the focused entity on the detail map.
    pub const fn detail_target() -> Self {
        Self {
            fill: GREEN_500,
            stroke: GREEN_700,
            weight: 4,
            fill_opacity: 0.6,
        }
    }

    /// Faded context around the detail target.
    pub const fn detail_context() -> Self {
        Self {
            fill: GREEN_300,
            stroke: GREEN_600,
            weight: 1,
            fill_opacity: 0.2,
        }
    }

    #[must_use]
    pub const fn with_fill(self, fill: Color) -> Self {
        Self { fill, ..self }
    }
}

/// Choropleth bucket for `value` relative to `max`.
pub fn color_by_value(value: f64, max: f64) -> Color {
    if max <= 0.0 || !value.is_finite() {
        return RED_400;
    }
    let percentage = value / max * 100.0;
    if percentage >= 75.0 {
        GREEN_500
    } else if percentage >= 50.0 {
        GREEN_300
    } else if percentage >= 25.0 {
        AMBER_400
    } else {
        RED_400
    }
}

/// Legend entries for the choropleth buckets, highest first.
pub const LEGEND: [(&str, Color); 4] = [
    ("≥ 75 %", GREEN_500),
    ("≥ 50 %", GREEN_300),
    ("≥ 25 %", AMBER_400),
    ("< 25 %", RED_400),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parses_rgb() {
        assert_eq!(hex("#22c55e"), Some(Color::Rgb(0x22, 0xc5, 0x5e)));
        assert_eq!(hex("#22c55e"), Some(GREEN_500));
        assert_eq!(hex("22c55e"), None);
        assert_eq!(hex("#22c5"), None);
        assert_eq!(hex("#zzzzzz"), None);
    }

    #[test]
    fn selected_and_unselected_differ_in_weight_and_opacity() {
        let selected = LayerStyle::selected(MapLevel::Regions);
        let unselected = LayerStyle::unselected(MapLevel::Regions);

        assert_eq!(selected.fill, GREEN_500);
        assert_eq!(selected.weight, 3);
        assert!((selected.fill_opacity - 0.7).abs() < f32::EPSILON);
        assert_eq!(unselected.fill, GREEN_300);
        assert_eq!(unselected.stroke, GREEN_600);
        assert_eq!(unselected.weight, 1);
    }

    #[test]
    fn hover_only_bumps_weight_and_opacity() {
        let base = LayerStyle::unselected(MapLevel::Communes);
        let hovered = base.hovered();
        assert_eq!(hovered.fill, base.fill);
        assert_eq!(hovered.weight, 2);
        assert!((hovered.fill_opacity - 0.7).abs() < f32::EPSILON);

        let selected = LayerStyle::selected(MapLevel::Communes).hovered();
        assert_eq!(selected.weight, 3);
    }

    #[test]
    fn choropleth_buckets() {
        assert_eq!(color_by_value(80.0, 100.0), GREEN_500);
        assert_eq!(color_by_value(75.0, 100.0), GREEN_500);
        assert_eq!(color_by_value(60.0, 100.0), GREEN_300);
        assert_eq!(color_by_value(30.0, 100.0), AMBER_400);
        assert_eq!(color_by_value(10.0, 100.0), RED_400);
        assert_eq!(color_by_value(10.0, 0.0), RED_400);
    }
}
