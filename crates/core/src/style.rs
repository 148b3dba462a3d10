use std::str::FromStr;

use palette::{Srgb, Srgba, WithAlpha};
use walkshed_transit::LineColor;

/// Outline drawn around an overlay or marker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Border {
    pub color: Srgba<f32>,
    pub width_px: f32,
    /// Dash and gap lengths in pixels; `None` draws a solid line.
    pub dash: Option<(f32, f32)>,
}

impl Border {
    pub fn none() -> Self {
        Self {
            color: Srgba::new(0.0, 0.0, 0.0, 0.0),
            width_px: 0.0,
            dash: None,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.width_px > 0.0 && self.color.alpha > 0.0
    }
}

/// Style of one catchment overlay.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerStyle {
    pub border: Border,
    pub fill: Srgba<f32>,
}

impl LayerStyle {
    pub fn solid_color(fill: Srgba<f32>) -> Self {
        Self {
            border: Border::none(),
            fill,
        }
    }

    pub fn with_border(mut self, width_px: f32, color: Srgba<f32>) -> Self {
        self.border.color = color;
        self.border.width_px = width_px;
        self
    }

    pub fn dashed(mut self, dash: f32, gap: f32) -> Self {
        self.border.dash = Some((dash, gap));
        self
    }

    /// Style by position in the sorted draw order, not by minute value.
    ///
    /// Rank 0 is the widest ring: faint fill with a dashed outline. Rank 1 is
    /// a medium fill and anything deeper uses the dense core fill.
    pub fn for_rank(rank: usize) -> Self {
        match rank {
            0 => LayerStyle::solid_color(rgba(0x63, 0x66, 0xf1, 0.15))
                .with_border(1.0, rgba(0x81, 0x8c, 0xf8, 1.0))
                .dashed(4.0, 4.0),
            1 => LayerStyle::solid_color(rgba(0x4f, 0x46, 0xe5, 0.20)),
            _ => LayerStyle::solid_color(rgba(0x31, 0x2e, 0x81, 0.25)),
        }
    }
}

/// Style of a station marker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerStyle {
    pub radius_px: f32,
    pub fill: Srgba<f32>,
    pub border: Border,
}

impl MarkerStyle {
    pub fn unselected(line: LineColor) -> Self {
        Self {
            radius_px: 6.0,
            fill: line_fill(line),
            border: Border {
                color: rgba(0xff, 0xff, 0xff, 1.0),
                width_px: 2.0,
                dash: None,
            },
        }
    }

    pub fn selected(line: LineColor) -> Self {
        Self {
            radius_px: 9.0,
            fill: line_fill(line),
            border: Border {
                color: rgba(0x4f, 0x46, 0xe5, 1.0),
                width_px: 4.0,
                dash: None,
            },
        }
    }

    pub fn for_selection(line: LineColor, selected: bool) -> Self {
        if selected {
            Self::selected(line)
        } else {
            Self::unselected(line)
        }
    }
}

fn rgba(red: u8, green: u8, blue: u8, alpha: f32) -> Srgba<f32> {
    Srgb::<u8>::new(red, green, blue)
        .into_format::<f32>()
        .with_alpha(alpha)
}

fn line_fill(line: LineColor) -> Srgba<f32> {
    match Srgb::<u8>::from_str(line.hex()) {
        Ok(color) => color.into_format::<f32>().with_alpha(0.9),
        Err(error) => {
            tracing::warn!("unparseable line color {}: {error}", line.hex());
            rgba(0x80, 0x80, 0x80, 0.9)
        }
    }
}

/// `#rrggbb` form of a color, alpha dropped.
pub fn hex(color: Srgba<f32>) -> String {
    let rgb: Srgb<u8> = color.color.into_format();
    format!("#{:02x}{:02x}{:02x}", rgb.red, rgb.green, rgb.blue)
}
