use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{ChartError, ChartResult};

/// RGBA color in normalized 0..=1 channel values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    #[must_use]
    pub const fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    #[must_use]
    pub const fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self::rgba(red, green, blue, 1.0)
    }

    /// Color from 8-bit channels, e.g. `Color::from_rgb8(0x26, 0xa6, 0x9a)`.
    #[must_use]
    pub fn from_rgb8(red: u8, green: u8, blue: u8) -> Self {
        Self::rgb(
            f64::from(red) / 255.0,
            f64::from(green) / 255.0,
            f64::from(blue) / 255.0,
        )
    }

    #[must_use]
    pub fn with_alpha(self, alpha: f64) -> Self {
        Self { alpha, ..self }
    }

    pub fn validate(self) -> ChartResult<()> {
        for (channel, value) in [
            ("red", self.red),
            ("green", self.green),
            ("blue", self.blue),
            ("alpha", self.alpha),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ChartError::InvalidData(format!(
                    "color channel `{channel}` must be finite and in [0, 1]"
                )));
            }
        }
        Ok(())
    }
}

/// Fill paint for a closed shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FillStyle {
    pub color: Color,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

impl FillStyle {
    #[must_use]
    pub const fn solid(color: Color) -> Self {
        Self {
            color,
            alpha: 1.0,
            visible: true,
        }
    }

    #[must_use]
    pub fn with_alpha(self, alpha: f64) -> Self {
        Self { alpha, ..self }
    }

    /// Color with the style alpha folded in.
    #[must_use]
    pub fn effective_color(&self) -> Color {
        self.color.with_alpha(self.color.alpha * self.alpha)
    }

    #[must_use]
    pub fn is_paintable(&self) -> bool {
        self.visible && self.alpha > 0.0 && self.color.alpha > 0.0
    }
}

/// Stroke paint for lines and outlines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub color: Color,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default = "default_visible")]
    pub visible: bool,
    pub width: f64,
    /// Alternating on/off lengths in pixels; empty means solid.
    #[serde(default)]
    pub dash: SmallVec<[f64; 4]>,
}

impl LineStyle {
    #[must_use]
    pub fn solid(color: Color, width: f64) -> Self {
        Self {
            color,
            alpha: 1.0,
            visible: true,
            width,
            dash: SmallVec::new(),
        }
    }

    #[must_use]
    pub fn dashed(color: Color, width: f64, dash: &[f64]) -> Self {
        Self {
            dash: SmallVec::from_slice(dash),
            ..Self::solid(color, width)
        }
    }

    #[must_use]
    pub fn effective_color(&self) -> Color {
        self.color.with_alpha(self.color.alpha * self.alpha)
    }

    #[must_use]
    pub fn is_paintable(&self) -> bool {
        self.visible && self.width > 0.0 && self.alpha > 0.0 && self.color.alpha > 0.0
    }
}

/// Horizontal text alignment relative to the text origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TextHAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Font and paint for a text run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_size_px: f64,
    pub color: Color,
    #[serde(default)]
    pub h_align: TextHAlign,
}

impl TextStyle {
    #[must_use]
    pub const fn new(font_size_px: f64, color: Color, h_align: TextHAlign) -> Self {
        Self {
            font_size_px,
            color,
            h_align,
        }
    }

    /// Rough advance width used for layout and hit boxes when no font
    /// metrics are available.
    #[must_use]
    pub fn estimated_width(&self, text: &str) -> f64 {
        text.chars().count() as f64 * self.font_size_px * 0.6
    }
}

fn default_alpha() -> f64 {
    1.0
}

fn default_visible() -> bool {
    true
}
