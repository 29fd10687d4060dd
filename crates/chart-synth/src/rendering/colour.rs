//! Hex colour parsing for the raster backend

use plotters::style::{RGBAColor, ShapeStyle};

/// Colours cycled through when a dataset has no `backgroundColor`
pub const PALETTE: [&str; 7] = [
    "#36A2EB", "#FF6384", "#4BC0C0", "#FF9F40", "#9966FF", "#FFCD56", "#C9CBCF",
];

/// An 8-bit RGB colour with alpha in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::opaque(255, 255, 255);
    pub const TEXT: Rgba = Rgba::opaque(0x66, 0x66, 0x66);
    pub const GRID: Rgba = Rgba::opaque(0xE5, 0xE5, 0xE5);
    pub const AXIS: Rgba = Rgba::opaque(0xB0, 0xB0, 0xB0);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parse `#RGB`, `#RGBA`, `#RRGGBB` or `#RRGGBBAA`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        let expanded: String = match digits.len() {
            3 | 4 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 | 8 => digits.to_string(),
            _ => return None,
        };

        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
        let alpha = if expanded.len() == 8 {
            f64::from(channel(6)?) / 255.0
        } else {
            1.0
        };

        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a: alpha,
        })
    }

    /// Same colour with its alpha scaled by `factor`
    pub fn fade(self, factor: f64) -> Self {
        Self {
            a: (self.a * factor).clamp(0.0, 1.0),
            ..self
        }
    }

    pub fn to_plotters(self) -> RGBAColor {
        RGBAColor(self.r, self.g, self.b, self.a)
    }

    pub fn fill(self) -> ShapeStyle {
        ShapeStyle {
            color: self.to_plotters(),
            filled: true,
            stroke_width: 1,
        }
    }

    pub fn stroke(self, width: u32) -> ShapeStyle {
        ShapeStyle {
            color: self.to_plotters(),
            filled: false,
            stroke_width: width,
        }
    }
}

/// Entry `index` of a colour list, cycling; falls back to the palette when empty
pub fn cycle(colours: &[String], index: usize) -> Rgba {
    let hex = if colours.is_empty() {
        PALETTE[index % PALETTE.len()]
    } else {
        colours[index % colours.len()].as_str()
    };
    Rgba::from_hex(hex).unwrap_or(Rgba::TEXT)
}
