//! Chart definition types
//!
//! Field names follow Chart.js configuration keys so a validated spec can be
//! handed to the browser library unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::schema::is_hex_colour;

/// Supported chart types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartType {
    Line,
    Bar,
    Doughnut,
    Bubble,
    Pie,
    PolarArea,
    Radar,
    Scatter,
}

impl ChartType {
    /// Every supported chart type, in schema order
    pub const ALL: [ChartType; 8] = [
        ChartType::Line,
        ChartType::Bar,
        ChartType::Doughnut,
        ChartType::Bubble,
        ChartType::Pie,
        ChartType::PolarArea,
        ChartType::Radar,
        ChartType::Scatter,
    ];

    /// Chart.js type name
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Line => "line",
            ChartType::Bar => "bar",
            ChartType::Doughnut => "doughnut",
            ChartType::Bubble => "bubble",
            ChartType::Pie => "pie",
            ChartType::PolarArea => "polarArea",
            ChartType::Radar => "radar",
            ChartType::Scatter => "scatter",
        }
    }

    /// Types whose datasets hold `{x, y}` points rather than one value per label
    pub fn needs_point_data(&self) -> bool {
        matches!(self, ChartType::Scatter | ChartType::Bubble)
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ChartType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown chart type '{}'", s))
    }
}

/// A validated chart definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    pub chart_type: ChartType,
    pub height: u32,
    pub width: u32,
    pub background_colour: String,
    pub data: ChartData,
    pub options: ChartOptions,
}

impl ChartSpec {
    /// Rendering configuration (`{type, data, options}`) for this spec
    pub fn configuration(&self) -> ChartConfiguration {
        ChartConfiguration {
            chart_type: self.chart_type,
            data: self.data.clone(),
            options: self.options.clone(),
        }
    }

    /// Canvas the configuration is drawn on
    pub fn canvas(&self) -> CanvasOptions {
        CanvasOptions {
            width: self.width,
            height: self.height,
            background_colour: self.background_colour.clone(),
        }
    }

    /// Check the invariants every renderable spec holds, whatever schema produced it
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!(
                "canvas must be positive, got {}x{}",
                self.width, self.height
            ));
        }

        if !is_hex_colour(&self.background_colour) {
            return Err(format!(
                "backgroundColour '{}' is not a hex colour",
                self.background_colour
            ));
        }

        let labels = self.data.labels.len();
        for (i, dataset) in self.data.datasets.iter().enumerate() {
            if dataset.data.len() != labels {
                return Err(format!(
                    "dataset {} has {} values for {} labels",
                    i,
                    dataset.data.len(),
                    labels
                ));
            }

            let mut colours =
                std::iter::once(&dataset.border_color).chain(&dataset.background_color);
            if let Some(bad) = colours.find(|c| !is_hex_colour(c)) {
                return Err(format!("dataset {} colour '{}' is not a hex colour", i, bad));
            }
        }

        Ok(())
    }
}

/// Labels and datasets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

/// A single series of values, one per label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
    pub border_color: String,
    pub background_color: Vec<String>,
    pub border_width: f64,
    pub border_radius: f64,
    pub border_skipped: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOptions {
    pub index_axis: IndexAxis,
    pub plugins: Plugins,
    pub scales: Scales,
}

/// Category axis: `x` draws vertical charts, `y` horizontal ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexAxis {
    #[default]
    X,
    Y,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Plugins {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Legend {
    pub position: LegendPosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendPosition {
    Top,
    Bottom,
    Right,
    Left,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Title {
    pub display: bool,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Scales {
    pub x: AxisScale,
    pub y: AxisScale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AxisScale {
    pub stacked: bool,
}

/// Chart.js configuration object shared by the renderer and the HTML snippet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartConfiguration {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub data: ChartData,
    pub options: ChartOptions,
}

/// Offscreen canvas dimensions and fill
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanvasOptions {
    pub width: u32,
    pub height: u32,
    pub background_colour: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_type_names_round_trip() {
        for chart_type in ChartType::ALL {
            let json = serde_json::to_value(chart_type).unwrap();
            assert_eq!(json, serde_json::json!(chart_type.as_str()));
            assert_eq!(chart_type.as_str().parse::<ChartType>().unwrap(), chart_type);
        }
        assert!("area".parse::<ChartType>().is_err());
    }

    #[test]
    fn test_configuration_uses_type_key() {
        let spec = ChartSpec {
            chart_type: ChartType::PolarArea,
            height: 300,
            width: 500,
            background_colour: "#FFFFFF".to_string(),
            data: ChartData {
                labels: vec!["a".to_string()],
                datasets: vec![],
            },
            options: ChartOptions {
                index_axis: IndexAxis::X,
                plugins: Plugins::default(),
                scales: Scales::default(),
            },
        };

        let json = serde_json::to_value(spec.configuration()).unwrap();
        assert_eq!(json["type"], "polarArea");
        assert_eq!(json["options"]["indexAxis"], "x");
        assert!(json["options"]["plugins"].get("title").is_none());
        assert_eq!(spec.canvas().width, 500);
    }
}
