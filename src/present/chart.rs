//! Line chart specifications, serialized in the Plotly figure format (`{"data": [...], "layout":
//! {...}}`) so the page can hand them straight to `Plotly.react`.

use crate::model::{WeeklySummary, TOTAL_STR, UNITS_SOLD_STR, WEEK_STR};
use serde::Serialize;

const TRANSPARENT: &str = "rgba(0,0,0,0)";
const GRID_COLOR: &str = "lightgrey";
const FONT_FAMILY: &str = "Arial";

/// A complete figure: one trace plus its layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    data: Vec<Trace>,
    layout: Layout,
}

impl Figure {
    /// A smoothed line with a marker at every point.
    pub fn line(title: &str, x_title: &str, y_title: &str, x: Vec<String>, y: Vec<f64>) -> Self {
        Self {
            data: vec![Trace {
                kind: "scatter",
                mode: "lines+markers",
                name: y_title.to_string(),
                x,
                y,
                line: LineStyle { shape: "spline" },
            }],
            layout: Layout {
                title: Title::new(title),
                font: Font {
                    family: FONT_FAMILY,
                },
                xaxis: Axis {
                    title: Title::new(x_title),
                    showgrid: false,
                    gridcolor: None,
                },
                yaxis: Axis {
                    title: Title::new(y_title),
                    showgrid: true,
                    gridcolor: Some(GRID_COLOR),
                },
                plot_bgcolor: TRANSPARENT,
                paper_bgcolor: TRANSPARENT,
            },
        }
    }

    /// Weekly totals in euros.
    pub fn weekly_amount(summary: &[WeeklySummary]) -> Self {
        Self::line(
            "Weekly Transaction Totals",
            WEEK_STR,
            TOTAL_STR,
            weeks(summary),
            summary.iter().map(|s| s.total_amount().to_f64()).collect(),
        )
    }

    /// Weekly unit counts.
    pub fn weekly_units(summary: &[WeeklySummary]) -> Self {
        Self::line(
            "Weekly Units Sold",
            WEEK_STR,
            UNITS_SOLD_STR,
            weeks(summary),
            summary.iter().map(|s| s.total_units() as f64).collect(),
        )
    }

    pub fn x(&self) -> &[String] {
        self.data.first().map(|t| t.x.as_slice()).unwrap_or_default()
    }

    pub fn y(&self) -> &[f64] {
        self.data.first().map(|t| t.y.as_slice()).unwrap_or_default()
    }
}

fn weeks(summary: &[WeeklySummary]) -> Vec<String> {
    summary.iter().map(|s| s.week().to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Trace {
    #[serde(rename = "type")]
    kind: &'static str,
    mode: &'static str,
    name: String,
    x: Vec<String>,
    y: Vec<f64>,
    line: LineStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct LineStyle {
    shape: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Layout {
    title: Title,
    font: Font,
    xaxis: Axis,
    yaxis: Axis,
    plot_bgcolor: &'static str,
    paper_bgcolor: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Title {
    text: String,
}

impl Title {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Font {
    family: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Axis {
    title: Title,
    showgrid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    gridcolor: Option<&'static str>,
}
