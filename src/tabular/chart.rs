//! Scatter, line and bar charts over two numeric columns

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Cell, TabularDataset};
use crate::{Result, TerraGraphError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    #[default]
    Scatter,
    Line,
    Bar,
}

impl FromStr for ChartKind {
    type Err = TerraGraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "scatter" => Ok(ChartKind::Scatter),
            "line" => Ok(ChartKind::Line),
            "bar" => Ok(ChartKind::Bar),
            other => Err(TerraGraphError::dataset(format!(
                "Unknown chart type '{other}'. Choose scatter, line or bar."
            ))),
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChartKind::Scatter => "scatter",
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
        })
    }
}

/// Axes and chart type picked by the user
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRequest {
    pub kind: ChartKind,
    pub x: String,
    pub y: String,
    pub color_by: Option<String>,
}

impl ChartRequest {
    #[must_use]
    pub fn new(kind: ChartKind, x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            kind,
            x: x.into(),
            y: y.into(),
            color_by: None,
        }
    }

    /// Group points by a column. `"None"` or blank means no grouping.
    #[must_use]
    pub fn color_by(mut self, column: Option<String>) -> Self {
        self.color_by = column.filter(|c| !c.trim().is_empty() && c != "None");
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct XyPoint {
    pub x: f64,
    pub y: f64,
}

/// One colour group of a chart. Ungrouped charts have a single unnamed trace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    pub name: Option<String>,
    pub points: Vec<XyPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabularChart {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub color_by: Option<String>,
    pub traces: Vec<Trace>,
}

impl TabularChart {
    /// All points across traces
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.traces.iter().map(|t| t.points.len()).sum()
    }
}

fn numeric_column<'a>(dataset: &'a TabularDataset, name: &str) -> Result<&'a [Cell]> {
    let column = dataset
        .column(name)
        .ok_or_else(|| TerraGraphError::dataset(format!("Unknown column '{name}'")))?;
    if column.kind != super::ColumnKind::Numeric {
        return Err(TerraGraphError::dataset(format!(
            "Column '{name}' is not numeric"
        )));
    }
    Ok(&column.cells)
}

/// Build the chart; rows with a missing x or y are left out
pub fn build(dataset: &TabularDataset, request: &ChartRequest) -> Result<TabularChart> {
    let xs = numeric_column(dataset, &request.x)?;
    let ys = numeric_column(dataset, &request.y)?;
    let groups = match &request.color_by {
        Some(name) => Some(
            dataset
                .column(name)
                .ok_or_else(|| TerraGraphError::dataset(format!("Unknown column '{name}'")))?,
        ),
        None => None,
    };

    let mut traces: Vec<Trace> = Vec::new();
    for (row, (x, y)) in xs.iter().zip(ys).enumerate() {
        let (Some(x), Some(y)) = (x.as_number(), y.as_number()) else {
            continue;
        };
        let name = groups.map(|column| column.cells[row].to_string());

        match traces.iter_mut().find(|t| t.name == name) {
            Some(trace) => trace.points.push(XyPoint { x, y }),
            None => traces.push(Trace {
                name,
                points: vec![XyPoint { x, y }],
            }),
        }
    }

    let title = match request.kind {
        ChartKind::Scatter => format!("{} vs {}", request.y, request.x),
        ChartKind::Line => format!("{} over {}", request.y, request.x),
        ChartKind::Bar => format!("{} by {}", request.y, request.x),
    };

    Ok(TabularChart {
        kind: request.kind,
        title,
        x_label: request.x.clone(),
        y_label: request.y.clone(),
        color_by: request.color_by.clone(),
        traces,
    })
}
