//! Simulation panel: one slider per influential variable.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::table::Table;

pub const SLIDER_STEP: f64 = 0.1;

/// min / mean / max of one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnStats {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

impl ColumnStats {
    pub fn of(values: &[f64]) -> Option<Self> {
        let first = *values.first()?;
        let (min, max) = values
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Some(Self { min, mean, max })
    }
}

/// Slider bounds derived from column statistics, widened by 10% of the spread.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliderSpec {
    pub title: String,
    pub start: f64,
    pub end: f64,
    pub value: f64,
    pub step: f64,
}

impl SliderSpec {
    pub fn from_stats(title: impl Into<String>, stats: ColumnStats) -> Self {
        let delta = (stats.max - stats.min) * 0.1;
        Self {
            title: title.into(),
            start: (stats.min - delta).max(0.0),
            end: stats.max + delta,
            value: stats.mean,
            step: SLIDER_STEP,
        }
    }
}

/// A slider paired with its text box; either side updates the other.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliderRow {
    pub spec: SliderSpec,
    pub value: f64,
    pub text: String,
}

impl SliderRow {
    pub fn new(spec: SliderSpec) -> Self {
        let value = spec.value;
        Self {
            spec,
            value,
            text: format_value(value),
        }
    }

    pub fn set_value(&mut self, value: f64) {
        self.value = value;
        self.text = format_value(value);
    }

    /// Apply text typed by the user. Unparseable text keeps the previous value.
    pub fn set_text(&mut self, text: &str) {
        match text.trim().parse::<f64>() {
            Ok(value) => {
                self.value = value;
                self.text = text.to_string();
            }
            Err(_) => {
                warn!("ignoring non-numeric input '{}' for {}", text, self.spec.title);
                self.text = format_value(self.value);
            }
        }
    }
}

fn format_value(value: f64) -> String {
    format!("{value:.2}")
}

/// Request body sent to the simulation process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationRequest {
    #[serde(rename = "Modelo")]
    pub target: String,
    #[serde(rename = "Variables_influyentes")]
    pub variables: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationPanel {
    pub target: String,
    pub rows: Vec<SliderRow>,
}

impl SimulationPanel {
    /// Sliders for each influential attribute, with statistics taken from the
    /// per-timestamp prediction table.
    pub fn from_table(target: &str, attributes: &[String], table: &Table) -> DomainResult<Self> {
        let rows = attributes
            .iter()
            .map(|attribute| {
                let values = table.numbers(attribute)?;
                let stats = ColumnStats::of(&values)
                    .ok_or_else(|| DomainError::EmptyTable(table.name.clone()))?;
                Ok(SliderRow::new(SliderSpec::from_stats(attribute.clone(), stats)))
            })
            .collect::<DomainResult<Vec<_>>>()?;
        Ok(Self {
            target: target.to_string(),
            rows,
        })
    }

    pub fn row_mut(&mut self, title: &str) -> Option<&mut SliderRow> {
        self.rows.iter_mut().find(|r| r.spec.title == title)
    }

    /// Collect every slider value, rounded to two decimals.
    pub fn simulate(&self) -> SimulationRequest {
        let variables = self
            .rows
            .iter()
            .map(|r| {
                let rounded = (r.value * 100.0).round() / 100.0;
                (r.spec.title.clone(), Value::from(rounded))
            })
            .collect();
        SimulationRequest {
            target: self.target.clone(),
            variables,
        }
    }
}
