//! Confusion table reshaping, heat-map cells and the corrects bar chart.

use serde::Serialize;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::palette::{bar_color, HEAT_COLORS};
use crate::domain::table::Table;

const PREDICTED_COLUMN: &str = "predicted";
const PREDICTED_PREFIX: &str = "pred ";
const ACTUAL_PREFIX: &str = "true ";

/// Default bar width of the corrects chart.
pub const CORRECTS_BAR_WIDTH: f64 = 0.1;

/// Confusion matrix with rows = actual labels and columns = predicted labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfusionMatrix {
    pub actual: Vec<String>,
    pub predicted: Vec<String>,
    /// `counts[a][p]`: rows predicted as `predicted[p]` whose truth is `actual[a]`
    pub counts: Vec<Vec<f64>>,
}

/// One heat-map square.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatCell {
    pub actual: String,
    pub prediction: String,
    pub value: f64,
    pub color: &'static str,
}

/// One bar series of the corrects chart (one per predicted label).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrectsSeries {
    pub prediction: String,
    pub color: &'static str,
    /// Dodge offset from each actual-label category center
    pub offset: f64,
    /// Bar heights, parallel to `CorrectsChart::categories`
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrectsChart {
    pub categories: Vec<String>,
    pub bar_width: f64,
    pub series: Vec<CorrectsSeries>,
}

impl ConfusionMatrix {
    /// Reshape the service's confusion records.
    ///
    /// Each record holds a `predicted` cell (`"pred <label>"`) and one
    /// `"true <label>"` column per actual class. Prefixes are stripped and
    /// the table is transposed so actual labels become rows.
    pub fn from_table(table: &Table) -> DomainResult<Self> {
        if table.is_empty() {
            return Err(DomainError::EmptyTable(table.name.clone()));
        }
        let actual_columns: Vec<String> = table
            .columns()
            .into_iter()
            .filter(|c| c != PREDICTED_COLUMN)
            .collect();

        let mut predicted = Vec::with_capacity(table.len());
        let mut by_prediction = Vec::with_capacity(table.len());
        for record in &table.records {
            let label = table
                .text(record, PREDICTED_COLUMN)?
                .replace(PREDICTED_PREFIX, "");
            let row = actual_columns
                .iter()
                .map(|c| table.number(record, c))
                .collect::<DomainResult<Vec<f64>>>()?;
            predicted.push(label);
            by_prediction.push(row);
        }

        let counts = (0..actual_columns.len())
            .map(|a| by_prediction.iter().map(|row| row[a]).collect())
            .collect();
        let actual = actual_columns
            .iter()
            .map(|c| c.replace(ACTUAL_PREFIX, ""))
            .collect();

        Ok(Self {
            actual,
            predicted,
            counts,
        })
    }

    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut values = self.counts.iter().flatten().copied();
        let first = values.next()?;
        Some(values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    /// Stacked `(actual, prediction, value)` cells colored on the heat palette.
    pub fn heat_cells(&self) -> Vec<HeatCell> {
        let (low, high) = self.value_range().unwrap_or((0.0, 0.0));
        let mut cells = Vec::with_capacity(self.actual.len() * self.predicted.len());
        for (a, actual) in self.actual.iter().enumerate() {
            for (p, prediction) in self.predicted.iter().enumerate() {
                let value = self.counts[a][p];
                cells.push(HeatCell {
                    actual: actual.clone(),
                    prediction: prediction.clone(),
                    value,
                    color: heat_color(value, low, high),
                });
            }
        }
        cells
    }

    /// Correct predictions sit on the diagonal where labels coincide.
    pub fn correct_total(&self) -> f64 {
        self.actual
            .iter()
            .enumerate()
            .filter_map(|(a, label)| {
                self.predicted
                    .iter()
                    .position(|p| p == label)
                    .map(|p| self.counts[a][p])
            })
            .sum()
    }

    pub fn total(&self) -> f64 {
        self.counts.iter().flatten().sum()
    }

    /// Grouped bars: one category per actual label, one series per predicted label.
    pub fn corrects_chart(&self, bar_width: f64) -> CorrectsChart {
        let offsets = correct_bar_offsets(self.predicted.len(), bar_width);
        let series = self
            .predicted
            .iter()
            .enumerate()
            .map(|(p, prediction)| CorrectsSeries {
                prediction: prediction.clone(),
                color: bar_color(p),
                offset: offsets[p],
                values: self.counts.iter().map(|row| row[p]).collect(),
            })
            .collect();
        CorrectsChart {
            categories: self.actual.clone(),
            bar_width,
            series,
        }
    }
}

/// Linear color mapping of `value` onto the heat palette between `low` and `high`.
pub fn heat_color(value: f64, low: f64, high: f64) -> &'static str {
    let n = HEAT_COLORS.len();
    if high <= low {
        return HEAT_COLORS[0];
    }
    let scaled = ((value - low) / (high - low) * n as f64).floor();
    let idx = (scaled.max(0.0) as usize).min(n - 1);
    HEAT_COLORS[idx]
}

/// Dodge offsets for `num_vals` bars of `bar_width` grouped around a category.
///
/// Odd counts center on the middle bar; even counts get an extra half-width
/// gap between the two halves.
pub fn correct_bar_offsets(num_vals: usize, bar_width: f64) -> Vec<f64> {
    let n = num_vals as f64;
    let start_x = if num_vals % 2 != 0 { 0.0 } else { bar_width };
    (0..num_vals)
        .map(|i| {
            let i_f = i as f64;
            if start_x == 0.0 {
                start_x + i_f * (bar_width + bar_width / 2.0)
                    - ((bar_width * n / 2.0) + bar_width / 2.0)
            } else {
                let x = start_x + i_f * (bar_width + bar_width / 2.0)
                    - ((2.0 * bar_width * n / 2.0) - bar_width / 2.0);
                if i_f >= n / 2.0 {
                    x + bar_width / 2.0
                } else {
                    x
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn confusion_table() -> Table {
        let records = json!([
            {"predicted": "pred cluster_0", "true cluster_0": 10, "true cluster_1": "2"},
            {"predicted": "pred cluster_1", "true cluster_0": 1, "true cluster_1": 7}
        ]);
        let records = records
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect();
        Table::new("confusion", records)
    }

    #[test]
    fn given_service_records_when_reshaping_then_rows_are_actual_labels() {
        let matrix = ConfusionMatrix::from_table(&confusion_table()).unwrap();
        assert_eq!(matrix.actual, vec!["cluster_0", "cluster_1"]);
        assert_eq!(matrix.predicted, vec!["cluster_0", "cluster_1"]);
        // truth cluster_1, predicted cluster_0
        assert_eq!(matrix.counts[1][0], 2.0);
        assert_eq!(matrix.counts[0][1], 1.0);
        assert_eq!(matrix.correct_total(), 17.0);
        assert_eq!(matrix.total(), 20.0);
    }

    #[test]
    fn given_matrix_when_stacking_then_extremes_get_palette_ends() {
        let matrix = ConfusionMatrix::from_table(&confusion_table()).unwrap();
        let cells = matrix.heat_cells();
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0].value, 10.0);
        assert_eq!(cells[0].color, HEAT_COLORS[7]);
        let lowest = cells.iter().find(|c| c.value == 1.0).unwrap();
        assert_eq!(lowest.color, HEAT_COLORS[0]);
    }

    #[test]
    fn given_non_numeric_cell_when_reshaping_then_errors() {
        let records = vec![json!({"predicted": "pred a", "true a": "many"})
            .as_object()
            .cloned()
            .unwrap()];
        let result = ConfusionMatrix::from_table(&Table::new("confusion", records));
        assert!(matches!(result, Err(DomainError::NotNumeric { .. })));
    }

    #[test]
    fn given_odd_bar_count_when_computing_offsets_then_matches_reference_values() {
        let offsets = correct_bar_offsets(3, 0.1);
        let expected = [-0.2, -0.05, 0.1];
        for (got, want) in offsets.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "{got} != {want}");
        }
    }

    #[test]
    fn given_even_bar_count_when_computing_offsets_then_second_half_shifts() {
        let offsets = correct_bar_offsets(2, 0.1);
        assert!((offsets[0] + 0.05).abs() < 1e-9);
        assert!((offsets[1] - 0.15).abs() < 1e-9);
    }
}
