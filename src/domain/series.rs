//! Time series reshaping: daily real-vs-predicted labels and per-cluster series.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use itertools::Itertools;
use regex::Regex;
use serde::Serialize;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::palette::line_color;
use crate::domain::path::TargetKind;
use crate::domain::table::Table;

pub const DAILY_DATE_FORMAT: &str = "%m/%d/%y";
pub const FORECAST_DATE_FORMAT: &str = "%m/%d/%y %I:%M %p";

/// Clusters shown in forecast and outlier charts.
pub const CLUSTERS: [&str; 4] = ["cluster_0", "cluster_1", "cluster_2", "cluster_3"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub real: i64,
    pub prediction: i64,
    pub error: i64,
}

/// Daily real vs. predicted class index, with the absolute error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPredictions {
    pub target: String,
    pub points: Vec<DailyPoint>,
    /// Distinct real labels in the full table, before windowing
    pub bin_count: usize,
    pub tick_format: &'static str,
}

/// Inclusive date window applied to daily predictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl DailyPredictions {
    /// Build from the per-timestamp prediction table.
    ///
    /// Reads `timestamp`, `<target>` and `prediction(<target>)`. Class labels
    /// drop the `cluster_` prefix; range labels drop any `[...]` segment and
    /// the `range` word. Only the first row per date is kept.
    pub fn from_table(
        table: &Table,
        target: &str,
        kind: TargetKind,
        window: DateWindow,
    ) -> DomainResult<Self> {
        let prediction_column = format!("prediction({target})");

        let mut rows = Vec::with_capacity(table.len());
        for record in &table.records {
            let stamp = table.text(record, "timestamp")?;
            let date = NaiveDate::parse_from_str(stamp, DAILY_DATE_FORMAT).map_err(|_| {
                DomainError::InvalidDate {
                    column: "timestamp".to_string(),
                    value: stamp.to_string(),
                }
            })?;
            let real = table.text_lossy(record, target)?;
            let prediction = table.text_lossy(record, &prediction_column)?;
            rows.push((date, real, prediction));
        }
        let bin_count = rows.iter().map(|(_, real, _)| real).unique().count();

        // Stable sort keeps the first row of each date in document order.
        // Labels are parsed only for the days that survive the window.
        rows.sort_by_key(|(date, _, _)| *date);
        let points = rows
            .into_iter()
            .dedup_by(|a, b| a.0 == b.0)
            .filter(|(date, _, _)| window.contains(*date))
            .map(|(date, real, prediction)| -> DomainResult<DailyPoint> {
                let real = label_index(kind, target, &real)?;
                let prediction = label_index(kind, &prediction_column, &prediction)?;
                Ok(DailyPoint {
                    date,
                    real,
                    prediction,
                    error: (real - prediction).abs(),
                })
            })
            .collect::<DomainResult<Vec<_>>>()?;

        Ok(Self {
            target: target.to_string(),
            points,
            bin_count,
            tick_format: match kind {
                TargetKind::Class => "Cluster %u",
                TargetKind::Range => "Range %u",
            },
        })
    }

    pub fn mean_error(&self) -> Option<f64> {
        if self.points.is_empty() {
            return None;
        }
        let sum: i64 = self.points.iter().map(|p| p.error).sum();
        Some(sum as f64 / self.points.len() as f64)
    }
}

/// `[lo - hi]` segment of a range label
static RANGE_BOUNDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*\]").expect("Invalid range bounds regex"));

/// Numeric index of a class (`cluster_2`) or range (`range3 [10 - 20]`) label.
fn label_index(kind: TargetKind, column: &str, raw: &str) -> DomainResult<i64> {
    let stripped = match kind {
        TargetKind::Class => raw.replace("cluster_", ""),
        TargetKind::Range => RANGE_BOUNDS.replace_all(raw, "").replace("range", ""),
    };
    stripped
        .trim()
        .parse::<i64>()
        .map_err(|_| DomainError::NotNumeric {
            column: column.to_string(),
            value: raw.to_string(),
        })
}

/// Distinct values of the target column (optimization targets).
///
/// Numeric columns sort by value, anything else sorts as text.
pub fn possible_targets(table: &Table, target: &str) -> DomainResult<Vec<String>> {
    let mut values = table
        .records
        .iter()
        .map(|r| table.text_lossy(r, target))
        .collect::<DomainResult<Vec<String>>>()?;

    let numbers: Option<Vec<f64>> = values.iter().map(|v| v.trim().parse().ok()).collect();
    match numbers {
        Some(numbers) if !values.is_empty() => {
            let mut pairs: Vec<(f64, String)> = numbers.into_iter().zip(values).collect();
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
            values = pairs.into_iter().map(|(_, v)| v).collect();
        }
        _ => values.sort(),
    }
    values.dedup();
    Ok(values)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub at: NaiveDateTime,
    pub value: f64,
}

/// One cluster's line or scatter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSeries {
    pub cluster: String,
    pub legend: String,
    pub color: &'static str,
    pub points: Vec<SeriesPoint>,
}

/// Group a table into per-cluster series for `CLUSTERS`.
///
/// Rows of other clusters are ignored; points are sorted by time.
pub fn cluster_series(
    table: &Table,
    time_column: &str,
    value_column: &str,
) -> DomainResult<Vec<ClusterSeries>> {
    let mut grouped: BTreeMap<String, Vec<SeriesPoint>> = BTreeMap::new();
    for record in &table.records {
        let cluster = table.text(record, "cluster")?;
        if !CLUSTERS.contains(&cluster) {
            continue;
        }
        let stamp = table.text(record, time_column)?;
        let at = parse_timestamp(stamp).ok_or_else(|| DomainError::InvalidDate {
            column: time_column.to_string(),
            value: stamp.to_string(),
        })?;
        let value = table.number(record, value_column)?;
        grouped
            .entry(cluster.to_string())
            .or_default()
            .push(SeriesPoint { at, value });
    }

    Ok(CLUSTERS
        .iter()
        .enumerate()
        .map(|(i, cluster)| {
            let mut points = grouped.remove(*cluster).unwrap_or_default();
            points.sort_by_key(|p| p.at);
            ClusterSeries {
                cluster: cluster.to_string(),
                legend: format!("Cluster {i}"),
                color: line_color(i),
                points,
            }
        })
        .collect())
}

/// Accepts the spellings the service uses for timestamps.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: [&str; 4] = [
        FORECAST_DATE_FORMAT,
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%b %d, %Y %I:%M:%S %p",
    ];
    const DATE_FORMATS: [&str; 2] = [DAILY_DATE_FORMAT, "%Y-%m-%d"];

    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn table(name: &str, value: Value) -> Table {
        let records = value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect();
        Table::new(name, records)
    }

    fn window() -> DateWindow {
        DateWindow {
            start: NaiveDate::from_ymd_opt(2018, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2019, 1, 31).unwrap(),
        }
    }

    #[test]
    fn given_class_rows_when_building_daily_then_strips_prefix_and_computes_error() {
        let t = table(
            "predictions",
            json!([
                {"timestamp": "01/03/18", "Calidad_Agua": "cluster_2", "prediction(Calidad_Agua)": "cluster_0"},
                {"timestamp": "01/02/18", "Calidad_Agua": "cluster_1", "prediction(Calidad_Agua)": "cluster_1"},
                {"timestamp": "01/02/18", "Calidad_Agua": "cluster_3", "prediction(Calidad_Agua)": "cluster_0"},
                {"timestamp": "12/30/17", "Calidad_Agua": "cluster_0", "prediction(Calidad_Agua)": "cluster_0"}
            ]),
        );
        let daily =
            DailyPredictions::from_table(&t, "Calidad_Agua", TargetKind::Class, window()).unwrap();

        assert_eq!(daily.points.len(), 2);
        assert_eq!(daily.points[0].date, NaiveDate::from_ymd_opt(2018, 1, 2).unwrap());
        assert_eq!(daily.points[0].real, 1);
        assert_eq!(daily.points[1].error, 2);
        assert_eq!(daily.bin_count, 4);
        assert_eq!(daily.tick_format, "Cluster %u");
        assert_eq!(daily.mean_error(), Some(1.0));
    }

    #[test]
    fn given_range_rows_when_building_daily_then_strips_brackets_and_word() {
        let t = table(
            "predictions",
            json!([
                {"timestamp": "03/01/18", "O_DQO": "range3 [10.0 - 20.0]", "prediction(O_DQO)": "range1 [-inf - 5.0]"}
            ]),
        );
        let daily = DailyPredictions::from_table(&t, "O_DQO", TargetKind::Range, window()).unwrap();
        assert_eq!(daily.points[0].real, 3);
        assert_eq!(daily.points[0].prediction, 1);
        assert_eq!(daily.points[0].error, 2);
        assert_eq!(daily.tick_format, "Range %u");
    }

    #[test]
    fn given_bad_date_when_building_daily_then_errors() {
        let t = table(
            "predictions",
            json!([{"timestamp": "2018-13-01", "T": "cluster_0", "prediction(T)": "cluster_0"}]),
        );
        let result = DailyPredictions::from_table(&t, "T", TargetKind::Class, window());
        assert!(matches!(result, Err(DomainError::InvalidDate { .. })));
    }

    #[test]
    fn given_bad_labels_outside_window_or_on_repeated_date_when_building_daily_then_ignored() {
        let t = table(
            "predictions",
            json!([
                {"timestamp": "06/01/18", "Calidad_Agua": "cluster_1", "prediction(Calidad_Agua)": "cluster_2"},
                {"timestamp": "06/01/18", "Calidad_Agua": "?", "prediction(Calidad_Agua)": "cluster_0"},
                {"timestamp": "06/01/17", "Calidad_Agua": "?", "prediction(Calidad_Agua)": "?"}
            ]),
        );
        let daily =
            DailyPredictions::from_table(&t, "Calidad_Agua", TargetKind::Class, window()).unwrap();

        assert_eq!(daily.points.len(), 1);
        assert_eq!(daily.points[0].real, 1);
        assert_eq!(daily.points[0].error, 1);
        assert_eq!(daily.bin_count, 2);
    }

    #[test]
    fn given_bad_label_inside_window_when_building_daily_then_errors() {
        let t = table(
            "predictions",
            json!([{"timestamp": "06/01/18", "T": "cluster_x", "prediction(T)": "cluster_0"}]),
        );
        let result = DailyPredictions::from_table(&t, "T", TargetKind::Class, window());
        assert!(matches!(
            result,
            Err(DomainError::NotNumeric { ref column, .. }) if column == "T"
        ));
    }

    #[test]
    fn given_numeric_targets_when_listing_possible_targets_then_sorted_by_value() {
        let t = table(
            "predictions",
            json!([{"T": 10}, {"T": 9}, {"T": 2.5}, {"T": 10}]),
        );
        assert_eq!(possible_targets(&t, "T").unwrap(), vec!["2.5", "9", "10"]);
    }

    #[test]
    fn given_target_column_when_listing_possible_targets_then_sorted_and_unique() {
        let t = table(
            "predictions",
            json!([{"T": "cluster_2"}, {"T": "cluster_0"}, {"T": "cluster_2"}]),
        );
        assert_eq!(possible_targets(&t, "T").unwrap(), vec!["cluster_0", "cluster_2"]);
    }

    #[test]
    fn given_forecast_rows_when_grouping_then_one_series_per_cluster() {
        let t = table(
            "forecast",
            json!([
                {"añomes": "02/01/19 12:00 AM", "Prediction": "41.5", "cluster": "cluster_1"},
                {"añomes": "01/01/19 12:00 AM", "Prediction": 40.0, "cluster": "cluster_1"},
                {"añomes": "01/01/19 12:00 AM", "Prediction": 12.0, "cluster": "cluster_0"},
                {"añomes": "01/01/19 12:00 AM", "Prediction": 1.0, "cluster": "cluster_9"}
            ]),
        );
        let series = cluster_series(&t, "añomes", "Prediction").unwrap();
        assert_eq!(series.len(), 4);
        assert_eq!(series[1].points.len(), 2);
        assert_eq!(series[1].points[0].value, 40.0);
        assert_eq!(series[1].legend, "Cluster 1");
        assert!(series[3].points.is_empty());
    }

    #[test]
    fn given_various_spellings_when_parsing_timestamp_then_accepts_known_formats() {
        assert!(parse_timestamp("2018-05-01 10:00:00").is_some());
        assert!(parse_timestamp("05/01/18").is_some());
        assert!(parse_timestamp("not a date").is_none());
    }
}
