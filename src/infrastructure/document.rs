//! Decoding of the modeling service's JSON documents.
//!
//! A document is a JSON array of tables, each table an array of records.
//! Nested objects inside records are flattened to dotted column names.

use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::error::DomainResult;
use crate::domain::path::PathRow;
use crate::domain::table::{Record, Table};
use crate::infrastructure::error::ServiceError;

/// Table positions in a prediction document.
pub const PATHS_TABLE: usize = 0;
pub const CONFUSION_TABLE: usize = 1;
pub const WEIGHTS_TABLE: usize = 2;
pub const PREDICTIONS_TABLE: usize = 3;

/// Table positions in a profile document.
pub const FORECAST_TABLE: usize = 3;
pub const OUTLIERS_TABLE: usize = 4;

/// Split a document into tables named `<process>[<i>]`.
pub fn decode_tables(process: &str, document: Value) -> Result<Vec<Table>, ServiceError> {
    let tables = match document {
        Value::Array(tables) => tables,
        other => {
            return Err(ServiceError::decode(
                process,
                format!("expected an array of tables, got {}", kind_of(&other)),
            ))
        }
    };

    tables
        .into_iter()
        .enumerate()
        .map(|(i, table)| {
            let name = format!("{process}[{i}]");
            let records = match table {
                Value::Array(records) => records
                    .into_iter()
                    .map(|r| match r {
                        Value::Object(obj) => Ok(flatten(obj)),
                        other => Err(ServiceError::decode(
                            process,
                            format!("{name}: expected record object, got {}", kind_of(&other)),
                        )),
                    })
                    .collect::<Result<Vec<Record>, _>>()?,
                // A bare object counts as a single-record table
                Value::Object(obj) => vec![flatten(obj)],
                other => {
                    return Err(ServiceError::decode(
                        process,
                        format!("{name}: expected table, got {}", kind_of(&other)),
                    ))
                }
            };
            Ok(Table::new(name, records))
        })
        .collect()
}

fn flatten(record: Map<String, Value>) -> Record {
    let mut flat = Map::new();
    flatten_into(&mut flat, None, record);
    flat
}

fn flatten_into(flat: &mut Record, prefix: Option<&str>, record: Map<String, Value>) {
    for (key, value) in record {
        let column = match prefix {
            Some(p) => format!("{p}.{key}"),
            None => key,
        };
        match value {
            Value::Object(nested) => flatten_into(flat, Some(&column), nested),
            other => {
                flat.insert(column, other);
            }
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn take_table(
    process: &str,
    tables: &mut [Table],
    index: usize,
    name: &str,
) -> Result<Table, ServiceError> {
    let table = tables.get_mut(index).ok_or_else(|| {
        ServiceError::decode(
            process,
            format!("missing {name} table at position {index}"),
        )
    })?;
    let mut table = std::mem::take(table);
    table.name = name.to_string();
    Ok(table)
}

/// Result of a prediction request.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionDocument {
    pub paths: Table,
    pub confusion: Table,
    pub weights: Table,
    pub predictions: Table,
}

impl PredictionDocument {
    pub fn from_tables(process: &str, mut tables: Vec<Table>) -> Result<Self, ServiceError> {
        debug!("prediction document with {} tables", tables.len());
        Ok(Self {
            paths: take_table(process, &mut tables, PATHS_TABLE, "decision paths")?,
            confusion: take_table(process, &mut tables, CONFUSION_TABLE, "confusion")?,
            weights: take_table(process, &mut tables, WEIGHTS_TABLE, "weights")?,
            predictions: take_table(process, &mut tables, PREDICTIONS_TABLE, "predictions")?,
        })
    }

    /// Decision-path rows from the `Condition`/`Prediction` columns.
    pub fn path_rows(&self) -> DomainResult<Vec<PathRow>> {
        self.paths
            .records
            .iter()
            .map(|r| {
                Ok(PathRow::new(
                    self.paths.text_lossy(r, "Condition")?,
                    self.paths.text_lossy(r, "Prediction")?,
                ))
            })
            .collect()
    }
}

/// Result of the quality profile request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileDocument {
    pub forecast: Table,
    pub outliers: Table,
}

impl ProfileDocument {
    pub fn from_tables(process: &str, mut tables: Vec<Table>) -> Result<Self, ServiceError> {
        Ok(Self {
            forecast: take_table(process, &mut tables, FORECAST_TABLE, "forecast")?,
            outliers: take_table(process, &mut tables, OUTLIERS_TABLE, "outliers")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn given_nested_records_when_decoding_then_columns_are_flattened() {
        let doc = json!([[{"a": 1, "b": {"c": "x", "d": {"e": 2}}}]]);
        let tables = decode_tables("P", doc).unwrap();

        assert_eq!(tables[0].name, "P[0]");
        assert_eq!(tables[0].columns(), vec!["a", "b.c", "b.d.e"]);
    }

    #[test]
    fn given_non_array_document_when_decoding_then_errors() {
        let err = decode_tables("P", json!({"error": "boom"})).unwrap_err();
        assert!(matches!(err, ServiceError::Decode { .. }));
        assert!(!err.is_unavailable());
    }

    #[test]
    fn given_short_document_when_reading_prediction_then_names_missing_table() {
        let tables = decode_tables("P", json!([[], []])).unwrap();
        let err = PredictionDocument::from_tables("P", tables).unwrap_err();
        assert!(err.to_string().contains("weights"));
    }

    #[test]
    fn given_path_table_when_reading_rows_then_maps_columns() {
        let tables = decode_tables(
            "P",
            json!([
                [{"Condition": "A > 5 & B < 2", "Prediction": "cluster_0"}],
                [], [], []
            ]),
        )
        .unwrap();
        let doc = PredictionDocument::from_tables("P", tables).unwrap();
        assert_eq!(
            doc.path_rows().unwrap(),
            vec![PathRow::new("A > 5 & B < 2", "cluster_0")]
        );
        assert_eq!(doc.paths.name, "decision paths");
    }
}
