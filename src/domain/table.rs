//! Record tables as delivered by the modeling service.

use serde_json::{Map, Value};

use crate::domain::error::{DomainError, DomainResult};

pub type Record = Map<String, Value>;

/// A named list of records. Column order follows the first record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub name: String,
    pub records: Vec<Record>,
}

impl Table {
    pub fn new(name: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Column names in document order, taken from the first record.
    pub fn columns(&self) -> Vec<String> {
        self.records
            .first()
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn text<'a>(&self, record: &'a Record, column: &str) -> DomainResult<&'a str> {
        match record.get(column) {
            Some(Value::String(s)) => Ok(s.as_str()),
            _ => Err(self.missing(column)),
        }
    }

    /// Cell as string; numbers are rendered with their JSON spelling.
    pub fn text_lossy(&self, record: &Record, column: &str) -> DomainResult<String> {
        match record.get(column) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::Bool(b)) => Ok(b.to_string()),
            _ => Err(self.missing(column)),
        }
    }

    /// Numeric cell; numeric strings are accepted.
    pub fn number(&self, record: &Record, column: &str) -> DomainResult<f64> {
        match record.get(column) {
            Some(value) => to_number(column, value),
            None => Err(self.missing(column)),
        }
    }

    /// All values of a numeric column.
    pub fn numbers(&self, column: &str) -> DomainResult<Vec<f64>> {
        self.records
            .iter()
            .map(|r| self.number(r, column))
            .collect()
    }

    fn missing(&self, column: &str) -> DomainError {
        DomainError::MissingColumn {
            table: self.name.clone(),
            column: column.to_string(),
        }
    }
}

pub fn to_number(column: &str, value: &Value) -> DomainResult<f64> {
    let not_numeric = || DomainError::NotNumeric {
        column: column.to_string(),
        value: value.to_string(),
    };
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(not_numeric),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| not_numeric()),
        _ => Err(not_numeric()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn given_numeric_string_when_reading_number_then_parses() {
        let table = Table::new("t", vec![record(json!({"a": "12.5", "b": 3}))]);
        let r = &table.records[0];
        assert_eq!(table.number(r, "a").unwrap(), 12.5);
        assert_eq!(table.number(r, "b").unwrap(), 3.0);
    }

    #[test]
    fn given_missing_column_when_reading_then_names_table_and_column() {
        let table = Table::new("weights", vec![record(json!({"a": 1}))]);
        let err = table.text(&table.records[0], "Attribute").unwrap_err();
        assert_eq!(
            err,
            DomainError::MissingColumn {
                table: "weights".into(),
                column: "Attribute".into()
            }
        );
    }

    #[test]
    fn given_records_when_listing_columns_then_keeps_document_order() {
        let table = Table::new("t", vec![record(json!({"z": 1, "a": 2, "m": 3}))]);
        assert_eq!(table.columns(), vec!["z", "a", "m"]);
    }
}
