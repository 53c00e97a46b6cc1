//! Optimization form: objective, target value and per-variable restrictions.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::domain::error::DomainError;

/// Comparison offered in the restriction selectors. `None` is the `-` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
    None,
}

impl Condition {
    /// Options of the first selector.
    pub const FIRST: [Condition; 6] = [
        Condition::Lt,
        Condition::Le,
        Condition::Eq,
        Condition::Ge,
        Condition::Gt,
        Condition::None,
    ];
    /// Options of the second selector; equality makes no sense as an upper bound.
    pub const SECOND: [Condition; 5] = [
        Condition::Lt,
        Condition::Le,
        Condition::Ge,
        Condition::Gt,
        Condition::None,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Condition::Lt => "<",
            Condition::Le => "≤",
            Condition::Eq => "=",
            Condition::Ge => "≥",
            Condition::Gt => ">",
            Condition::None => "-",
        }
    }

    pub fn is_set(self) -> bool {
        self != Condition::None
    }
}

impl FromStr for Condition {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<" => Ok(Condition::Lt),
            "≤" | "<=" => Ok(Condition::Le),
            "=" => Ok(Condition::Eq),
            "≥" | ">=" => Ok(Condition::Ge),
            ">" => Ok(Condition::Gt),
            "-" | "" => Ok(Condition::None),
            other => Err(DomainError::UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol())
    }
}

/// Parse a restriction value as the form does: a `0` is prepended to the raw
/// text, negatives clamp to zero and anything unparseable becomes zero.
pub fn parse_restriction_value(raw: &str) -> f64 {
    format!("0{}", raw.trim_end())
        .parse::<f64>()
        .map(|v| v.max(0.0))
        .unwrap_or(0.0)
}

/// One restriction row as entered by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct RestrictionRow {
    pub variable: String,
    pub low: Condition,
    pub low_value: String,
    pub high: Condition,
    pub high_value: String,
}

impl RestrictionRow {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            low: Condition::None,
            low_value: String::new(),
            high: Condition::None,
            high_value: String::new(),
        }
    }

    /// `condicionN` / `val_condicionN` entries; empty when the row is unset.
    ///
    /// The second condition only counts when the first one is set.
    pub fn to_entries(&self) -> Option<Map<String, Value>> {
        if !self.low.is_set() {
            return None;
        }
        let mut entries = condition_entries(1, self.low, &self.low_value);
        if self.high.is_set() {
            entries.extend(condition_entries(2, self.high, &self.high_value));
        }
        Some(entries)
    }
}

fn condition_entries(n: u8, condition: Condition, raw: &str) -> Map<String, Value> {
    let mut entries = Map::new();
    entries.insert(format!("condicion{n}"), Value::from(condition.symbol()));
    entries.insert(
        format!("val_condicion{n}"),
        Value::from(parse_restriction_value(raw)),
    );
    entries
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    Min,
    Max,
}

impl FromStr for Objective {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "min" => Ok(Objective::Min),
            "max" => Ok(Objective::Max),
            other => Err(DomainError::UnknownOperator(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationTarget {
    pub variable: String,
    #[serde(rename = "valor")]
    pub value: String,
    #[serde(rename = "objetivo")]
    pub objective: Objective,
}

/// Request body sent to the optimization process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationRequest {
    #[serde(rename = "Target")]
    pub target: OptimizationTarget,
    #[serde(rename = "Restricciones")]
    pub restrictions: Map<String, Value>,
}

/// Optimization form for one model.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationForm {
    pub target: String,
    pub possible_targets: Vec<String>,
    pub objective: Objective,
    pub selected: String,
    pub rows: Vec<RestrictionRow>,
}

impl OptimizationForm {
    /// Defaults: minimize, towards the last of the sorted possible targets.
    pub fn new(target: &str, possible_targets: Vec<String>, variables: &[String]) -> Self {
        let selected = possible_targets.last().cloned().unwrap_or_default();
        Self {
            target: target.to_string(),
            possible_targets,
            objective: Objective::Min,
            selected,
            rows: variables.iter().map(RestrictionRow::new).collect(),
        }
    }

    pub fn row_mut(&mut self, variable: &str) -> Option<&mut RestrictionRow> {
        self.rows.iter_mut().find(|r| r.variable == variable)
    }

    pub fn request(&self) -> OptimizationRequest {
        let restrictions = self
            .rows
            .iter()
            .filter_map(|r| r.to_entries().map(|e| (r.variable.clone(), Value::Object(e))))
            .collect();
        OptimizationRequest {
            target: OptimizationTarget {
                variable: self.target.clone(),
                value: self.selected.clone(),
                objective: self.objective,
            },
            restrictions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("5", 5.0)]
    #[case(".5", 0.5)]
    #[case("", 0.0)]
    #[case("-3", 0.0)]
    #[case("abc", 0.0)]
    #[case("12.5 ", 12.5)]
    #[case("1e2", 100.0)]
    fn given_raw_value_when_parsing_restriction_then_falls_back_to_zero(
        #[case] raw: &str,
        #[case] expected: f64,
    ) {
        assert_eq!(parse_restriction_value(raw), expected);
    }

    #[rstest]
    #[case("≤", Condition::Le)]
    #[case("<=", Condition::Le)]
    #[case("-", Condition::None)]
    #[case(">", Condition::Gt)]
    fn given_symbol_when_parsing_condition_then_maps(#[case] raw: &str, #[case] expected: Condition) {
        assert_eq!(raw.parse::<Condition>().unwrap(), expected);
    }

    #[test]
    fn given_unknown_symbol_when_parsing_condition_then_errors() {
        assert!("~".parse::<Condition>().is_err());
    }

    #[test]
    fn given_form_when_building_request_then_only_rows_with_first_condition_count() {
        let variables = vec!["Caudal".to_string(), "pH".to_string(), "DQO".to_string()];
        let mut form = OptimizationForm::new(
            "Calidad_Agua",
            vec!["cluster_0".into(), "cluster_3".into()],
            &variables,
        );
        {
            let row = form.row_mut("Caudal").unwrap();
            row.low = Condition::Ge;
            row.low_value = "10".into();
            row.high = Condition::Lt;
            row.high_value = "x".into();
        }
        {
            let row = form.row_mut("pH").unwrap();
            row.high = Condition::Lt;
            row.high_value = "9".into();
        }

        let request = form.request();
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "Target": {"variable": "Calidad_Agua", "valor": "cluster_3", "objetivo": "min"},
                "Restricciones": {
                    "Caudal": {
                        "condicion1": "≥", "val_condicion1": 10.0,
                        "condicion2": "<", "val_condicion2": 0.0
                    }
                }
            })
        );
    }
}
