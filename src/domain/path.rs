//! Decision paths: clauses, terminal predictions and the rows that carry them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, DomainResult};

/// Delimiter between clauses of one decision path.
pub const CLAUSE_DELIMITER: &str = " & ";

/// One "variable operator threshold" fragment of a decision path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Clause {
    /// Split variable, e.g. `Caudal`
    pub variable: String,
    /// Remainder after the variable, e.g. `> 5.250`
    pub condition: String,
}

impl Clause {
    /// Split a clause on its first space into variable and condition text.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let (variable, condition) =
            raw.split_once(' ')
                .ok_or_else(|| DomainError::MalformedClause {
                    clause: raw.to_string(),
                    reason: "missing condition after variable".to_string(),
                })?;
        if variable.is_empty() {
            return Err(DomainError::MalformedClause {
                clause: raw.to_string(),
                reason: "empty variable name".to_string(),
            });
        }
        Ok(Self {
            variable: variable.to_string(),
            condition: condition.to_string(),
        })
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.variable, self.condition)
    }
}

/// How terminal predictions of a model are spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// Plain category names, e.g. `cluster_2`
    Class,
    /// Discretized ranges, e.g. `range3 [12.5 - 20.1]`
    Range,
}

impl TargetKind {
    /// Targets listed in `class_targets` predict clusters; every other target is discretized.
    pub fn for_target(target: &str, class_targets: &[String]) -> Self {
        if class_targets.iter().any(|t| t == target) {
            TargetKind::Class
        } else {
            TargetKind::Range
        }
    }
}

/// Terminal value of a decision path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction {
    /// Canonical class/range key used for coloring (`cluster_0`, `range1`)
    pub key: String,
    /// Display text of the terminal node
    pub label: String,
}

impl Prediction {
    pub fn parse(raw: &str, kind: TargetKind) -> DomainResult<Self> {
        match kind {
            TargetKind::Class => Ok(Self {
                key: raw.to_string(),
                label: raw.to_string(),
            }),
            TargetKind::Range => {
                let (tag, description) =
                    raw.split_once(' ')
                        .ok_or_else(|| DomainError::MalformedPrediction {
                            value: raw.to_string(),
                        })?;
                Ok(Self {
                    key: tag.to_string(),
                    label: format!("{tag}\n{description}"),
                })
            }
        }
    }
}

/// One row of the decision-path table as delivered by the modeling service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathRow {
    #[serde(rename = "Condition")]
    pub condition: String,
    #[serde(rename = "Prediction")]
    pub prediction: String,
}

impl PathRow {
    pub fn new(condition: impl Into<String>, prediction: impl Into<String>) -> Self {
        Self {
            condition: condition.into(),
            prediction: prediction.into(),
        }
    }

    /// Ordered clauses of this path.
    pub fn clauses(&self) -> DomainResult<Vec<Clause>> {
        self.condition
            .split(CLAUSE_DELIMITER)
            .map(Clause::parse)
            .collect()
    }
}
