//! Attribute weights (predictor importance).

use serde::Serialize;

use crate::domain::error::DomainResult;
use crate::domain::palette::bar_color;
use crate::domain::table::Table;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightBar {
    pub attribute: String,
    pub weight: f64,
    pub color: &'static str,
}

/// Bars in table order, colored by position.
pub fn weight_bars(table: &Table) -> DomainResult<Vec<WeightBar>> {
    table
        .records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            Ok(WeightBar {
                attribute: table.text_lossy(record, "Attribute")?,
                weight: table.number(record, "Weight")?,
                color: bar_color(i),
            })
        })
        .collect()
}

/// Names of the influential attributes, in table order.
pub fn influential_attributes(table: &Table) -> DomainResult<Vec<String>> {
    table
        .records
        .iter()
        .map(|r| table.text_lossy(r, "Attribute"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::palette::BAR_COLORS;
    use serde_json::json;

    #[test]
    fn given_weight_rows_when_building_bars_then_colors_follow_position() {
        let records = json!([
            {"Attribute": "Caudal", "Weight": 0.4},
            {"Attribute": "pH", "Weight": "0.25"}
        ])
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect();
        let table = Table::new("weights", records);

        let bars = weight_bars(&table).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].weight, 0.25);
        assert_eq!(bars[1].color, BAR_COLORS[1]);
        assert_eq!(influential_attributes(&table).unwrap(), vec!["Caudal", "pH"]);
    }
}
