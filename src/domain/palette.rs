//! Fixed color palettes and the class/range color map used for tree coloring.

use std::collections::BTreeMap;

use crate::domain::error::{DomainError, DomainResult};

/// Bar chart colors, used cyclically for bars and tree terminals.
pub const BAR_COLORS: [&str; 8] = [
    "#7293cb", "#e1974c", "#84ba5b", "#d35e60", "#808585", "#9067a7", "#ab6857", "#ccc210",
];

/// Line colors, used cyclically for cluster identities in time series.
pub const LINE_COLORS: [&str; 8] = [
    "#396ab1", "#da7c30", "#3e9651", "#cc2529", "#535154", "#6b4c9a", "#922428", "#948b3d",
];

/// Sequential blues for the confusion heat map (low to high).
pub const HEAT_COLORS: [&str; 8] = [
    "#f7fbff", "#deebf7", "#c6dbef", "#9ecae1", "#6baed6", "#4292c6", "#2171b5", "#08519c",
];

pub const INTERNAL_NODE_COLOR: &str = "#c2e8e0";

pub fn bar_color(i: usize) -> &'static str {
    BAR_COLORS[i % BAR_COLORS.len()]
}

pub fn line_color(i: usize) -> &'static str {
    LINE_COLORS[i % LINE_COLORS.len()]
}

/// Maps canonical class/range keys (`cluster_0`, `range1`, ...) to fill colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassPalette {
    colors: BTreeMap<String, String>,
}

impl Default for ClassPalette {
    fn default() -> Self {
        Self::tree_default()
    }
}

impl ClassPalette {
    /// Terminal colors for decision trees: clusters and ranges both take bar colors.
    pub fn tree_default() -> Self {
        let mut colors = BTreeMap::new();
        for i in 0..4 {
            colors.insert(format!("cluster_{i}"), BAR_COLORS[i].to_string());
        }
        for i in 1..=5 {
            colors.insert(format!("range{i}"), BAR_COLORS[i - 1].to_string());
        }
        Self { colors }
    }

    /// Overlay entries; overrides win over existing keys.
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, String>) -> Self {
        for (key, color) in overrides {
            self.colors.insert(key.clone(), color.clone());
        }
        self
    }

    /// Look up the color for a canonical key.
    ///
    /// An absent key is fatal: an unmapped class cannot be colored.
    pub fn color_for(&self, key: &str) -> DomainResult<&str> {
        self.colors
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| DomainError::UnmappedClass {
                key: key.to_string(),
            })
    }
}
