//! Domain layer: decision trees, layout and chart reshaping
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod confusion;
pub mod error;
pub mod layout;
pub mod optimization;
pub mod palette;
pub mod path;
pub mod series;
pub mod simulation;
pub mod table;
pub mod variables;
pub mod weights;

pub use arena::{DecisionTree, Edge, NodeData, NodeId, NodeKind, TreeNode};
pub use builder::TreeBuilder;
pub use confusion::{ConfusionMatrix, CorrectsChart, HeatCell};
pub use error::{DomainError, DomainResult};
pub use layout::{LayoutFrame, TreeLayout};
pub use optimization::{Condition, Objective, OptimizationForm, OptimizationRequest};
pub use palette::ClassPalette;
pub use path::{Clause, PathRow, Prediction, TargetKind};
pub use series::{ClusterSeries, DailyPredictions, DateWindow};
pub use simulation::{SimulationPanel, SimulationRequest};
pub use table::{Record, Table};
pub use variables::ModelVariables;
pub use weights::WeightBar;
