//! Dashboard service
//!
//! Turns modeling service documents into render-ready model views.

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use crate::application::registry::ModelRegistry;
use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::domain::confusion::CORRECTS_BAR_WIDTH;
use crate::domain::series::{cluster_series, possible_targets};
use crate::domain::weights::{influential_attributes, weight_bars};
use crate::domain::{
    ClassPalette, ClusterSeries, ConfusionMatrix, CorrectsChart, DailyPredictions, DecisionTree,
    HeatCell, ModelVariables, OptimizationForm, SimulationPanel, Table, TargetKind, TreeBuilder,
    TreeLayout, WeightBar,
};
use crate::infrastructure::document::{PredictionDocument, ProfileDocument};
use crate::infrastructure::service::query_params;
use crate::infrastructure::traits::{FileSystem, ModelingService};

/// Everything the dashboard shows for one model.
#[derive(Debug)]
pub struct ModelView {
    pub target: String,
    pub kind: TargetKind,
    pub tree: DecisionTree,
    pub layout: TreeLayout,
    pub confusion: ConfusionMatrix,
    pub heat_cells: Vec<HeatCell>,
    pub corrects: CorrectsChart,
    pub weights: Vec<WeightBar>,
    pub daily: DailyPredictions,
    pub simulation: SimulationPanel,
    pub optimization: OptimizationForm,
}

/// Quality profile charts shared by all models.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileView {
    pub forecast: Vec<ClusterSeries>,
    pub outliers: Vec<ClusterSeries>,
    pub horizon: NaiveDate,
}

pub struct DashboardService {
    service: Arc<dyn ModelingService>,
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
    period: u32,
}

impl DashboardService {
    pub fn new(
        service: Arc<dyn ModelingService>,
        fs: Arc<dyn FileSystem>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            service,
            fs,
            settings,
            period: 0,
        }
    }

    /// Period the dashboard was opened for (0 when unspecified).
    pub fn with_period(mut self, period: u32) -> Self {
        self.period = period;
        self
    }

    pub fn period(&self) -> u32 {
        self.period
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn target_kind(&self, target: &str) -> TargetKind {
        TargetKind::for_target(target, &self.settings.modeling.class_targets)
    }

    /// Built-in tree palette with the configured overrides on top.
    pub fn palette(&self) -> ClassPalette {
        ClassPalette::tree_default().with_overrides(&self.settings.palette)
    }

    /// Query parameters of a prediction request for `target`.
    pub fn prediction_params(&self, target: &str) -> Vec<(String, String)> {
        let modeling = &self.settings.modeling;
        vec![
            ("Objetivo".to_string(), target.to_string()),
            ("Discretizacion".to_string(), modeling.discretization.to_string()),
            ("Numero_Atributos".to_string(), modeling.attribute_count.to_string()),
        ]
    }

    /// Request and decode the prediction document for `target`.
    pub fn fetch_prediction(&self, target: &str) -> ApplicationResult<PredictionDocument> {
        let process = &self.settings.service.prediction_process;
        let tables = self.service.run(process, &self.prediction_params(target))?;
        Ok(PredictionDocument::from_tables(process, tables)?)
    }

    /// Tree and layout only, from the decision-path table of `document`.
    pub fn build_tree(
        &self,
        target: &str,
        document: &PredictionDocument,
    ) -> ApplicationResult<(DecisionTree, TreeLayout)> {
        let rows = document.path_rows()?;
        let mut builder = TreeBuilder::new(self.palette(), self.target_kind(target));
        let tree = builder.build(&rows)?;
        let layout = TreeLayout::compute(&tree, self.settings.display.frame);
        Ok((tree, layout))
    }

    /// Run the full "create model" action for `target`.
    #[instrument(level = "debug", skip(self))]
    pub fn create_model(&self, target: &str) -> ApplicationResult<ModelView> {
        info!("creating model for {}", target);
        let document = self.fetch_prediction(target)?;
        self.model_view(target, &document)
    }

    /// Assemble a model view from an already fetched document.
    pub fn model_view(
        &self,
        target: &str,
        document: &PredictionDocument,
    ) -> ApplicationResult<ModelView> {
        let kind = self.target_kind(target);
        let (tree, layout) = self.build_tree(target, document)?;

        let confusion = ConfusionMatrix::from_table(&document.confusion)?;
        let heat_cells = confusion.heat_cells();
        let corrects = confusion.corrects_chart(CORRECTS_BAR_WIDTH);

        let weights = weight_bars(&document.weights)?;
        let attributes = influential_attributes(&document.weights)?;

        let daily = DailyPredictions::from_table(
            &document.predictions,
            target,
            kind,
            self.settings.display.window(),
        )?;
        let simulation = SimulationPanel::from_table(target, &attributes, &document.predictions)?;
        let optimization = OptimizationForm::new(
            target,
            possible_targets(&document.predictions, target)?,
            &attributes,
        );

        debug!(
            "model {}: {} nodes, {} attributes, {} daily points",
            target,
            tree.len(),
            attributes.len(),
            daily.points.len()
        );
        Ok(ModelView {
            target: target.to_string(),
            kind,
            tree,
            layout,
            confusion,
            heat_cells,
            corrects,
            weights,
            daily,
            simulation,
            optimization,
        })
    }

    /// Create `target` in `registry` unless it already exists.
    ///
    /// The service is not contacted for an existing model.
    pub fn create_registered(
        &self,
        registry: &mut ModelRegistry<ModelView>,
        target: &str,
    ) -> ApplicationResult<bool> {
        registry.insert_with(target, || self.create_model(target))
    }

    /// Cluster forecast and outliers of the quality profile.
    #[instrument(level = "debug", skip(self))]
    pub fn load_profile(&self) -> ApplicationResult<ProfileView> {
        let process = &self.settings.service.profile_process;
        let tables = self.service.run(process, &[])?;
        let document = ProfileDocument::from_tables(process, tables)?;
        Ok(ProfileView {
            forecast: cluster_series(&document.forecast, "añomes", "Prediction")?,
            outliers: cluster_series(&document.outliers, "timestamp", "outlier")?,
            horizon: self.settings.display.horizon,
        })
    }

    /// Send the panel's slider values to the simulation process.
    pub fn simulate(&self, panel: &SimulationPanel) -> ApplicationResult<Vec<Table>> {
        let process = &self.settings.service.simulation_process;
        let request = panel.simulate();
        debug!("simulate {}: {:?}", request.target, request.variables);
        let params = query_params(process, &request)?;
        Ok(self.service.run(process, &params)?)
    }

    /// Send the form's target and restrictions to the optimization process.
    pub fn optimize(&self, form: &OptimizationForm) -> ApplicationResult<Vec<Table>> {
        let process = &self.settings.service.optimization_process;
        let request = form.request();
        debug!(
            "optimize {} towards {}: {} restrictions",
            request.target.variable,
            request.target.value,
            request.restrictions.len()
        );
        let params = query_params(process, &request)?;
        Ok(self.service.run(process, &params)?)
    }

    /// Model variables from the configured file.
    pub fn load_variables(&self) -> ApplicationResult<ModelVariables> {
        self.load_variables_from(&self.settings.variables_file)
    }

    pub fn load_variables_from(&self, path: &Path) -> ApplicationResult<ModelVariables> {
        let content =
            self.fs
                .read_to_string(path)
                .map_err(|e| ApplicationError::OperationFailed {
                    context: format!("read model variables: {}", path.display()),
                    source: Box::new(e),
                })?;
        let variables = ModelVariables::parse(&content);
        debug!("loaded {} model variables", variables.len());
        Ok(variables)
    }
}
