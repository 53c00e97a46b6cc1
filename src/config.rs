//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/dtviz/dtviz.toml`
//! 3. Local config: `<dir>/.dtviz.toml` (working directory by default)
//! 4. Environment variables: `DTVIZ_*` prefix, `__` between section and key

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::layout::LayoutFrame;
use crate::domain::series::DateWindow;
use crate::domain::variables::DEFAULT_VARIABLE;

/// Remote modeling service endpoint and process names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL the process names are appended to
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub timeout_secs: u64,
    pub prediction_process: String,
    pub profile_process: String,
    pub simulation_process: String,
    pub optimization_process: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://rapidminer.vicomtech.org/api/rest/process".into(),
            username: "rapidminer".into(),
            password: "rapidminer".into(),
            timeout_secs: 120,
            prediction_process: "EDAR_Cartuja_Prediccion_JSON".into(),
            profile_process: "EDAR_Cartuja_Perfil_Out_JSON".into(),
            simulation_process: "EDAR_Cartuja_Simulacion_JSON".into(),
            optimization_process: "EDAR_Cartuja_Optimizacion_JSON".into(),
        }
    }
}

/// Parameters of a prediction request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModelingConfig {
    /// Number of bins for range targets (`Discretizacion`)
    pub discretization: u32,
    /// Influential attributes requested (`Numero_Atributos`)
    pub attribute_count: u32,
    pub default_target: String,
    /// Targets predicted as clusters; every other target is discretized into ranges
    pub class_targets: Vec<String>,
}

impl Default for ModelingConfig {
    fn default() -> Self {
        Self {
            discretization: 5,
            attribute_count: 4,
            default_target: DEFAULT_VARIABLE.into(),
            class_targets: vec![DEFAULT_VARIABLE.into()],
        }
    }
}

/// Chart windows and tree layout frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    /// Start of the forecast, marked on cluster forecast charts
    pub horizon: NaiveDate,
    pub frame: LayoutFrame,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            window_start: NaiveDate::from_ymd_opt(2018, 1, 1).unwrap_or_default(),
            window_end: NaiveDate::from_ymd_opt(2019, 1, 31).unwrap_or_default(),
            horizon: NaiveDate::from_ymd_opt(2019, 2, 1).unwrap_or_default(),
            frame: LayoutFrame::default(),
        }
    }
}

impl DisplayConfig {
    pub fn window(&self) -> DateWindow {
        DateWindow {
            start: self.window_start,
            end: self.window_end,
        }
    }
}

/// Raw settings for intermediate parsing (`None` = not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub variables_file: Option<PathBuf>,
    pub service: RawServiceConfig,
    pub modeling: RawModelingConfig,
    pub display: RawDisplayConfig,
    pub palette: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawServiceConfig {
    pub base_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: Option<u64>,
    pub prediction_process: Option<String>,
    pub profile_process: Option<String>,
    pub simulation_process: Option<String>,
    pub optimization_process: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawModelingConfig {
    pub discretization: Option<u32>,
    pub attribute_count: Option<u32>,
    pub default_target: Option<String>,
    pub class_targets: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawDisplayConfig {
    pub window_start: Option<NaiveDate>,
    pub window_end: Option<NaiveDate>,
    pub horizon: Option<NaiveDate>,
    pub frame: Option<LayoutFrame>,
}

/// Merge arrays with union semantics and negation support.
///
/// - Items from overlay are added to base
/// - Items prefixed with `!` remove the corresponding item from the result
/// - Duplicates are de-duplicated
///
/// # Examples
/// ```ignore
/// merge_array(&["a", "b"], &["c"])       // → ["a", "b", "c"]
/// merge_array(&["a", "b"], &["!a", "c"]) // → ["b", "c"]
/// ```
pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
    let mut result: HashSet<String> = base.iter().cloned().collect();

    for pattern in overlay {
        if let Some(negated) = pattern.strip_prefix('!') {
            result.remove(negated);
        } else {
            result.insert(pattern.clone());
        }
    }

    // Sorted for deterministic output
    let mut vec: Vec<String> = result.into_iter().collect();
    vec.sort();
    vec
}

impl ServiceConfig {
    fn apply(&self, raw: &RawServiceConfig) -> Self {
        let pick = |o: &Option<String>, b: &String| o.clone().unwrap_or_else(|| b.clone());
        Self {
            base_url: pick(&raw.base_url, &self.base_url),
            username: pick(&raw.username, &self.username),
            password: pick(&raw.password, &self.password),
            timeout_secs: raw.timeout_secs.unwrap_or(self.timeout_secs),
            prediction_process: pick(&raw.prediction_process, &self.prediction_process),
            profile_process: pick(&raw.profile_process, &self.profile_process),
            simulation_process: pick(&raw.simulation_process, &self.simulation_process),
            optimization_process: pick(&raw.optimization_process, &self.optimization_process),
        }
    }
}

impl ModelingConfig {
    /// Scalars: overlay wins if set. `class_targets`: REPLACE when `union` is
    /// false, union with negation support otherwise.
    fn apply(&self, raw: &RawModelingConfig, union: bool) -> Self {
        let class_targets = match &raw.class_targets {
            Some(overlay) if union => merge_array(&self.class_targets, overlay),
            Some(overlay) => overlay.clone(),
            None => self.class_targets.clone(),
        };
        Self {
            discretization: raw.discretization.unwrap_or(self.discretization),
            attribute_count: raw.attribute_count.unwrap_or(self.attribute_count),
            default_target: raw
                .default_target
                .clone()
                .unwrap_or_else(|| self.default_target.clone()),
            class_targets,
        }
    }
}

impl DisplayConfig {
    fn apply(&self, raw: &RawDisplayConfig) -> Self {
        Self {
            window_start: raw.window_start.unwrap_or(self.window_start),
            window_end: raw.window_end.unwrap_or(self.window_end),
            horizon: raw.horizon.unwrap_or(self.horizon),
            frame: raw.frame.unwrap_or(self.frame),
        }
    }
}

/// Unified configuration for dtviz.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// One model variable per line
    pub variables_file: PathBuf,
    pub service: ServiceConfig,
    pub modeling: ModelingConfig,
    pub display: DisplayConfig,
    /// Class/range key → color, merged over the built-in palette
    pub palette: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            modeling: ModelingConfig::default(),
            display: DisplayConfig::default(),
            palette: BTreeMap::new(),
            variables_file: global_config_dir()
                .map(|dir| dir.join("variables.txt"))
                .unwrap_or_else(|| PathBuf::from("~/.config/dtviz/variables.txt")),
        }
    }
}

/// Get the XDG config directory for dtviz.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "dtviz").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("dtviz.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".dtviz.toml")
}

/// Expand `~`, `$VAR` and `${VAR}`; unknown variables leave the input unchanged.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.variables_file.to_string_lossy().as_ref());
        self.variables_file = PathBuf::from(expanded);
    }

    /// Palette overrides: keys from the overlay win, others are kept.
    fn merge_palette(
        &self,
        overlay: &Option<BTreeMap<String, String>>,
    ) -> BTreeMap<String, String> {
        let mut palette = self.palette.clone();
        if let Some(overlay) = overlay {
            palette.extend(overlay.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        palette
    }

    /// Apply global config onto defaults; arrays REPLACE the defaults.
    fn apply_global(&self, global: &RawSettings) -> Self {
        Self {
            service: self.service.apply(&global.service),
            modeling: self.modeling.apply(&global.modeling, false),
            display: self.display.apply(&global.display),
            palette: self.merge_palette(&global.palette),
            variables_file: global
                .variables_file
                .clone()
                .unwrap_or_else(|| self.variables_file.clone()),
        }
    }

    /// Merge local config onto self; arrays UNION with negation support.
    fn merge_with(&self, local: &RawSettings) -> Self {
        Self {
            service: self.service.apply(&local.service),
            modeling: self.modeling.apply(&local.modeling, true),
            display: self.display.apply(&local.display),
            palette: self.merge_palette(&local.palette),
            variables_file: local
                .variables_file
                .clone()
                .unwrap_or_else(|| self.variables_file.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Directory searched for `.dtviz.toml`
    ///
    /// # Array Merge Semantics
    /// - Defaults → Global: REPLACE
    /// - Global → Local: UNION with negation support
    /// - Any → Env vars: REPLACE
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.apply_global(&raw);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Load from one explicit file on top of the defaults (no env overrides).
    pub fn load_file(path: &Path) -> Result<Self, ApplicationError> {
        let raw = load_raw_settings(path)?;
        let mut settings = Self::default().apply_global(&raw);
        settings.expand_paths();
        Ok(settings)
    }

    /// Apply DTVIZ_* environment variables as explicit overrides.
    fn apply_env_overrides(settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("DTVIZ")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("modeling.class_targets")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;
        Self::apply_overrides(settings, &config)
    }

    fn apply_overrides(mut settings: Self, config: &Config) -> Result<Self, ApplicationError> {
        let string = |key: &str| config.get_string(key).ok();

        if let Some(val) = string("service.base_url") {
            settings.service.base_url = val;
        }
        if let Some(val) = string("service.username") {
            settings.service.username = val;
        }
        if let Some(val) = string("service.password") {
            settings.service.password = val;
        }
        if let Ok(val) = config.get_int("service.timeout_secs") {
            settings.service.timeout_secs = u64::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("service.timeout_secs must not be negative: {val}"),
            })?;
        }
        if let Ok(val) = config.get_int("modeling.discretization") {
            settings.modeling.discretization = non_negative("modeling.discretization", val)?;
        }
        if let Ok(val) = config.get_int("modeling.attribute_count") {
            settings.modeling.attribute_count = non_negative("modeling.attribute_count", val)?;
        }
        if let Some(val) = string("modeling.default_target") {
            settings.modeling.default_target = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("modeling.class_targets") {
            settings.modeling.class_targets = val;
        }
        if let Some(val) = string("variables_file") {
            settings.variables_file = PathBuf::from(val);
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r##"# dtviz configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/dtviz/dtviz.toml   (defines your baseline)
#   Local:  ./.dtviz.toml                (per-directory additions)
#   Env:    DTVIZ_* environment variables, e.g. DTVIZ_SERVICE__BASE_URL
#
# Array Merge Semantics:
#   Global config REPLACES compiled defaults.
#   Local config UNIONS with global; "!name" removes an inherited item:
#     class_targets = ["O_SST", "!Calidad_Agua"]

# File listing the model variables, one per line
# variables_file = "~/.config/dtviz/variables.txt"

[service]
# base_url = "http://rapidminer.vicomtech.org/api/rest/process"
# username = "rapidminer"
# password = "rapidminer"
# timeout_secs = 120
# prediction_process = "EDAR_Cartuja_Prediccion_JSON"
# profile_process = "EDAR_Cartuja_Perfil_Out_JSON"
# simulation_process = "EDAR_Cartuja_Simulacion_JSON"
# optimization_process = "EDAR_Cartuja_Optimizacion_JSON"

[modeling]
# discretization = 5
# attribute_count = 4
# default_target = "Calidad_Agua"
# class_targets = ["Calidad_Agua"]

[display]
# window_start = "2018-01-01"
# window_end = "2019-01-31"
# horizon = "2019-02-01"

# [display.frame]
# x_min = -1.0
# x_max = 1.0
# y_top = 1.0
# y_bottom = 0.0

[palette]
# cluster_0 = "#7293cb"
# range1 = "#7293cb"
"##
        .to_string()
    }
}

fn non_negative(key: &str, val: i64) -> Result<u32, ApplicationError> {
    u32::try_from(val).map_err(|_| ApplicationError::Config {
        message: format!("{key} out of range: {val}"),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_defaults_when_created_then_match_service_contract() {
        let settings = Settings::default();
        assert_eq!(settings.modeling.discretization, 5);
        assert_eq!(settings.modeling.attribute_count, 4);
        assert_eq!(settings.modeling.class_targets, vec!["Calidad_Agua"]);
        assert_eq!(
            settings.display.window_end,
            NaiveDate::from_ymd_opt(2019, 1, 31).unwrap()
        );
        assert_eq!(settings.display.frame, LayoutFrame::default());
    }

    #[test]
    fn given_tilde_in_variables_file_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            variables_file: PathBuf::from("~/vars.txt"),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        let expanded = settings.variables_file.to_string_lossy();
        assert!(expanded.starts_with(&home), "not expanded: {}", expanded);
        assert!(!expanded.contains('~'));
    }

    #[test]
    fn test_merge_array_negation() {
        let base = vec!["a".to_string(), "b".to_string()];
        let overlay = vec!["!a".to_string(), "c".to_string()];
        assert_eq!(merge_array(&base, &overlay), vec!["b", "c"]);
    }

    #[test]
    fn given_local_class_targets_when_merging_then_union_with_negation() {
        let global = Settings::default();
        let local: RawSettings = toml::from_str(
            r#"
            [modeling]
            class_targets = ["O_SST", "!Calidad_Agua"]
            discretization = 3
            "#,
        )
        .unwrap();

        let merged = global.merge_with(&local);
        assert_eq!(merged.modeling.class_targets, vec!["O_SST"]);
        assert_eq!(merged.modeling.discretization, 3);
        assert_eq!(merged.modeling.attribute_count, 4);
    }

    #[test]
    fn given_global_class_targets_when_applying_then_replaces_defaults() {
        let global: RawSettings = toml::from_str(
            r##"
            [modeling]
            class_targets = ["Turbidez"]

            [display]
            window_start = "2018-06-01"

            [palette]
            cluster_0 = "#000000"
            "##,
        )
        .unwrap();

        let settings = Settings::default().apply_global(&global);
        assert_eq!(settings.modeling.class_targets, vec!["Turbidez"]);
        assert_eq!(
            settings.display.window_start,
            NaiveDate::from_ymd_opt(2018, 6, 1).unwrap()
        );
        assert_eq!(settings.palette["cluster_0"], "#000000");
    }

    #[test]
    fn given_config_source_when_applying_overrides_then_replaces_values() {
        let config = Config::builder()
            .set_override("service.base_url", "http://localhost:8080")
            .unwrap()
            .set_override("modeling.attribute_count", 6)
            .unwrap()
            .set_override("modeling.class_targets", vec!["A", "B"])
            .unwrap()
            .build()
            .unwrap();

        let settings = Settings::apply_overrides(Settings::default(), &config).unwrap();
        assert_eq!(settings.service.base_url, "http://localhost:8080");
        assert_eq!(settings.modeling.attribute_count, 6);
        assert_eq!(settings.modeling.class_targets, vec!["A", "B"]);
    }

    #[test]
    fn given_settings_when_serializing_then_round_trips_through_toml() {
        let settings = Settings::default();
        let text = settings.to_toml().unwrap();
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }
}
