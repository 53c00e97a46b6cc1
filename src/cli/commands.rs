//! Command dispatch and terminal output

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use colored::Colorize;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::application::services::{DashboardService, ModelView, ProfileView};
use crate::application::{parse_period, ApplicationError};
use crate::cli::args::{Cli, Commands, ConfigCommands, Source};
use crate::cli::output;
use crate::cli::render::{bar, paint, ToTermTree};
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::optimization::{Condition, Objective};
use crate::domain::variables::ModelVariables;
use crate::domain::TargetKind;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::traits::{
    Editor, EnvironmentEditor, FileSystem, RealFileSystem, SelectionItem, Selector, SkimSelector,
};

/// Execute the parsed command line.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see `dtviz --help`".to_string(),
        ));
    };

    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let config_dir = cli
        .config_dir
        .clone()
        .or_else(|| std::env::current_dir().ok());
    let settings = Settings::load(config_dir.as_deref())?;
    let period = parse_period(cli.period.as_deref());
    debug!("period: {}", period);

    match command {
        Commands::Tree { target, source } => {
            let ctx = Context::new(settings, source, period)?;
            cmd_tree(&ctx.dashboard, &ctx.target(target))
        }
        Commands::Layout { target, source } => {
            let ctx = Context::new(settings, source, period)?;
            cmd_layout(&ctx.dashboard, &ctx.target(target))
        }
        Commands::Model { target, source } => {
            let ctx = Context::new(settings, source, period)?;
            cmd_model(&ctx.dashboard, target.as_deref(), &SkimSelector)
        }
        Commands::Profile { input } => {
            let source = Source {
                input: input.clone(),
            };
            let ctx = Context::new(settings, &source, period)?;
            cmd_profile(&ctx.dashboard)
        }
        Commands::Vars { file } => {
            let container = ServiceContainer::new(settings)?;
            cmd_vars(&container.dashboard(period), file.as_deref())
        }
        Commands::Simulate {
            target,
            values,
            dry_run,
            source,
        } => {
            let ctx = Context::new(settings.clone(), source, period)?;
            let sender = sender(settings, period, *dry_run)?;
            cmd_simulate(&ctx.dashboard, sender.as_ref(), target, values)
        }
        Commands::Optimize {
            target,
            objective,
            value,
            restrictions,
            dry_run,
            source,
        } => {
            let ctx = Context::new(settings.clone(), source, period)?;
            let sender = sender(settings, period, *dry_run)?;
            let request = OptimizeArgs {
                objective,
                value: value.as_deref(),
                restrictions,
            };
            cmd_optimize(&ctx.dashboard, sender.as_ref(), target, &request)
        }
        Commands::Config { command } => cmd_config(command, &settings, config_dir.as_deref()),
        Commands::Completion { .. } => Ok(()),
    }
}

/// Dashboard wired to the service or to a saved document.
struct Context {
    dashboard: DashboardService,
}

impl Context {
    fn new(settings: Settings, source: &Source, period: u32) -> CliResult<Self> {
        let container = match &source.input {
            Some(path) => ServiceContainer::from_document(settings, path),
            None => ServiceContainer::new(settings)?,
        };
        Ok(Self {
            dashboard: container.dashboard(period),
        })
    }

    fn target(&self, target: &Option<String>) -> String {
        target
            .clone()
            .unwrap_or_else(|| self.dashboard.settings().modeling.default_target.clone())
    }
}

/// Service used to send simulation/optimization requests, none on dry runs.
fn sender(settings: Settings, period: u32, dry_run: bool) -> CliResult<Option<DashboardService>> {
    if dry_run {
        return Ok(None);
    }
    Ok(Some(ServiceContainer::new(settings)?.dashboard(period)))
}

fn to_json<T: Serialize>(value: &T) -> CliResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| {
        ApplicationError::OperationFailed {
            context: "encode JSON".to_string(),
            source: Box::new(e),
        }
        .into()
    })
}

#[instrument(level = "debug", skip(dashboard))]
fn cmd_tree(dashboard: &DashboardService, target: &str) -> CliResult<()> {
    let document = dashboard.fetch_prediction(target)?;
    let (tree, _) = dashboard.build_tree(target, &document)?;

    output::header(&format!(
        "{} ({} nodes, {} edges, depth {})",
        target,
        tree.len(),
        tree.edges().len(),
        tree.depth()
    ));
    for root in tree.to_term_trees() {
        output::info(&root);
    }
    Ok(())
}

#[instrument(level = "debug", skip(dashboard))]
fn cmd_layout(dashboard: &DashboardService, target: &str) -> CliResult<()> {
    let document = dashboard.fetch_prediction(target)?;
    let (_, layout) = dashboard.build_tree(target, &document)?;
    output::info(&to_json(&layout)?);
    Ok(())
}

fn cmd_model(
    dashboard: &DashboardService,
    target: Option<&str>,
    selector: &dyn Selector,
) -> CliResult<()> {
    let target = match target {
        Some(t) => t.to_string(),
        None => {
            let variables = dashboard.load_variables()?;
            match select_variable(&variables, selector)? {
                Some(t) => t,
                None => {
                    output::warning("no model selected");
                    return Ok(());
                }
            }
        }
    };

    let view = dashboard.create_model(&target)?;
    print_model(&view);
    Ok(())
}

fn select_variable(
    variables: &ModelVariables,
    selector: &dyn Selector,
) -> CliResult<Option<String>> {
    let items: Vec<SelectionItem> = variables
        .names()
        .iter()
        .map(|name| SelectionItem {
            display: name.clone(),
            value: name.clone(),
        })
        .collect();
    let selected = selector
        .select_one(&items, "Model variable > ")
        .map_err(InfraError::Selector)?;
    Ok(selected.map(|item| item.value))
}

fn print_model(view: &ModelView) {
    let kind = match view.kind {
        TargetKind::Class => "class",
        TargetKind::Range => "range",
    };
    output::header(&format!("Model {} ({})", view.target, kind));

    output::section("Decision tree");
    for root in view.tree.to_term_trees() {
        output::info(&root);
    }

    output::section("Confusion matrix");
    let total = view.confusion.total();
    let correct = view.confusion.correct_total();
    let accuracy = if total > 0.0 { correct / total * 100.0 } else { 0.0 };
    output::detail(&format!(
        "{correct} of {total} correct ({accuracy:.1}%), predicted: {}",
        view.confusion.predicted.join(", ")
    ));
    for (a, actual) in view.confusion.actual.iter().enumerate() {
        let row: Vec<String> = view.confusion.counts[a]
            .iter()
            .map(|v| format!("{v:>6}"))
            .collect();
        output::detail(&format!("{actual:>12} {}", row.join(" ")));
    }

    output::section("Attribute weights");
    let max_weight = view.weights.iter().map(|w| w.weight).fold(0.0, f64::max);
    for w in &view.weights {
        output::detail(&format!(
            "{:<24} {:>6.3} {}",
            w.attribute,
            w.weight,
            paint(&bar(w.weight, max_weight, 20), w.color)
        ));
    }

    output::section("Daily predictions");
    match view.daily.mean_error() {
        Some(error) => output::detail(&format!(
            "{} days, {} bins, mean error {error:.2}",
            view.daily.points.len(),
            view.daily.bin_count
        )),
        None => output::detail("no days in window"),
    }

    output::section("Simulation");
    for row in &view.simulation.rows {
        output::detail(&format!(
            "{:<24} {} [{:.2} .. {:.2}]",
            row.spec.title, row.text, row.spec.start, row.spec.end
        ));
    }

    output::section("Optimization");
    output::detail(&format!(
        "targets: {} (default {})",
        view.optimization.possible_targets.join(", "),
        view.optimization.selected.green()
    ));
}

#[instrument(level = "debug", skip(dashboard))]
fn cmd_profile(dashboard: &DashboardService) -> CliResult<()> {
    let profile = dashboard.load_profile()?;
    print_profile(&profile);
    Ok(())
}

fn print_profile(profile: &ProfileView) {
    output::header(&format!("Quality profile (forecast from {})", profile.horizon));
    for (title, series) in [("Forecast", &profile.forecast), ("Outliers", &profile.outliers)] {
        output::section(title);
        for s in series {
            let last = s
                .points
                .last()
                .map(|p| format!("last {:.2} at {}", p.value, p.at))
                .unwrap_or_else(|| "no data".to_string());
            output::detail(&format!(
                "{} {:>4} points, {}",
                paint(&s.legend, s.color),
                s.points.len(),
                last
            ));
        }
    }
}

fn cmd_vars(dashboard: &DashboardService, file: Option<&Path>) -> CliResult<()> {
    let variables = match file {
        Some(path) => dashboard.load_variables_from(path)?,
        None => dashboard.load_variables()?,
    };
    let preferred = &dashboard.settings().modeling.default_target;
    let default = variables.default_selection(preferred);
    for name in variables.names() {
        if Some(name.as_str()) == default {
            output::info(&format!("{} {}", name.green(), "*".green()));
        } else {
            output::info(name);
        }
    }
    Ok(())
}

fn cmd_simulate(
    dashboard: &DashboardService,
    sender: Option<&DashboardService>,
    target: &str,
    values: &[String],
) -> CliResult<()> {
    let view = dashboard.create_model(target)?;
    let mut panel = view.simulation;

    for assignment in values {
        let (name, value) = assignment
            .split_once('=')
            .ok_or_else(|| CliError::InvalidArgs(format!("expected NAME=VALUE: {assignment}")))?;
        let row = panel
            .row_mut(name.trim())
            .ok_or_else(|| CliError::InvalidArgs(format!("no slider for {name}")))?;
        row.set_text(value);
    }

    output::info(&to_json(&panel.simulate())?);
    if let Some(sender) = sender {
        let tables = sender.simulate(&panel)?;
        output::success(&format!("simulation sent, {} tables returned", tables.len()));
    }
    Ok(())
}

struct OptimizeArgs<'a> {
    objective: &'a str,
    value: Option<&'a str>,
    restrictions: &'a [String],
}

/// One `VAR:OP:VALUE[:OP:VALUE]` restriction.
#[derive(Debug, PartialEq)]
struct Restriction {
    variable: String,
    low: Condition,
    low_value: String,
    high: Condition,
    high_value: String,
}

fn parse_restriction(spec: &str) -> CliResult<Restriction> {
    let invalid = || CliError::InvalidArgs(format!("expected VAR:OP:VALUE[:OP:VALUE]: {spec}"));
    let parts: Vec<&str> = spec.split(':').collect();
    let (variable, low, low_value, high, high_value) = match parts.as_slice() {
        [var, op, val] => (*var, *op, *val, "-", ""),
        [var, op, val, op2, val2] => (*var, *op, *val, *op2, *val2),
        _ => return Err(invalid()),
    };
    if variable.is_empty() {
        return Err(invalid());
    }
    let high: Condition = high.parse()?;
    if high == Condition::Eq {
        return Err(CliError::InvalidArgs(format!(
            "'=' is not allowed as second condition: {spec}"
        )));
    }
    Ok(Restriction {
        variable: variable.to_string(),
        low: low.parse()?,
        low_value: low_value.to_string(),
        high,
        high_value: high_value.to_string(),
    })
}

fn cmd_optimize(
    dashboard: &DashboardService,
    sender: Option<&DashboardService>,
    target: &str,
    args: &OptimizeArgs<'_>,
) -> CliResult<()> {
    let view = dashboard.create_model(target)?;
    let mut form = view.optimization;
    form.objective = args.objective.parse::<Objective>()?;
    if let Some(value) = args.value {
        if !form.possible_targets.iter().any(|t| t == value) {
            output::warning(&format!("{value} is not among the observed targets"));
        }
        form.selected = value.to_string();
    }

    for spec in args.restrictions {
        let restriction = parse_restriction(spec)?;
        let row = form.row_mut(&restriction.variable).ok_or_else(|| {
            CliError::InvalidArgs(format!(
                "{} is not an influential variable",
                restriction.variable
            ))
        })?;
        row.low = restriction.low;
        row.low_value = restriction.low_value;
        row.high = restriction.high;
        row.high_value = restriction.high_value;
    }

    output::info(&to_json(&form.request())?);
    if let Some(sender) = sender {
        let tables = sender.optimize(&form)?;
        output::success(&format!("optimization sent, {} tables returned", tables.len()));
    }
    Ok(())
}

fn config_target(global: bool, local_dir: Option<&Path>) -> CliResult<PathBuf> {
    if global {
        global_config_path()
            .ok_or_else(|| CliError::Usage("cannot determine global config directory".into()))
    } else {
        let dir = local_dir
            .map(Path::to_path_buf)
            .ok_or_else(|| CliError::Usage("cannot determine local config directory".into()))?;
        Ok(local_config_path(&dir))
    }
}

fn cmd_config(
    command: &ConfigCommands,
    settings: &Settings,
    local_dir: Option<&Path>,
) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            let mark = |p: &Path| if p.exists() { "exists" } else { "missing" };
            if let Some(global) = global_config_path() {
                output::action("global", &format!("{} ({})", global.display(), mark(&global)));
            }
            if let Some(dir) = local_dir {
                let local = local_config_path(dir);
                output::action("local", &format!("{} ({})", local.display(), mark(&local)));
            }
        }
        ConfigCommands::Init { global } => {
            let path = config_target(*global, local_dir)?;
            init_config(&RealFileSystem, &path)?;
            output::success(&format!("created {}", path.display()));
        }
        ConfigCommands::Edit { global } => {
            let path = config_target(*global, local_dir)?;
            if !path.exists() {
                return Err(CliError::Usage(format!(
                    "no config at {}, run `dtviz config init{}` first",
                    path.display(),
                    if *global { " --global" } else { "" }
                )));
            }
            EnvironmentEditor.open(&path).map_err(|e| InfraError::Editor {
                message: e.to_string(),
            })?;
        }
    }
    Ok(())
}

/// Write the commented settings template to `path`; never overwrites.
fn init_config(fs: &dyn FileSystem, path: &Path) -> CliResult<()> {
    if fs.exists(path) {
        return Err(CliError::Usage(format!(
            "config already exists: {}",
            path.display()
        )));
    }
    fs.ensure_parent(path)
        .map_err(|e| InfraError::io(format!("create parent of {}", path.display()), e))?;
    fs.write(path, &Settings::template())
        .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    struct FixedSelector(Option<&'static str>);

    impl Selector for FixedSelector {
        fn select_one(
            &self,
            items: &[SelectionItem],
            _prompt: &str,
        ) -> Result<Option<SelectionItem>, String> {
            Ok(self
                .0
                .and_then(|want| items.iter().find(|i| i.value == want).cloned()))
        }
    }

    #[rstest]
    #[case("pH:>:6", Condition::Gt, "6", Condition::None, "")]
    #[case("Caudal:≥:10:<:20", Condition::Ge, "10", Condition::Lt, "20")]
    #[case("DQO:<=:x", Condition::Le, "x", Condition::None, "")]
    fn given_restriction_spec_when_parsing_then_splits_conditions(
        #[case] spec: &str,
        #[case] low: Condition,
        #[case] low_value: &str,
        #[case] high: Condition,
        #[case] high_value: &str,
    ) {
        let r = parse_restriction(spec).unwrap();
        assert_eq!(r.low, low);
        assert_eq!(r.low_value, low_value);
        assert_eq!(r.high, high);
        assert_eq!(r.high_value, high_value);
    }

    #[rstest]
    #[case("pH")]
    #[case("pH:>")]
    #[case(":>:6")]
    #[case("pH:>:6:=:7")]
    #[case("pH:~:6")]
    fn given_bad_restriction_when_parsing_then_errors(#[case] spec: &str) {
        assert!(parse_restriction(spec).is_err());
    }

    #[test]
    fn given_selector_when_choosing_variable_then_returns_value() {
        let variables = ModelVariables::parse("Calidad_Agua\nO_DQO\n");
        let picked = select_variable(&variables, &FixedSelector(Some("O_DQO"))).unwrap();
        assert_eq!(picked.as_deref(), Some("O_DQO"));

        let cancelled = select_variable(&variables, &FixedSelector(None)).unwrap();
        assert_eq!(cancelled, None);
    }

    #[test]
    fn given_missing_config_when_init_then_writes_template_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("dtviz.toml");

        init_config(&RealFileSystem, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, Settings::template());
        let again = init_config(&RealFileSystem, &path);
        assert!(matches!(again, Err(CliError::Usage(_))));
    }
}
