//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Decision tree layout and dashboard view models for a remote modeling service
#[derive(Parser, Debug)]
#[command(name = "dtviz")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Directory searched for .dtviz.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    /// Period id the dashboard is opened for; malformed values mean 0
    #[arg(long, global = true)]
    pub period: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Where the prediction document comes from.
#[derive(clap::Args, Debug, Clone)]
pub struct Source {
    /// Saved prediction document (JSON array of tables) instead of the service
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub input: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the decision tree of a model
    Tree {
        /// Target variable (default: modeling.default_target)
        target: Option<String>,
        #[command(flatten)]
        source: Source,
    },

    /// Print node and edge-label coordinates as JSON
    Layout {
        /// Target variable (default: modeling.default_target)
        target: Option<String>,
        #[command(flatten)]
        source: Source,
    },

    /// Create a model and summarize every chart (select target interactively if omitted)
    Model {
        /// Target variable
        target: Option<String>,
        #[command(flatten)]
        source: Source,
    },

    /// Show cluster forecast and outliers of the quality profile
    Profile {
        /// Saved profile document instead of the service
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        input: Option<PathBuf>,
    },

    /// List model variables
    Vars {
        /// Variables file (default: variables_file setting)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
    },

    /// Run a simulation with slider values (unset sliders keep their mean)
    Simulate {
        /// Target variable
        target: String,
        /// Slider value, NAME=VALUE
        #[arg(short, long = "set", value_name = "NAME=VALUE")]
        values: Vec<String>,
        /// Print the request without sending it
        #[arg(long)]
        dry_run: bool,
        #[command(flatten)]
        source: Source,
    },

    /// Run an optimization with restrictions
    Optimize {
        /// Target variable
        target: String,
        /// Objective: min or max
        #[arg(short, long, default_value = "min")]
        objective: String,
        /// Target value (default: last possible target)
        #[arg(long)]
        value: Option<String>,
        /// Restriction, VAR:OP:VALUE[:OP:VALUE] with OP one of < ≤ <= = ≥ >= > -
        #[arg(short, long = "restrict", value_name = "RESTRICTION")]
        restrictions: Vec<String>,
        /// Print the request without sending it
        #[arg(long)]
        dry_run: bool,
        #[command(flatten)]
        source: Source,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,

    /// Edit config file
    Edit {
        /// Edit global config
        #[arg(short, long)]
        global: bool,
    },
}
