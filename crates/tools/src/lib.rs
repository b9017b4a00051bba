//! `moqua` command line: load catalog trees, replay checks and range filters
//! through the explorer and print the resulting tree state.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{Parser, Subcommand, ValueEnum};
use explorer::{
    Axis, CheckMode, ConfigError, Explorer, ExplorerConfig, ExplorerError, ExplorerEvent, Input,
    TreeSide, TreeSnapshot,
};
use foundation::NodeId;
use persist::InMemoryStateStore;
use tracing::{info, warn};
use tree::{TreeError, TreeSpec};

const PAGE: &str = "moqua-cli";

#[derive(Debug)]
pub enum CliError {
    Io { path: PathBuf, source: std::io::Error },
    Tree(TreeError),
    Config(ConfigError),
    Explorer(ExplorerError),
    Encode(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Io { path, source } => write!(f, "{}: {source}", path.display()),
            CliError::Tree(e) => write!(f, "{e}"),
            CliError::Config(e) => write!(f, "{e}"),
            CliError::Explorer(e) => write!(f, "{e}"),
            CliError::Encode(e) => write!(f, "json encode error: {e}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<TreeError> for CliError {
    fn from(e: TreeError) -> Self {
        CliError::Tree(e)
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<ExplorerError> for CliError {
    fn from(e: ExplorerError) -> Self {
        CliError::Explorer(e)
    }
}

#[derive(Parser, Debug)]
#[command(name = "moqua", version, about = "Inspect linked variable/dataset catalog trees")]
pub struct Cli {
    /// Variable tree JSON
    #[arg(long)]
    pub variables: PathBuf,

    /// Dataset tree JSON
    #[arg(long)]
    pub datasets: PathBuf,

    /// Explorer config JSON (defaults to the Monterey Bay deployment)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the full explorer state as JSON instead of outlines
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print both trees as loaded
    Tree,

    /// Check nodes and show the resulting gray state of the partner tree
    Check {
        /// Node to check, as `variables:<id>` or `datasets:<id>` (repeatable)
        #[arg(long = "node", required = true)]
        nodes: Vec<Target>,

        #[arg(long, value_enum, default_value_t = ModeArg::Any)]
        mode: ModeArg,
    },

    /// Zoom the map and set slider ranges, then show the underlined nodes
    Filter {
        /// Map area to zoom to: north,west,south,east
        #[arg(long)]
        area: Option<String>,

        /// Time range start, e.g. 2003-08-05
        #[arg(long)]
        time_start: Option<String>,

        #[arg(long)]
        time_end: Option<String>,

        #[arg(long)]
        depth_start: Option<String>,

        #[arg(long)]
        depth_end: Option<String>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Any,
    All,
}

impl From<ModeArg> for CheckMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Any => CheckMode::Any,
            ModeArg::All => CheckMode::All,
        }
    }
}

/// A node in one of the two trees.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    pub side: TreeSide,
    pub id: NodeId,
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (side, id) = s
            .split_once(':')
            .ok_or_else(|| format!("expected <tree>:<id>, got {s:?}"))?;
        let side = match side {
            "variables" | "v" => TreeSide::Variables,
            "datasets" | "d" => TreeSide::Datasets,
            other => return Err(format!("unknown tree {other:?}")),
        };
        if id.is_empty() {
            return Err("empty node id".to_string());
        }
        Ok(Target {
            side,
            id: NodeId::from(id),
        })
    }
}

fn read(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_area(text: &str) -> Option<[f64; 4]> {
    let parts: Vec<f64> = text
        .split(',')
        .map(|p| p.trim().parse().ok())
        .collect::<Option<_>>()?;
    parts.try_into().ok()
}

/// Runs `cli` and returns what the binary prints.
pub fn run(cli: &Cli) -> Result<String, CliError> {
    let config = match &cli.config {
        Some(path) => ExplorerConfig::from_json(&read(path)?)?,
        None => ExplorerConfig::default(),
    };
    let variables = TreeSpec::from_json(&read(&cli.variables)?)?;
    let datasets = TreeSpec::from_json(&read(&cli.datasets)?)?;
    let mut explorer = Explorer::new(
        config,
        &variables,
        &datasets,
        Box::new(InMemoryStateStore::new()),
        PAGE,
    )?;
    explorer.enable();

    let mut inputs = Vec::new();
    match &cli.command {
        Command::Tree => {}
        Command::Check { nodes, mode } => {
            inputs.push(Input::SetCheckMode { mode: (*mode).into() });
            for t in nodes {
                inputs.push(Input::ToggleCheck {
                    side: t.side,
                    id: t.id.clone(),
                });
            }
        }
        Command::Filter {
            area,
            time_start,
            time_end,
            depth_start,
            depth_end,
        } => {
            if let Some(text) = area {
                match parse_area(text) {
                    Some([north, west, south, east]) => {
                        inputs.push(Input::SetSelection {
                            north,
                            west,
                            south,
                            east,
                        });
                        inputs.push(Input::ZoomInMap);
                    }
                    None => warn!(%text, "ignoring malformed --area"),
                }
            }
            let texts = [
                (Axis::Time, time_start, true),
                (Axis::Time, time_end, false),
                (Axis::Depth, depth_start, true),
                (Axis::Depth, depth_end, false),
            ];
            for (slider, text, start) in texts {
                let Some(text) = text.clone() else { continue };
                inputs.push(if start {
                    Input::SetSliderStartText { slider, text }
                } else {
                    Input::SetSliderEndText { slider, text }
                });
            }
        }
    }
    for input in inputs {
        explorer.dispatch(input);
    }
    let last_overlay = explorer
        .drain_events()
        .into_iter()
        .filter_map(|e| match e.payload {
            ExplorerEvent::OverlayRefresh(req) => Some(req.to_query()),
            _ => None,
        })
        .last();
    info!(command = ?cli.command, "done");

    if cli.json {
        return serde_json::to_string_pretty(&explorer.snapshot()).map_err(CliError::Encode);
    }
    let mut out = String::new();
    for side in [TreeSide::Variables, TreeSide::Datasets] {
        let snap = TreeSnapshot::of(explorer.tree(side));
        out.push_str(&format!("# {}\n", snap.name));
        out.push_str(&snap.to_outline());
    }
    if let Some(query) = last_overlay {
        out.push_str(&format!("overlay: {query}\n"));
    }
    Ok(out)
}
