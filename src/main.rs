mod commands;
mod error;
mod levels;
mod logging;
mod panel;
mod parser;
mod query;
mod session;
mod tree;
mod tui;
mod variables;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::levels::LevelOptions;
use crate::commands::tree::TreeOptions;
use crate::levels::model::Level;

#[derive(Parser)]
#[command(
    name = "treepanel",
    about = "Multi-level asset tree with exclusive selection, publishing filter variables"
)]
struct Cli {
    /// Write debug logs to panel/debug.log (stderr outside a panel)
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create panel/ with a default config, data table and variables
    Init,
    /// Print the tree as an outline (read-only)
    Tree {
        /// Filter by name; `*` and `?` are wildcards
        #[arg(long)]
        search: Option<String>,
        /// Expand every node before printing
        #[arg(long)]
        expand_all: bool,
        /// Only selected nodes and the open path to them
        #[arg(long)]
        show_selected: bool,
        /// Deepest level printed (roots are 0)
        #[arg(long)]
        depth: Option<usize>,
    },
    /// Toggle selection of nodes by `/`-joined id path and publish the query
    Select {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Reorder levels or toggle level checks and publish both arrays
    Levels {
        /// Slot (0-3) for the Type level
        #[arg(long)]
        type_slot: Option<usize>,
        /// Slot (0-3) for the Company level
        #[arg(long)]
        company_slot: Option<usize>,
        /// Flip a level's check, e.g. `well` or `production-station`
        #[arg(long, value_parser = parse_level)]
        toggle: Vec<Level>,
        /// Restore the default order with every level checked
        #[arg(long)]
        reset: bool,
    },
    /// Show diagnostics and current variable values
    Status,
    /// Open the interactive panel
    View {
        /// Launch with a built-in sample hierarchy (no panel required)
        #[arg(long)]
        demo: bool,
    },
    /// Open the interactive panel on the level settings
    Setup,
}

fn parse_level(s: &str) -> Result<Level, String> {
    s.parse()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    match cli.command {
        Command::Init => commands::init::run(),
        Command::Tree {
            search,
            expand_all,
            show_selected,
            depth,
        } => commands::tree::run(&TreeOptions {
            search,
            expand_all,
            show_selected,
            depth,
        }),
        Command::Select { paths } => commands::select::run(&paths),
        Command::Levels {
            type_slot,
            company_slot,
            toggle,
            reset,
        } => commands::levels::run(&LevelOptions {
            type_slot,
            company_slot,
            toggle,
            reset,
        }),
        Command::Status => commands::status::run(),
        Command::View { demo } => commands::view::run(demo),
        Command::Setup => commands::view::run_setup(),
    }
}

/// Logging is opt-in: `--debug`, or `debug: true` in the panel config.
fn init_logging(cli: &Cli) -> Result<()> {
    let demo = matches!(cli.command, Command::View { demo: true });
    let root = if demo { None } else { panel::find_root().ok() };
    let enabled = cli.debug || root.as_deref().is_some_and(panel::debug_enabled);
    if !enabled {
        return Ok(());
    }
    let log_file = root.as_deref().map(panel::log_path);
    logging::init(log_file.as_deref())
}
