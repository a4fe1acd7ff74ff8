//! `treepanel tree`: print the rendered view as an indented outline (read-only).

use std::path::Path;

use anyhow::Result;
use crossterm::style::Stylize;

use crate::panel;
use crate::session::Session;
use crate::tree::model::{Forest, SearchState};
use crate::tree::visibility::ViewRow;

#[derive(Debug, Clone, Default)]
pub struct TreeOptions {
    pub search: Option<String>,
    pub expand_all: bool,
    pub show_selected: bool,
    /// Deepest row printed; roots are depth 0.
    pub depth: Option<usize>,
}

pub fn run(opts: &TreeOptions) -> Result<()> {
    let root = panel::find_root()?;
    run_in(&root, opts)
}

pub fn run_in(root: &Path, opts: &TreeOptions) -> Result<()> {
    let mut session = Session::load(root)?;
    for message in session.diagnostics.messages() {
        eprintln!("  {} {}", "warning:".yellow().bold(), message);
    }
    let rows = view(&mut session, opts);
    if rows.is_empty() {
        println!("  {}", "No rows.".dark_grey());
        return Ok(());
    }
    let forest = session.state.forest();
    for row in &rows {
        print_row(forest, row);
    }
    Ok(())
}

/// Apply the options to the mounted state and return the rows to print.
pub fn view(session: &mut Session, opts: &TreeOptions) -> Vec<ViewRow> {
    if opts.expand_all {
        session.state.expand_all();
    }
    if let Some(text) = &opts.search {
        session.state.set_search(text);
    }
    session.state.set_show_selected(opts.show_selected);
    session
        .state
        .rows()
        .into_iter()
        .filter(|r| opts.depth.is_none_or(|d| r.depth <= d))
        .collect()
}

pub fn outline_line(forest: &Forest, row: &ViewRow) -> String {
    let node = forest.node(row.node);
    let marker = match (row.has_children, row.open) {
        (false, _) => ' ',
        (true, true) => '▾',
        (true, false) => '▸',
    };
    let check = if node.selected { "[x]" } else { "[ ]" };
    let indent = "  ".repeat(row.depth);
    if node.kind == node.id {
        format!("{}{} {} {}", indent, marker, check, node.name)
    } else {
        format!("{}{} {} {} ({})", indent, marker, check, node.name, node.kind)
    }
}

fn print_row(forest: &Forest, row: &ViewRow) {
    let node = forest.node(row.node);
    let line = outline_line(forest, row);
    match (node.selected, node.search) {
        (true, _) => println!("  {}", line.green().bold()),
        (false, SearchState::Match) => println!("  {}", line.yellow()),
        (false, SearchState::AncestorOfMatch) => println!("  {}", line.dark_grey()),
        _ => println!("  {}", line),
    }
}
