//! `treepanel select`: toggle nodes by id path and publish the query variable.

use std::path::Path;

use anyhow::{Result, bail};
use crossterm::style::Stylize;

use crate::panel;
use crate::query::encoder::Published;
use crate::session::Session;
use crate::tree::model::NodeId;

pub fn run(paths: &[String]) -> Result<()> {
    let root = panel::find_root()?;
    run_in(&root, paths)
}

pub fn run_in(root: &Path, paths: &[String]) -> Result<()> {
    let mut session = Session::load(root)?;
    if let Some(err) = &session.diagnostics.format_error {
        bail!("cannot select: {}", err);
    }
    let published = apply(&mut session, paths)?;
    let verb = if published.written {
        "Published".green().bold()
    } else {
        "Unchanged".dark_grey().bold()
    };
    println!(
        "  {} {} = {}",
        verb,
        session.config.variable_name.as_str().cyan(),
        published.query
    );
    Ok(())
}

/// Toggle every path in order, then publish once.
pub fn apply(session: &mut Session, paths: &[String]) -> Result<Published> {
    for path in paths {
        let node = resolve(session, path)?;
        session.state.toggle_select(node);
    }
    session.publish_selection()
}

fn resolve(session: &Session, path: &str) -> Result<NodeId> {
    let key: Vec<&str> = path.split('/').collect();
    match session.state.forest().find_by_key(&key) {
        Some(node) => Ok(node),
        None => bail!("no node at path `{}`", path),
    }
}
