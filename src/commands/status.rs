//! `treepanel status`: diagnostics and current variable values (read-only).

use std::path::Path;

use anyhow::Result;
use crossterm::style::Stylize;

use crate::panel;
use crate::session::Session;

pub fn run() -> Result<()> {
    let root = panel::find_root()?;
    run_in(&root)
}

pub fn run_in(root: &Path) -> Result<()> {
    let session = Session::load(root)?;
    let report = compute(&session);
    print_report(&report);
    Ok(())
}

#[derive(Debug, Default)]
pub struct StatusReport {
    pub nodes: usize,
    pub roots: usize,
    pub selected: usize,
    pub problems: Vec<String>,
    /// Effective query template source.
    pub template: String,
    /// `(name, stored value, value the panel would publish now)`.
    pub variables: Vec<(String, Option<String>, String)>,
}

impl StatusReport {
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
            && self
                .variables
                .iter()
                .all(|(_, stored, current)| stored.as_deref() == Some(current.as_str()))
    }
}

pub fn compute(session: &Session) -> StatusReport {
    let forest = session.state.forest();
    let mut problems = session.diagnostics.messages();
    let query = match session.query() {
        Ok(query) => query,
        Err(err) => {
            problems.push(err.to_string());
            String::new()
        }
    };
    let cfg = &session.config;
    let current = [
        (&cfg.variable_name, query),
        (&cfg.sorting_variable_name, session.sorting_value()),
        (&cfg.filters_variable_name, session.filters_value()),
    ];
    let variables = current
        .into_iter()
        .map(|(name, value)| {
            let stored = session.store().value(name).map(str::to_string);
            (name.clone(), stored, value)
        })
        .collect();

    StatusReport {
        nodes: forest.len(),
        roots: forest.roots().len(),
        selected: session.state.selected().len(),
        problems,
        template: session.template_source().to_string(),
        variables,
    }
}

fn print_report(r: &StatusReport) {
    println!(
        "  {} {} nodes, {} roots, {} selected",
        "Tree:".cyan().bold(),
        r.nodes.to_string().green(),
        r.roots,
        r.selected
    );

    if !r.problems.is_empty() {
        println!("\n  {}", "Problems:".yellow().bold());
        for p in &r.problems {
            println!("    {}", p);
        }
    }

    println!("\n  {} {}", "Template:".cyan().bold(), r.template.as_str().dark_grey());

    println!("\n  {}", "Variables:".cyan().bold());
    for (name, stored, current) in &r.variables {
        match stored {
            Some(v) if v == current => println!("    {} = {}", name, v),
            Some(v) => println!(
                "    {} = {}  {}",
                name,
                v,
                format!("(panel would publish `{}`)", current).dark_grey()
            ),
            None => println!("    {} {}", name, "(not defined)".red()),
        }
    }

    if r.is_clean() {
        println!("\n  {}", "Clean.".green().bold());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::config::Config;
    use crate::tree::builder::DuplicatePolicy;
    use crate::variables::{MemoryStore, Variable};

    fn store(query: &str) -> MemoryStore {
        let mut store = MemoryStore::new();
        store.insert("treequery", Variable::textbox(query));
        store.insert("levelsorting", Variable::textbox("3,4,2,1"));
        store.insert("treefilters", Variable::textbox("1,1,1,1,1,1,1,1,1,1,1"));
        store
    }

    fn rows(r: &[&str]) -> Vec<String> {
        r.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn clean_panel() {
        let session = Session::mount(
            Config::default(),
            Ok(rows(&["1,1a", "2"])),
            Box::new(store("1a in (1a)")),
        );
        let report = compute(&session);
        assert_eq!(report.nodes, 3);
        assert_eq!(report.roots, 2);
        assert_eq!(report.selected, 1);
        assert_eq!(report.template, crate::query::template::DEFAULT_TEMPLATE);
        assert!(report.is_clean(), "{:?}", report);
    }

    #[test]
    fn reports_format_error_and_missing_variable() {
        let cfg = Config {
            on_duplicate: DuplicatePolicy::Error,
            ..Config::default()
        };
        let mut vars = store("");
        vars.insert(
            "other",
            Variable {
                kind: crate::variables::VariableKind::Query,
                value: String::new(),
            },
        );
        let cfg = Config {
            filters_variable_name: "other".into(),
            ..cfg
        };
        let session = Session::mount(cfg, Ok(rows(&["1:a", "1:b"])), Box::new(vars));
        let report = compute(&session);
        assert_eq!(report.nodes, 0);
        assert_eq!(report.problems.len(), 2);
        assert!(!report.is_clean());
    }

    #[test]
    fn stale_value_is_not_clean() {
        let session = Session::mount(
            Config::default(),
            Ok(rows(&["1"])),
            Box::new(store("999 in (999)")),
        );
        let report = compute(&session);
        assert_eq!(report.selected, 0);
        assert!(!report.is_clean());
    }
}
