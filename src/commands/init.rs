//! `treepanel init`: create the `panel/` directory in the current directory.

use std::fs;
use std::path::Path;

use anyhow::{Result, bail};
use crossterm::style::Stylize;

use crate::panel;
use crate::parser::config::{self, Config};
use crate::parser::table;
use crate::variables::file as variable_file;
use crate::variables::{MemoryStore, Variable};

pub fn run() -> Result<()> {
    let root = std::env::current_dir()?;
    run_in(&root)
}

pub fn run_in(root: &Path) -> Result<()> {
    if panel::config_path(root).exists() {
        bail!("treepanel is already initialised (panel/config.panel exists)");
    }
    fs::create_dir_all(panel::panel_dir(root))?;

    let cfg = Config::default();
    fs::write(panel::config_path(root), config::serialize(&cfg))?;
    println!("  {} panel/config.panel", "Created".green().bold());

    let data = panel::data_path(root);
    if !data.exists() {
        fs::write(&data, table::header(&cfg.field))?;
        println!("  {} panel/data.tsv", "Created".green().bold());
    }

    let vars = panel::variables_path(root);
    if !vars.exists() {
        fs::write(&vars, variable_file::serialize(&default_variables(&cfg)))?;
        println!("  {} panel/variables.panel", "Created".green().bold());
    }

    println!(
        "  {} add rows to panel/data.tsv, then run `treepanel view`",
        "Next:".cyan().bold()
    );
    Ok(())
}

fn default_variables(cfg: &Config) -> MemoryStore {
    let mut store = MemoryStore::new();
    store.insert(&cfg.variable_name, Variable::textbox(&cfg.default_value));
    store.insert(&cfg.sorting_variable_name, Variable::textbox(""));
    store.insert(&cfg.filters_variable_name, Variable::textbox(""));
    store
}
