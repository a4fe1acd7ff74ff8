//! `treepanel levels`: change the level order and checks, publish both arrays.

use std::path::Path;

use anyhow::{Result, bail};
use crossterm::style::Stylize;

use crate::levels::model::Level;
use crate::panel;
use crate::session::Session;

#[derive(Debug, Clone, Default)]
pub struct LevelOptions {
    pub type_slot: Option<usize>,
    pub company_slot: Option<usize>,
    pub toggle: Vec<Level>,
    pub reset: bool,
}

pub fn run(opts: &LevelOptions) -> Result<()> {
    let root = panel::find_root()?;
    run_in(&root, opts)
}

pub fn run_in(root: &Path, opts: &LevelOptions) -> Result<()> {
    let mut session = Session::load(root)?;
    apply(&mut session, opts)?;
    print_levels(&session);
    Ok(())
}

/// Reset first, then slots, then toggles. Publishes even when nothing was
/// asked for, so a fresh panel gets its initial arrays.
pub fn apply(session: &mut Session, opts: &LevelOptions) -> Result<()> {
    if opts.reset {
        session.reset_levels()?;
    }
    match (opts.type_slot, opts.company_slot) {
        (Some(kind), Some(company)) => session.set_slots(kind, company)?,
        (Some(slot), None) => session.move_level(Level::Type, checked_slot(slot)?)?,
        (None, Some(slot)) => session.move_level(Level::Company, checked_slot(slot)?)?,
        (None, None) => {}
    }
    for &level in &opts.toggle {
        session.toggle_level(level)?;
    }
    session.publish_levels()
}

fn checked_slot(slot: usize) -> Result<usize> {
    if slot > 3 {
        bail!("slot must be between 0 and 3, got {}", slot);
    }
    Ok(slot)
}

fn print_levels(session: &Session) {
    println!("  {}", "Level order:".cyan().bold());
    for (slot, level) in session.indices.order().iter().enumerate() {
        print_level(session, Some(slot), *level);
    }
    for level in Level::FIXED {
        print_level(session, None, level);
    }
    println!();
    println!(
        "  {} = {}",
        session.config.sorting_variable_name.as_str().cyan(),
        session.sorting_value()
    );
    println!(
        "  {} = {}",
        session.config.filters_variable_name.as_str().cyan(),
        session.filters_value()
    );
}

fn print_level(session: &Session, slot: Option<usize>, level: Level) {
    let check = if session.checks[level] { "[x]" } else { "[ ]" };
    let slot = slot.map(|s| s.to_string()).unwrap_or_else(|| "-".into());
    let label = if level.is_draggable() {
        level.label().bold()
    } else {
        level.label().reset()
    };
    println!("    {} {} {}", slot.dark_grey(), check, label);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::model::OptionIndices;
    use crate::parser::config::Config;
    use crate::variables::MemoryStore;

    fn session() -> Session {
        Session::mount(Config::default(), Ok(Vec::new()), Box::new(MemoryStore::new()))
    }

    #[test]
    fn no_options_publishes_defaults() {
        let mut s = session();
        apply(&mut s, &LevelOptions::default()).unwrap();
        assert_eq!(s.store().value("levelsorting"), Some("3,4,2,1"));
        assert_eq!(s.store().value("treefilters"), Some("1,1,1,1,1,1,1,1,1,1,1"));
    }

    #[test]
    fn both_slots_generate_order() {
        let mut s = session();
        let opts = LevelOptions {
            type_slot: Some(1),
            company_slot: Some(0),
            ..LevelOptions::default()
        };
        apply(&mut s, &opts).unwrap();
        assert_eq!(s.sorting_value(), "1,2,3,4");
    }

    #[test]
    fn single_slot_moves_one_level() {
        let mut s = session();
        let opts = LevelOptions {
            company_slot: Some(0),
            ..LevelOptions::default()
        };
        apply(&mut s, &opts).unwrap();
        assert_eq!(
            s.indices.order(),
            [Level::Company, Level::Continent, Level::Country, Level::Type]
        );
    }

    #[test]
    fn toggles_and_reset() {
        let mut s = session();
        let opts = LevelOptions {
            toggle: vec![Level::Well, Level::Company],
            ..LevelOptions::default()
        };
        apply(&mut s, &opts).unwrap();
        assert_eq!(s.filters_value(), "1,1,1,0,1,1,1,1,1,0,1");

        let reset = LevelOptions {
            reset: true,
            ..LevelOptions::default()
        };
        apply(&mut s, &reset).unwrap();
        assert_eq!(s.indices, OptionIndices::default());
        assert_eq!(s.filters_value(), "1,1,1,1,1,1,1,1,1,1,1");
    }

    #[test]
    fn colliding_slots_rejected() {
        let mut s = session();
        let opts = LevelOptions {
            type_slot: Some(2),
            company_slot: Some(2),
            ..LevelOptions::default()
        };
        assert!(apply(&mut s, &opts).is_err());
        assert!(apply(
            &mut s,
            &LevelOptions {
                type_slot: Some(7),
                ..LevelOptions::default()
            }
        )
        .is_err());
    }
}
