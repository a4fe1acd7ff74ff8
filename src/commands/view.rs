use anyhow::Result;

use crate::tui::app;

pub fn run(demo: bool) -> Result<()> {
    app::run(demo, false)
}

pub fn run_setup() -> Result<()> {
    app::run(false, true)
}
