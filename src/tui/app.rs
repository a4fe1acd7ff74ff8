use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::{Frame, Terminal};
use tracing::debug;

use crate::panel;
use crate::parser::config::Config;
use crate::session::{self, Session};
use crate::tree::visibility::ViewRow;
use crate::tui::debounce::Debouncer;
use crate::tui::input::{self, Action, Direction};
use crate::tui::render::{self, PanelRenderData, TreeRow};
use crate::tui::settings::{self, SettingsEvent, SettingsPanelState};
use crate::variables::{MemoryStore, Variable};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

struct AppState {
    session: Session,
    root: Option<PathBuf>,
    rows: Vec<ViewRow>,
    rows_version: Option<u64>,
    cursor: usize,
    scroll: usize,
    tree_view_rows: usize,
    search_buffer: String,
    search_active: bool,
    debouncer: Debouncer,
    show_help: bool,
    show_settings: bool,
    settings_state: SettingsPanelState,
    status_message: Option<String>,
    query: String,
}

impl AppState {
    fn load(demo: bool, open_settings: bool) -> Result<Self> {
        let (session, root, status_message) = if demo {
            let session = Session::mount(demo_config(), Ok(demo_rows()), Box::new(demo_store()));
            (
                session,
                None,
                Some("demo mode: variables are in-memory only".to_string()),
            )
        } else {
            let root = panel::find_root()?;
            (Session::load(&root)?, Some(root), None)
        };
        Ok(Self::new(session, root, open_settings, status_message))
    }

    fn new(
        session: Session,
        root: Option<PathBuf>,
        open_settings: bool,
        status_message: Option<String>,
    ) -> Self {
        let mut app = Self {
            session,
            root,
            rows: Vec::new(),
            rows_version: None,
            cursor: 0,
            scroll: 0,
            tree_view_rows: 0,
            search_buffer: String::new(),
            search_active: false,
            debouncer: Debouncer::default(),
            show_help: false,
            show_settings: open_settings,
            settings_state: SettingsPanelState::default(),
            status_message,
            query: String::new(),
        };
        app.refresh_rows();
        app.refresh_query();
        app
    }

    /// Recompute the flattened rows when the state changed since last time.
    fn refresh_rows(&mut self) {
        let version = self.session.state.version();
        if self.rows_version == Some(version) {
            return;
        }
        self.rows = self.session.state.rows();
        self.rows_version = Some(version);
        self.cursor = self.cursor.min(self.rows.len().saturating_sub(1));
    }

    fn refresh_query(&mut self) {
        self.query = match self.session.query() {
            Ok(query) => query,
            Err(err) => err.to_string(),
        };
    }

    fn draw(&mut self, frame: &mut Frame) {
        self.refresh_rows();
        let alerts = self.session.diagnostics.messages();
        let (_, areas) = render::layout(frame.area(), alerts.len());
        self.tree_view_rows = areas.tree.height as usize;
        self.ensure_cursor_visible();

        let forest = self.session.state.forest();
        let rows = self
            .rows
            .iter()
            .map(|r| {
                let node = forest.node(r.node);
                TreeRow {
                    depth: r.depth,
                    has_children: r.has_children,
                    open: r.open,
                    selected: node.selected,
                    name: node.name.clone(),
                    kind: node.kind.clone(),
                    search: node.search,
                }
            })
            .collect::<Vec<_>>();

        let data = PanelRenderData {
            title: "treepanel",
            rows: &rows,
            cursor: self.cursor,
            scroll: self.scroll,
            search: &self.search_buffer,
            search_active: self.search_active,
            show_selected: self.session.state.show_selected(),
            alerts: &alerts,
            variable_name: &self.session.config.variable_name,
            query: &self.query,
            message: self.status_message.as_deref(),
            show_help: self.show_help,
        };
        render::draw(frame, &data);

        if self.show_settings {
            settings::draw(frame, &self.settings_state, &self.session);
        }
    }

    fn ensure_cursor_visible(&mut self) {
        let height = self.tree_view_rows.max(1);
        if self.cursor < self.scroll {
            self.scroll = self.cursor;
        } else if self.cursor >= self.scroll + height {
            self.scroll = self.cursor + 1 - height;
        }
        self.scroll = self.scroll.min(self.rows.len().saturating_sub(height));
    }

    /// Returns true when the app should quit.
    fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Result<bool> {
        if self.show_settings {
            match settings::handle_key(key, &mut self.settings_state, &mut self.session)? {
                SettingsEvent::Close => self.show_settings = false,
                SettingsEvent::Changed => {
                    self.session.refresh_warnings();
                    self.status_message = Some(format!(
                        "{} = {}",
                        self.session.config.sorting_variable_name,
                        self.session.sorting_value()
                    ));
                }
                SettingsEvent::None => {}
            }
            return Ok(false);
        }

        if self.show_help {
            self.show_help = false;
            return Ok(false);
        }

        let action = input::action_for_key(key, self.search_active);
        if self.search_active {
            self.handle_search_action(action, now);
            return Ok(false);
        }

        match action {
            Action::Quit => return Ok(true),
            Action::Move(direction) => self.move_cursor(direction),
            Action::Top => self.cursor = 0,
            Action::Bottom => self.cursor = self.rows.len().saturating_sub(1),
            Action::ToggleSelect => self.toggle_select()?,
            Action::ExpandAll => self.session.state.expand_all(),
            Action::CollapseAll => {
                self.session.state.collapse_all();
                self.cursor = 0;
            }
            Action::ToggleShowSelected => {
                let show = !self.session.state.show_selected();
                self.session.state.set_show_selected(show);
            }
            Action::StartSearch => self.search_active = true,
            Action::ClearSearch => {
                self.search_buffer.clear();
                self.debouncer.cancel();
                self.session.state.set_search("");
            }
            Action::Reload => self.reload()?,
            Action::OpenSettings => {
                self.show_settings = true;
                self.settings_state = SettingsPanelState::default();
            }
            Action::ToggleHelp => self.show_help = true,
            _ => {}
        }
        self.refresh_rows();
        Ok(false)
    }

    fn handle_search_action(&mut self, action: Action, now: Instant) {
        match action {
            Action::InputChar(c) => {
                self.search_buffer.push(c);
                self.debouncer.schedule(now);
            }
            Action::Backspace => {
                self.search_buffer.pop();
                self.debouncer.schedule(now);
            }
            Action::SubmitText => {
                self.search_active = false;
                self.debouncer.cancel();
                self.apply_search();
            }
            Action::Cancel => {
                self.search_active = false;
                self.search_buffer.clear();
                self.debouncer.cancel();
                self.apply_search();
            }
            Action::Move(direction) => self.move_cursor(direction),
            _ => {}
        }
    }

    /// Run a pending search pass once the input has been quiet long enough.
    fn tick(&mut self, now: Instant) {
        if self.debouncer.fire(now) {
            self.apply_search();
        }
    }

    fn apply_search(&mut self) {
        debug!(search = %self.search_buffer, "search pass");
        self.session.state.set_search(&self.search_buffer);
        self.cursor = 0;
        self.scroll = 0;
        self.refresh_rows();
    }

    fn move_cursor(&mut self, direction: Direction) {
        let Some(row) = self.rows.get(self.cursor).copied() else {
            return;
        };
        match direction {
            Direction::Up => self.cursor = self.cursor.saturating_sub(1),
            Direction::Down => {
                self.cursor = (self.cursor + 1).min(self.rows.len().saturating_sub(1));
            }
            Direction::Left => {
                if row.open && self.session.state.forest().node(row.node).expanded {
                    self.session.state.toggle_node(row.node);
                } else if let Some(parent) = self.session.state.forest().node(row.node).parent() {
                    if let Some(idx) = self.rows.iter().position(|r| r.node == parent) {
                        self.cursor = idx;
                    }
                }
            }
            Direction::Right => {
                if row.has_children && !row.open {
                    self.session.state.toggle_node(row.node);
                } else if row.open {
                    self.cursor = (self.cursor + 1).min(self.rows.len().saturating_sub(1));
                }
            }
        }
    }

    fn toggle_select(&mut self) -> Result<()> {
        let Some(row) = self.rows.get(self.cursor).copied() else {
            return Ok(());
        };
        let published = self.session.toggle_select(row.node)?;
        self.session.refresh_warnings();
        self.query = published.query;
        self.status_message = None;
        Ok(())
    }

    fn reload(&mut self) -> Result<()> {
        let rows = match &self.root {
            Some(root) => session::read_rows(root, &self.session.config.field)?,
            None => Ok(demo_rows()),
        };
        self.session.reload(rows);
        self.refresh_query();
        self.status_message = Some(format!(
            "reloaded {} nodes",
            self.session.state.forest().len()
        ));
        Ok(())
    }

    fn poll_timeout(&self, now: Instant) -> Duration {
        self.debouncer
            .remaining(now)
            .map_or(POLL_INTERVAL, |d| d.min(POLL_INTERVAL))
    }
}

pub fn run(demo: bool, open_settings: bool) -> Result<()> {
    let mut app = AppState::load(demo, open_settings)?;

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;
    let _guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    loop {
        terminal.draw(|f| app.draw(f))?;
        let polled = event::poll(app.poll_timeout(Instant::now()))?;
        if polled {
            if let Event::Key(key) = event::read()? {
                if matches!(key.kind, KeyEventKind::Release | KeyEventKind::Repeat) {
                    continue;
                }
                if app.handle_key(key, Instant::now())? {
                    break;
                }
            }
        }
        app.tick(Instant::now());
    }
    Ok(())
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen);
    }
}

fn demo_config() -> Config {
    Config {
        default_value: "True".to_string(),
        default_expansion_level: 1,
        ..Config::default()
    }
}

fn demo_store() -> MemoryStore {
    let cfg = demo_config();
    let mut store = MemoryStore::new();
    for name in cfg.variable_names() {
        store.insert(name, Variable::textbox(""));
    }
    store
}

/// A small offshore portfolio: company, operatorship, geography, then assets.
fn demo_rows() -> Vec<String> {
    let wells: [(&str, &str, &str, &str, &str, &str, &str); 8] = [
        ("1:Nordic Energy", "10:Operated", "100:Europe", "1000:Norway", "2000:North Sea", "3000:Troll A", "4000:Troll"),
        ("1:Nordic Energy", "10:Operated", "100:Europe", "1000:Norway", "2000:North Sea", "3000:Troll A", "4000:Troll"),
        ("1:Nordic Energy", "10:Operated", "100:Europe", "1000:Norway", "2001:Norwegian Sea", "3001:Heidrun TLP", "4001:Heidrun"),
        ("1:Nordic Energy", "11:Partner", "100:Europe", "1001:United Kingdom", "2002:Central North Sea", "3002:Forties Alpha", "4002:Forties"),
        ("1:Nordic Energy", "11:Partner", "101:South America", "1002:Brazil", "2003:Santos Basin", "3003:FPSO Carioca", "4003:Lula"),
        ("2:Atlantic Petroleum", "10:Operated", "101:South America", "1002:Brazil", "2004:Campos Basin", "3004:P-51", "4004:Marlim Sul"),
        ("2:Atlantic Petroleum", "10:Operated", "102:Africa", "1003:Angola", "2005:Lower Congo", "3005:Kizomba A", "4005:Hungo"),
        ("2:Atlantic Petroleum", "11:Partner", "102:Africa", "1004:Nigeria", "2006:Niger Delta", "3006:Bonga FPSO", "4006:Bonga"),
    ];
    let kinds = [
        "company_id",
        "operated_id",
        "continent_id",
        "country_id",
        "region_id",
        "productionstation_id",
        "field_id",
    ];
    wells
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let levels = [w.0, w.1, w.2, w.3, w.4, w.5, w.6];
            let mut cols = levels
                .iter()
                .zip(kinds)
                .map(|(level, kind)| format!("{}:{}", level, kind))
                .collect::<Vec<_>>();
            let block = 5000 + i / 2;
            cols.insert(5, format!("{}:Block {}:block_id", block, block - 4990));
            cols.push(format!(
                "{}:{} R{}:reservoir_id",
                6000 + i,
                field_name(w.6),
                i + 1
            ));
            cols.push(format!("{}:W-{:02}:well_id", 7000 + i, i + 1));
            cols.push(format!("{}:W-{:02} T1:completion_id", 8000 + i, i + 1));
            cols.join(",")
        })
        .collect()
}

fn field_name(level: &str) -> &str {
    level.split_once(':').map_or(level, |(_, name)| name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn demo_app() -> AppState {
        let session = Session::mount(demo_config(), Ok(demo_rows()), Box::new(demo_store()));
        AppState::new(session, None, false, None)
    }

    fn press(app: &mut AppState, code: KeyCode, now: Instant) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE), now)
            .unwrap()
    }

    #[test]
    fn demo_data_builds_cleanly() {
        let app = demo_app();
        assert!(app.session.diagnostics.is_empty(), "{:?}", app.session.diagnostics);
        let forest = app.session.state.forest();
        assert_eq!(forest.roots().len(), 2);
        // expansion level 1 shows both companies and their operatorship nodes
        assert_eq!(app.rows.len(), 6);
        assert_eq!(app.query, "True");
    }

    #[test]
    fn select_publishes_query() {
        let mut app = demo_app();
        let now = Instant::now();
        press(&mut app, KeyCode::Char(' '), now);
        assert_eq!(app.query, "company_id in (1)");
        press(&mut app, KeyCode::Char(' '), now);
        assert_eq!(app.query, "True");
    }

    #[test]
    fn search_waits_for_debounce() {
        let mut app = demo_app();
        let start = Instant::now();
        press(&mut app, KeyCode::Char('/'), start);
        for c in "hungo".chars() {
            press(&mut app, KeyCode::Char(c), start);
        }
        app.tick(start + Duration::from_millis(100));
        assert_eq!(app.session.state.search(), "");
        app.tick(start + Duration::from_millis(300));
        assert_eq!(app.session.state.search(), "hungo");
        let names: Vec<&str> = app
            .rows
            .iter()
            .map(|r| app.session.state.forest().node(r.node).name.as_str())
            .collect();
        assert_eq!(names.first(), Some(&"Atlantic Petroleum"));
        assert!(names.contains(&"Hungo"));
        assert!(!names.contains(&"Nordic Energy"));
    }

    fn row_names(app: &AppState) -> Vec<&str> {
        app.rows
            .iter()
            .map(|r| app.session.state.forest().node(r.node).name.as_str())
            .collect()
    }

    #[test]
    fn show_selected_keeps_node_found_by_search() {
        let mut app = demo_app();
        let now = Instant::now();
        press(&mut app, KeyCode::Char('/'), now);
        for c in "hungo".chars() {
            press(&mut app, KeyCode::Char(c), now);
        }
        press(&mut app, KeyCode::Enter, now);
        let Some(pos) = row_names(&app).iter().position(|n| *n == "Hungo") else {
            panic!("Hungo not found: {:?}", row_names(&app));
        };
        app.cursor = pos;
        press(&mut app, KeyCode::Char(' '), now);
        assert!(app.query.contains("4005"), "{}", app.query);

        press(&mut app, KeyCode::Char('v'), now);
        let names = row_names(&app);
        assert_eq!(names.first(), Some(&"Atlantic Petroleum"));
        assert_eq!(names.last(), Some(&"Hungo"));

        press(&mut app, KeyCode::Esc, now);
        assert!(row_names(&app).contains(&"Hungo"));
    }

    #[test]
    fn right_expands_left_collapses() {
        let mut app = demo_app();
        let now = Instant::now();
        press(&mut app, KeyCode::Down, now);
        let before = app.rows.len();
        press(&mut app, KeyCode::Right, now);
        assert!(app.rows.len() > before);
        press(&mut app, KeyCode::Left, now);
        assert_eq!(app.rows.len(), before);
        press(&mut app, KeyCode::Left, now);
        assert_eq!(app.cursor, 0);
    }

    #[test]
    fn settings_popup_publishes_levels() {
        let mut app = demo_app();
        let now = Instant::now();
        press(&mut app, KeyCode::Char('s'), now);
        assert!(app.show_settings);
        press(&mut app, KeyCode::Char(' '), now);
        assert_eq!(
            app.session.store().value("treefilters"),
            Some("0,1,1,1,1,1,1,1,1,1,1")
        );
        press(&mut app, KeyCode::Esc, now);
        assert!(!app.show_settings);
    }

    #[test]
    fn show_selected_and_collapse() {
        let mut app = demo_app();
        let now = Instant::now();
        press(&mut app, KeyCode::Char('e'), now);
        let all = app.rows.len();
        assert_eq!(all, app.session.state.forest().len());
        press(&mut app, KeyCode::Char('c'), now);
        assert_eq!(app.rows.len(), 2);
        press(&mut app, KeyCode::Char('v'), now);
        assert!(app.rows.is_empty());
    }
}
