use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph};

use crate::levels::model::{Level, OptionIndices};
use crate::session::Session;
use crate::tui::render::centered_rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsEvent {
    None,
    Changed,
    Close,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SettingsPanelState {
    pub selected_row: usize,
}

const SETTINGS_ROW_COUNT: usize = Level::COUNT;
const SORTABLE_ROWS: usize = Level::SORTABLE.len();

/// Sortable levels in slot order, then the fixed levels.
pub fn level_at(indices: &OptionIndices, row: usize) -> Option<Level> {
    if row < SORTABLE_ROWS {
        indices.order().get(row).copied()
    } else {
        Level::FIXED.get(row - SORTABLE_ROWS).copied()
    }
}

pub fn handle_key(
    key: KeyEvent,
    state: &mut SettingsPanelState,
    session: &mut Session,
) -> Result<SettingsEvent> {
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    let event = match key.code {
        KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('q') | KeyCode::Char('s') => {
            SettingsEvent::Close
        }
        KeyCode::Up if shift => drag(state, session, -1)?,
        KeyCode::Down if shift => drag(state, session, 1)?,
        KeyCode::Char('[') | KeyCode::Char('K') => drag(state, session, -1)?,
        KeyCode::Char(']') | KeyCode::Char('J') => drag(state, session, 1)?,
        KeyCode::Up | KeyCode::Char('k') => {
            state.selected_row = state.selected_row.saturating_sub(1);
            SettingsEvent::None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            state.selected_row = (state.selected_row + 1).min(SETTINGS_ROW_COUNT - 1);
            SettingsEvent::None
        }
        KeyCode::Enter | KeyCode::Char(' ') => match level_at(&session.indices, state.selected_row) {
            Some(level) => {
                session.toggle_level(level)?;
                SettingsEvent::Changed
            }
            None => SettingsEvent::None,
        },
        _ => SettingsEvent::None,
    };
    Ok(event)
}

/// Keyboard drag: move the focused draggable level one slot, cursor follows.
fn drag(state: &mut SettingsPanelState, session: &mut Session, delta: isize) -> Result<SettingsEvent> {
    let row = state.selected_row;
    let Some(level) = level_at(&session.indices, row).filter(|l| l.is_draggable()) else {
        return Ok(SettingsEvent::None);
    };
    let Some(target) = row
        .checked_add_signed(delta)
        .filter(|t| *t < SORTABLE_ROWS)
    else {
        return Ok(SettingsEvent::None);
    };
    session.move_level(level, target)?;
    state.selected_row = session.indices.slot(level).unwrap_or(row);
    Ok(SettingsEvent::Changed)
}

pub fn draw(frame: &mut Frame, state: &SettingsPanelState, session: &Session) {
    let area = centered_rect(frame.area(), 60, 70);
    frame.render_widget(Clear, area);

    let title = Line::from(vec![
        Span::styled(
            "Levels",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled("[Esc] close", Style::default().fg(Color::Gray)),
    ]);

    let selected_row = state.selected_row.min(SETTINGS_ROW_COUNT - 1);
    let mut lines = Vec::new();
    for row in 0..SETTINGS_ROW_COUNT {
        if row == SORTABLE_ROWS {
            lines.push(Line::from(Span::styled(
                "  ───────────────",
                Style::default().fg(Color::DarkGray),
            )));
        }
        if let Some(level) = level_at(&session.indices, row) {
            lines.push(level_row(
                row == selected_row,
                (row < SORTABLE_ROWS).then_some(row),
                level,
                session.checks[level],
            ));
        }
    }
    let muted = Style::default().fg(Color::DarkGray);
    lines.extend([
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("{} = ", session.config.sorting_variable_name), muted),
            Span::raw(session.sorting_value()),
        ]),
        Line::from(vec![
            Span::styled(format!("{} = ", session.config.filters_variable_name), muted),
            Span::raw(session.filters_value()),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Space toggles a level. [ ] or Shift+Up/Down move Type and Company.",
            muted,
        )),
        Line::from(Span::styled("Changes publish immediately.", muted)),
    ]);

    let panel = Paragraph::new(lines).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Cyan))
            .padding(Padding::new(1, 1, 1, 0)),
    );
    frame.render_widget(panel, area);
}

fn level_row(selected: bool, slot: Option<usize>, level: Level, enabled: bool) -> Line<'static> {
    let indicator = if selected { ">" } else { " " };
    let base_style = if selected {
        Style::default()
            .fg(Color::White)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let slot = slot.map(|s| s.to_string()).unwrap_or_else(|| " ".into());
    let grip = if level.is_draggable() { "⇅" } else { " " };
    let value_text = if enabled { "[x]" } else { "[ ]" };
    let mut value_style = if enabled {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::LightRed)
    };
    if selected {
        value_style = value_style.bg(Color::DarkGray);
    }

    Line::from(vec![
        Span::styled(format!("{indicator} {slot} "), base_style),
        Span::styled(value_text, value_style.add_modifier(Modifier::BOLD)),
        Span::styled(format!(" {grip} {:<20}", level.label()), base_style),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::config::Config;
    use crate::variables::MemoryStore;

    fn session() -> Session {
        Session::mount(Config::default(), Ok(Vec::new()), Box::new(MemoryStore::new()))
    }

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn rows_follow_current_order() {
        let indices = OptionIndices::default();
        assert_eq!(level_at(&indices, 2), Some(Level::Type));
        assert_eq!(level_at(&indices, 4), Some(Level::Region));
        assert_eq!(level_at(&indices, 10), Some(Level::Completion));
        assert_eq!(level_at(&indices, 11), None);
    }

    #[test]
    fn shift_up_drags_type_and_cursor_follows() {
        let mut s = session();
        let mut state = SettingsPanelState { selected_row: 2 };
        let event = handle_key(press(KeyCode::Up, KeyModifiers::SHIFT), &mut state, &mut s).unwrap();
        assert_eq!(event, SettingsEvent::Changed);
        assert_eq!(
            s.indices.order(),
            [Level::Continent, Level::Type, Level::Country, Level::Company]
        );
        assert_eq!(state.selected_row, 1);
        assert_eq!(s.store().value("levelsorting"), Some("3,2,4,1"));
    }

    #[test]
    fn bracket_drags_company_onto_type() {
        let mut s = session();
        let mut state = SettingsPanelState { selected_row: 3 };
        handle_key(press(KeyCode::Char('['), KeyModifiers::NONE), &mut state, &mut s).unwrap();
        assert_eq!(s.indices.company, 2);
        assert_eq!(s.indices.kind, 3);
        assert_eq!(state.selected_row, 2);
    }

    #[test]
    fn fixed_and_undraggable_levels_stay() {
        let mut s = session();
        let mut state = SettingsPanelState { selected_row: 0 };
        let event =
            handle_key(press(KeyCode::Char(']'), KeyModifiers::NONE), &mut state, &mut s).unwrap();
        assert_eq!(event, SettingsEvent::None);
        state.selected_row = 3;
        let event =
            handle_key(press(KeyCode::Char(']'), KeyModifiers::NONE), &mut state, &mut s).unwrap();
        assert_eq!(event, SettingsEvent::None);
        assert_eq!(s.indices, OptionIndices::default());
    }

    #[test]
    fn space_toggles_check_and_publishes() {
        let mut s = session();
        let mut state = SettingsPanelState { selected_row: 8 };
        handle_key(press(KeyCode::Char(' '), KeyModifiers::NONE), &mut state, &mut s).unwrap();
        assert!(!s.checks[Level::Reservoir]);
        assert_eq!(s.store().value("treefilters"), Some("1,1,1,1,1,1,1,1,0,1,1"));
    }

    #[test]
    fn plain_arrows_move_cursor() {
        let mut s = session();
        let mut state = SettingsPanelState::default();
        handle_key(press(KeyCode::Down, KeyModifiers::NONE), &mut state, &mut s).unwrap();
        assert_eq!(state.selected_row, 1);
        let event = handle_key(press(KeyCode::Esc, KeyModifiers::NONE), &mut state, &mut s).unwrap();
        assert_eq!(event, SettingsEvent::Close);
    }
}
