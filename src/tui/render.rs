use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph, Wrap};

use crate::levels::model::Level;
use crate::tree::model::SearchState;

const MAX_ALERT_LINES: u16 = 4;

/// One rendered tree row, detached from the forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub depth: usize,
    pub has_children: bool,
    pub open: bool,
    pub selected: bool,
    pub name: String,
    pub kind: String,
    pub search: SearchState,
}

pub struct PanelRenderData<'a> {
    pub title: &'a str,
    pub rows: &'a [TreeRow],
    pub cursor: usize,
    pub scroll: usize,
    pub search: &'a str,
    pub search_active: bool,
    pub show_selected: bool,
    pub alerts: &'a [String],
    pub variable_name: &'a str,
    pub query: &'a str,
    pub message: Option<&'a str>,
    pub show_help: bool,
}

pub struct PanelAreas {
    pub toolbar: Rect,
    pub alerts: Rect,
    pub tree: Rect,
    pub footer: Rect,
}

/// Split the frame; the tree gets whatever the alerts leave over.
pub fn layout(frame_area: Rect, alert_count: usize) -> (Rect, PanelAreas) {
    let area = frame_area.inner(Margin {
        horizontal: 2,
        vertical: 1,
    });
    let block = panel_block("");
    let inner = block.inner(area);
    let alert_height = (alert_count as u16).min(MAX_ALERT_LINES);
    let [toolbar, alerts, tree, footer] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(alert_height),
        Constraint::Min(3),
        Constraint::Length(3),
    ])
    .areas(inner);
    (
        area,
        PanelAreas {
            toolbar,
            alerts,
            tree,
            footer,
        },
    )
}

pub fn draw(frame: &mut Frame, data: &PanelRenderData<'_>) {
    let (area, areas) = layout(frame.area(), data.alerts.len());
    frame.render_widget(panel_block(data.title), area);

    frame.render_widget(Paragraph::new(toolbar_lines(data)), areas.toolbar);

    if !data.alerts.is_empty() {
        let lines = data
            .alerts
            .iter()
            .map(|a| {
                Line::from(vec![
                    Span::styled(
                        "! ",
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(a.clone(), Style::default().fg(Color::Yellow)),
                ])
            })
            .collect::<Vec<_>>();
        frame.render_widget(Paragraph::new(lines), areas.alerts);
    }

    let height = areas.tree.height as usize;
    let tree_lines = if data.rows.is_empty() {
        vec![Line::from(Span::styled(
            "No data",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        data.rows
            .iter()
            .enumerate()
            .skip(data.scroll)
            .take(height)
            .map(|(idx, row)| row_line(row, idx == data.cursor))
            .collect()
    };
    frame.render_widget(Paragraph::new(tree_lines), areas.tree);

    let muted = Style::default().fg(Color::DarkGray);
    let mut footer = vec![Line::from(vec![
        Span::styled(format!("{} = ", data.variable_name), muted),
        Span::raw(data.query.to_string()),
    ])];
    match data.message {
        Some(message) => footer.push(Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(Color::Cyan),
        ))),
        None => footer.push(Line::from(Span::styled(
            "space select  ←/→ fold  / search  e/c expand/collapse  v selected  s levels",
            muted,
        ))),
    }
    frame.render_widget(
        Paragraph::new(footer).wrap(Wrap { trim: true }),
        areas.footer,
    );

    if data.show_help {
        render_help_overlay(frame);
    }
}

fn panel_block(title: &str) -> Block<'static> {
    let title = Line::from(vec![
        Span::styled(
            title.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled("[?] help", Style::default().fg(Color::DarkGray)),
        Span::raw("  "),
        Span::styled("[q] quit", Style::default().fg(Color::DarkGray)),
    ]);
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::DarkGray))
        .padding(Padding::new(2, 2, 0, 0))
        .title(title)
}

fn toolbar_lines(data: &PanelRenderData<'_>) -> Vec<Line<'static>> {
    let label = Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD);
    let mut search = vec![Span::styled("Search ", label)];
    if data.search_active {
        search.push(Span::styled(
            data.search.to_string(),
            Style::default().fg(Color::White),
        ));
        search.push(Span::styled("▌", Style::default().fg(Color::Cyan)));
    } else if data.search.is_empty() {
        search.push(Span::styled(
            "press / to filter by name (* and ? wildcards)",
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        search.push(Span::styled(
            data.search.to_string(),
            Style::default().fg(Color::Yellow),
        ));
    }

    let toggle = if data.show_selected {
        Span::styled(
            "[v] showing selected",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled("[v] show selected", Style::default().fg(Color::DarkGray))
    };
    vec![
        Line::from(search),
        Line::from(vec![
            Span::styled("[e] expand all", Style::default().fg(Color::DarkGray)),
            Span::raw("  "),
            Span::styled("[c] collapse all", Style::default().fg(Color::DarkGray)),
            Span::raw("  "),
            toggle,
            Span::raw("  "),
            Span::styled("[s] levels", Style::default().fg(Color::DarkGray)),
        ]),
    ]
}

/// Icon for a node type; unknown types get a neutral dot.
pub fn glyph(kind: &str) -> char {
    match Level::from_type_key(kind) {
        Some(Level::Company) => '■',
        Some(Level::Type) => '◆',
        Some(Level::Continent) => '◯',
        Some(Level::Country) => '⚑',
        Some(Level::Region) => '▦',
        Some(Level::Block) => '▤',
        Some(Level::ProductionStation) => '⌂',
        Some(Level::Field) => '◎',
        Some(Level::Reservoir) => '≈',
        Some(Level::Well) => '┃',
        Some(Level::Completion) => '•',
        None => '·',
    }
}

pub fn row_text(row: &TreeRow) -> String {
    let fold = match (row.has_children, row.open) {
        (false, _) => ' ',
        (true, true) => '▾',
        (true, false) => '▸',
    };
    let check = if row.selected { '☑' } else { '☐' };
    format!(
        "{}{} {} {} {}",
        "  ".repeat(row.depth),
        fold,
        check,
        glyph(&row.kind),
        row.name
    )
}

fn row_line(row: &TreeRow, focused: bool) -> Line<'static> {
    let mut style = match (row.selected, row.search) {
        (true, _) => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
        (false, SearchState::Match) => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
        (false, SearchState::AncestorOfMatch) => Style::default().fg(Color::DarkGray),
        _ => Style::default().fg(Color::Gray),
    };
    if focused {
        style = style.bg(Color::DarkGray).fg(Color::White);
    }
    Line::from(Span::styled(row_text(row), style))
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect(frame.area(), 70, 60);
    frame.render_widget(Clear, area);
    let help = Paragraph::new(vec![
        Line::from("TREE"),
        Line::from("  Up/down (j/k) move, Left/right (h/l) fold and unfold"),
        Line::from("  Space/Enter selects; selecting clears ancestors and descendants"),
        Line::from(""),
        Line::from("TOOLBAR"),
        Line::from("  /  search by name, * and ? wildcards (Enter keeps, Esc clears)"),
        Line::from("  e  expand all     c  collapse all"),
        Line::from("  v  only selected  r  reload data"),
        Line::from("  s  level order and level checks"),
        Line::from(""),
        Line::from("Selection, order and checks publish to the panel variables."),
    ])
    .block(Block::default().title("Help").borders(Borders::ALL));
    frame.render_widget(help, area);
}

pub fn centered_rect(area: Rect, width_percent: u16, height_percent: u16) -> Rect {
    let vertical = Layout::vertical([
        Constraint::Percentage((100 - height_percent) / 2),
        Constraint::Percentage(height_percent),
        Constraint::Percentage((100 - height_percent) / 2),
    ])
    .flex(Flex::Center)
    .split(area);
    Layout::horizontal([
        Constraint::Percentage((100 - width_percent) / 2),
        Constraint::Percentage(width_percent),
        Constraint::Percentage((100 - width_percent) / 2),
    ])
    .flex(Flex::Center)
    .split(vertical[1])[1]
}
