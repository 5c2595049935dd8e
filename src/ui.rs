use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, DetailView, InputMode};
use crate::constants::{app as consts, messages, ui as dims};
use crate::projection::DisplayState;
use crate::util_text::{
    display_name, display_number, format_height, format_weight, image_url, truncate,
};

const ACCENT: Color = Color::Rgb(0xEF, 0x53, 0x50);
const DIM: Color = Color::Gray;
const ERROR: Color = Color::LightRed;

// ===============================
// Top-level draw
// ===============================
pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Length(3), // search
            Constraint::Min(0),    // body
            Constraint::Length(1), // footer
        ])
        .split(f.area());

    header(f, chunks[0], app);
    search_bar(f, chunks[1], app);
    body(f, chunks[2], app);
    footer(f, chunks[3], app);

    // Overlays render last
    if let Some(detail) = app.detail() {
        draw_detail_overlay(f, app, detail);
    }
    if let Some(msg) = app.toast_message() {
        draw_toast(f, msg);
    }
}

// ===============================
// Header / Search
// ===============================
fn header(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled(
        " dexterm ",
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
    )];
    let shown = app.display().items().len();
    let loaded = app.loaded_count();
    let status = match app.display() {
        DisplayState::Loading => format!("{} loading", app.spinner_frame()),
        DisplayState::Error { .. } => "error".to_string(),
        _ if shown == loaded => format!("{loaded} loaded"),
        _ => format!("{shown} of {loaded} loaded"),
    };
    spans.push(Span::styled(status, Style::default().fg(DIM)));
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn search_bar(f: &mut Frame, area: Rect, app: &App) {
    let focused = app.input_mode() == InputMode::Search;
    let query = app.search_query();
    let hint = "(Press / to search by name)";
    let text = if query.is_empty() && !focused { hint } else { query };

    let border = if focused { ACCENT } else { DIM };
    let paragraph = Paragraph::new(text)
        .style(Style::default().fg(if focused { ACCENT } else { Color::Reset }))
        .block(
            Block::default()
                .title(" Search ")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(border)),
        );
    f.render_widget(paragraph, area);

    if focused && area.width > 2 {
        let x = area.x + 1 + (query.chars().count().min(area.width.saturating_sub(2) as usize) as u16);
        f.set_cursor_position((x, area.y + 1));
    }
}

// ===============================
// Body
// ===============================
fn body(f: &mut Frame, area: Rect, app: &App) {
    if area.width < dims::MIN_WIDTH || area.height < dims::MIN_HEIGHT {
        let warning = Paragraph::new(format!(
            "Terminal too small!\nMinimum size: {}×{}",
            dims::MIN_WIDTH,
            dims::MIN_HEIGHT
        ))
        .alignment(Alignment::Center)
        .style(Style::default().fg(ERROR).add_modifier(Modifier::BOLD));
        f.render_widget(warning, area);
        return;
    }

    match app.display() {
        DisplayState::Loading => centered_text(
            f,
            area,
            vec![Line::from(format!("{} {}", app.spinner_frame(), messages::LOADING))],
        ),
        DisplayState::Empty { message } => centered_text(
            f,
            area,
            vec![Line::styled(message.clone(), Style::default().fg(DIM))],
        ),
        DisplayState::Error {
            message,
            is_network_error,
            retryable,
        } => {
            let headline = if *is_network_error {
                messages::NO_INTERNET.to_string()
            } else {
                message.clone()
            };
            let mut lines = vec![Line::styled(
                headline,
                Style::default().fg(ERROR).add_modifier(Modifier::BOLD),
            )];
            if *retryable {
                lines.push(Line::from(""));
                lines.push(Line::styled("[r] Retry", Style::default().fg(ACCENT)));
            }
            centered_text(f, area, lines);
        }
        DisplayState::Grid { loading_more, .. } => grid(f, area, app, *loading_more),
    }
}

fn centered_text(f: &mut Frame, area: Rect, lines: Vec<Line<'static>>) {
    let height = lines.len() as u16;
    let rows = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height),
        Constraint::Fill(1),
    ])
    .split(area);
    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        rows[1],
    );
}

fn grid(f: &mut Frame, area: Rect, app: &App, loading_more: bool) {
    let items = app.display().items();
    let cols = consts::GRID_COLUMNS;
    let cell_width = (area.width.saturating_sub(2) as usize / cols).max(8);
    let selected = app.selection();

    let mut rows: Vec<ListItem> = items
        .chunks(cols)
        .enumerate()
        .map(|(row, chunk)| {
            let spans: Vec<Span> = chunk
                .iter()
                .enumerate()
                .map(|(col, item)| {
                    let idx = row * cols + col;
                    let label = format!(
                        "{} {}",
                        display_number(&item.id),
                        display_name(&item.name)
                    );
                    let text = format!(
                        " {:<width$}",
                        truncate(&label, cell_width.saturating_sub(2)),
                        width = cell_width.saturating_sub(1)
                    );
                    if idx == selected {
                        Span::styled(
                            text,
                            Style::default()
                                .fg(Color::Black)
                                .bg(ACCENT)
                                .add_modifier(Modifier::BOLD),
                        )
                    } else {
                        Span::raw(text)
                    }
                })
                .collect();
            ListItem::new(Line::from(spans))
        })
        .collect();

    if loading_more {
        rows.push(ListItem::new(Line::styled(
            format!(" {} loading more…", app.spinner_frame()),
            Style::default().fg(DIM),
        )));
    }

    let mut state = ListState::default();
    state.select(Some(selected / cols));

    let list = List::new(rows).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(DIM)),
    );
    f.render_stateful_widget(list, area, &mut state);
}

// ===============================
// Footer
// ===============================
fn footer(f: &mut Frame, area: Rect, app: &App) {
    let keys = match (app.input_mode(), app.detail().is_some()) {
        (InputMode::Search, _) => "type to filter  Enter keep  Esc clear",
        (_, true) => "Esc close  y copy image URL",
        _ => "/ search  ←↑↓→ move  Enter details  r retry/refresh  y copy image  q quit",
    };
    f.render_widget(
        Paragraph::new(Line::styled(keys, Style::default().fg(DIM))),
        area,
    );
}

// ===============================
// Overlays
// ===============================
fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .split(area);
    Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .split(vertical[1])[1]
}

fn draw_detail_overlay(f: &mut Frame, app: &App, detail: &DetailView) {
    let (title, lines): (String, Vec<Line>) = match detail {
        DetailView::Loading { id, name } => (
            format!(" {} {} ", display_number(id), display_name(name)),
            vec![Line::from(format!("{} loading details…", app.spinner_frame()))],
        ),
        DetailView::Failed { id, name, failure } => (
            format!(" {} {} ", display_number(id), display_name(name)),
            vec![
                Line::styled(failure.message.clone(), Style::default().fg(ERROR)),
                Line::from(""),
                Line::styled("Esc to close, Enter to retry", Style::default().fg(DIM)),
            ],
        ),
        DetailView::Ready(d) => {
            let mut lines = vec![
                kv("Types", d.types.join(", ")),
                kv("Height", d.height.map(format_height).unwrap_or_else(|| "?".into())),
                kv("Weight", d.weight.map(format_weight).unwrap_or_else(|| "?".into())),
                kv(
                    "Base exp",
                    d.base_experience
                        .map(|b| b.to_string())
                        .unwrap_or_else(|| "?".into()),
                ),
                kv("Abilities", d.abilities.join(", ")),
                Line::from(""),
            ];
            for stat in &d.stats {
                let bar = "█".repeat((stat.base / 10).min(25) as usize);
                lines.push(Line::from(vec![
                    Span::styled(format!("{:<16}", stat.name), Style::default().fg(DIM)),
                    Span::raw(format!("{:>4} ", stat.base)),
                    Span::styled(bar, Style::default().fg(ACCENT)),
                ]));
            }
            lines.push(Line::from(""));
            let artwork = d
                .sprites
                .official_artwork
                .clone()
                .unwrap_or_else(|| image_url(app.image_base_url(), &d.id));
            lines.push(kv("Artwork", artwork));
            (
                format!(" {} {} ", display_number(&d.id), display_name(&d.name)),
                lines,
            )
        }
    };

    let area = centered_rect(70, lines.len() as u16 + 2, f.area());
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .border_style(Style::default().fg(ACCENT)),
        ),
        area,
    );
}

fn kv(key: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{key:<10} "), Style::default().fg(DIM)),
        Span::raw(value),
    ])
}

fn draw_toast(f: &mut Frame, msg: &str) {
    let area = f.area();
    let width = (msg.chars().count() as u16 + 4).min(area.width);
    let rect = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(4),
        width,
        height: 3.min(area.height),
    };
    f.render_widget(Clear, rect);
    f.render_widget(
        Paragraph::new(msg.to_string())
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded)),
        rect,
    );
}
