mod export;
mod help;
mod state;

use crate::engine::{EvalRequest, EvalResponse, SubmitError};
use crate::model::Control;
use crate::orchestrator::{SubmissionController, SubmitState};
use crate::surface;
use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::future::BoxFuture;
use futures::StreamExt;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Tabs},
    Terminal,
};
use state::UiState;
use std::{io, time::Duration};

const TAB_COUNT: usize = 3;

/// What a key press asks the event loop to do.
enum KeyAction {
    None,
    Quit,
    Submit(EvalRequest),
}

type InFlight = BoxFuture<'static, Result<EvalResponse, SubmitError>>;

/// Run the form on the current task. Input, redraws and the one outstanding
/// evaluator call are multiplexed with `select!`; nothing runs in parallel.
pub async fn run(mut controller: SubmissionController) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let mut state = UiState::new(controller.config());
    controller.render_history(&mut state);

    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(Duration::from_millis(100));
    let mut in_flight: Option<InFlight> = None;

    let res = loop {
        terminal
            .draw(|f| draw(f.area(), f, &state, controller.state()))
            .ok();

        tokio::select! {
            maybe_ev = events.next() => {
                match maybe_ev {
                    Some(Ok(Event::Key(k))) if k.kind == KeyEventKind::Press => {
                        match handle_key(&mut state, &mut controller, k) {
                            KeyAction::Quit => break Ok(()),
                            KeyAction::Submit(req) => in_flight = Some(controller.dispatch(req)),
                            KeyAction::None => {}
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break Err(anyhow::Error::from(e).context("read terminal event")),
                    None => break Ok(()),
                }
            }
            // Only completes while a request is outstanding.
            outcome = async {
                match in_flight.as_mut() {
                    Some(fut) => fut.await,
                    None => futures::future::pending().await,
                }
            } => {
                in_flight = None;
                controller.settle(outcome, &mut state);
                state.clamp_history_selection();
            }
            _ = tick.tick() => {}
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn handle_key(state: &mut UiState, controller: &mut SubmissionController, k: KeyEvent) -> KeyAction {
    match (k.modifiers, k.code) {
        (_, KeyCode::Esc) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => return KeyAction::Quit,
        (_, KeyCode::Tab) => {
            state.tab = (state.tab + 1) % TAB_COUNT;
            return KeyAction::None;
        }
        (_, KeyCode::BackTab) => {
            state.tab = (state.tab + TAB_COUNT - 1) % TAB_COUNT;
            return KeyAction::None;
        }
        (KeyModifiers::CONTROL, KeyCode::Char('l')) => {
            clear_history(state, controller);
            return KeyAction::None;
        }
        _ => {}
    }

    match state.tab {
        0 => handle_form_key(state, controller, k),
        1 => handle_history_key(state, controller, k),
        _ => {
            if k.code == KeyCode::Char('q') {
                KeyAction::Quit
            } else {
                KeyAction::None
            }
        }
    }
}

fn handle_form_key(
    state: &mut UiState,
    controller: &mut SubmissionController,
    k: KeyEvent,
) -> KeyAction {
    match (k.modifiers, k.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('r')) => {
            state.reset_form();
            surface::clear_all_errors(state);
        }
        (_, KeyCode::Up) => state.focus_prev(),
        (_, KeyCode::Down) => state.focus_next(),
        (_, KeyCode::Enter) => {
            // The disabled control is the only guard against a second request.
            if state.submit_enabled {
                let snapshot = state.snapshot();
                if let Some(req) = controller.begin(&snapshot, state) {
                    return KeyAction::Submit(req);
                }
            }
        }
        (_, KeyCode::Left) if state.focus == Control::R => state.move_r_cursor(-1),
        (_, KeyCode::Right) if state.focus == Control::R => state.move_r_cursor(1),
        (_, KeyCode::Char(' ')) if state.focus == Control::R => {
            if state.select_r(None) {
                controller.check_control(Control::R, &state.snapshot(), state);
            }
        }
        (_, KeyCode::Char(c)) if state.focus == Control::R => {
            if state.select_r(Some(c)) {
                controller.check_control(Control::R, &state.snapshot(), state);
            }
        }
        (_, KeyCode::Backspace) => {
            let focus = state.focus;
            if let Some(input) = state.focused_input() {
                input.pop();
                controller.check_control(focus, &state.snapshot(), state);
            }
        }
        (m, KeyCode::Char(c)) if !m.contains(KeyModifiers::CONTROL) => {
            let focus = state.focus;
            if let Some(input) = state.focused_input() {
                input.push(c);
                controller.check_control(focus, &state.snapshot(), state);
            }
        }
        _ => {}
    }
    KeyAction::None
}

fn handle_history_key(
    state: &mut UiState,
    controller: &mut SubmissionController,
    k: KeyEvent,
) -> KeyAction {
    match k.code {
        KeyCode::Char('q') => return KeyAction::Quit,
        KeyCode::Up | KeyCode::Char('k') => {
            state.history_selected = state.history_selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if state.history_selected + 1 < state.history.len() {
                state.history_selected += 1;
            }
        }
        KeyCode::Char('x') => clear_history(state, controller),
        KeyCode::Char('e') => {
            state.info = match export::export_history_json(controller.history().records()) {
                Ok(p) => format!("Exported JSON: {}", p.display()),
                Err(e) => format!("JSON export failed: {e:#}"),
            };
        }
        KeyCode::Char('c') => {
            state.info = match export::export_history_csv(controller.history().records()) {
                Ok(p) => format!("Exported CSV: {}", p.display()),
                Err(e) => format!("CSV export failed: {e:#}"),
            };
        }
        _ => {}
    }
    KeyAction::None
}

fn clear_history(state: &mut UiState, controller: &mut SubmissionController) {
    let was_empty = controller.history().is_empty();
    state.info = match controller.clear_history(state) {
        Ok(()) if was_empty => "История уже пуста".to_string(),
        Ok(()) => "История очищена".to_string(),
        Err(e) => format!("Clear failed: {e:#}"),
    };
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState, submit_state: SubmitState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let tabs = Tabs::new(vec![
        Line::from("Form"),
        Line::from("History"),
        Line::from("Help"),
    ])
    .select(state.tab)
    .block(Block::default().borders(Borders::ALL).title("area-check"))
    .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        0 => draw_form(chunks[1], f, state, submit_state),
        1 => draw_history(chunks[1], f, state),
        _ => help::draw_help(chunks[1], f),
    }
}

fn input_block(title: String, focused: bool, invalid: bool) -> Block<'static> {
    let color = if invalid {
        Color::Red
    } else if focused {
        Color::Yellow
    } else {
        Color::Gray
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title)
}

fn error_line(msg: &str) -> Paragraph<'_> {
    Paragraph::new(Line::from(Span::styled(msg, Style::default().fg(Color::Red))))
}

fn draw_form(area: Rect, f: &mut ratatui::Frame, state: &UiState, submit_state: SubmitState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(44), Constraint::Min(0)].as_ref())
        .split(area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(0),
            ]
            .as_ref(),
        )
        .split(cols[0]);

    let cursor = |c: Control, text: &str| -> String {
        if state.focus == c {
            format!("{text}▏")
        } else {
            text.to_string()
        }
    };

    let (x_min, x_max) = state.x_bounds;
    let x = Paragraph::new(cursor(Control::X, &state.x_input)).block(input_block(
        format!("X ({x_min} … {x_max})"),
        state.focus == Control::X,
        state.x_invalid,
    ));
    f.render_widget(x, rows[0]);
    f.render_widget(error_line(&state.x_error), rows[1]);

    let (y_min, y_max) = state.y_bounds;
    let y = Paragraph::new(cursor(Control::Y, &state.y_input)).block(input_block(
        format!("Y ({y_min} … {y_max})"),
        state.focus == Control::Y,
        state.y_invalid,
    ));
    f.render_widget(y, rows[2]);
    f.render_widget(error_line(&state.y_error), rows[3]);

    let mut options: Vec<Span> = Vec::new();
    for (i, token) in state.r_tokens.iter().enumerate() {
        let mark = if state.r_selected == Some(i) { "(•)" } else { "( )" };
        let mut style = Style::default();
        if state.focus == Control::R && state.r_cursor == i {
            style = style.add_modifier(Modifier::REVERSED);
        }
        if state.option_emphasis {
            style = style.fg(Color::Red);
        }
        options.push(Span::styled(format!("{mark} {token}"), style));
        options.push(Span::raw("  "));
    }
    let r = Paragraph::new(Line::from(options)).block(input_block(
        "R".to_string(),
        state.focus == Control::R,
        state.r_invalid,
    ));
    f.render_widget(r, rows[4]);
    f.render_widget(error_line(&state.r_error), rows[5]);

    let submit_label = if state.submit_enabled {
        "[ Проверить ]"
    } else {
        "[ Отправка… ]"
    };
    let submit_style = if !state.submit_enabled {
        Style::default().fg(Color::DarkGray)
    } else if state.focus == Control::Submit {
        Style::default().fg(Color::Black).bg(Color::Green)
    } else {
        Style::default().fg(Color::Green)
    };
    let submit = Paragraph::new(Line::from(Span::styled(submit_label, submit_style)))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(submit, rows[6]);
    f.render_widget(error_line(&state.request_error), rows[7]);

    let status = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("State: ", Style::default().fg(Color::Gray)),
            Span::raw(format!("{submit_state:?}")),
        ]),
        Line::from(vec![
            Span::styled("Info: ", Style::default().fg(Color::Gray)),
            Span::raw(state.info.as_str()),
        ]),
    ]);
    f.render_widget(status, rows[8]);

    // Most recent entries first, as many as fit.
    let visible = (cols[1].height as usize).saturating_sub(3);
    let recent: Vec<_> = state.history.iter().rev().take(visible).collect();
    f.render_widget(history_table(&recent, None, "Последние результаты"), cols[1]);
}

fn history_table<'a>(
    records: &[&'a crate::model::HistoryRecord],
    selected: Option<usize>,
    title: &'a str,
) -> Table<'a> {
    let header = Row::new(["X", "Y", "R", "Попадание", "Время", "Выполнение"])
        .style(Style::default().fg(Color::Gray));
    let rows = records.iter().copied().enumerate().map(|(i, r)| {
        let hit_color = if r.hit == crate::orchestrator::HIT_LABEL {
            Color::Green
        } else {
            Color::Red
        };
        let row = Row::new(vec![
            Cell::from(r.x.as_str()),
            Cell::from(r.y.as_str()),
            Cell::from(r.r.as_str()),
            Cell::from(Span::styled(r.hit.as_str(), Style::default().fg(hit_color))),
            Cell::from(r.timestamp.as_str()),
            Cell::from(r.exec_time.as_str()),
        ]);
        if selected == Some(i) {
            row.style(Style::default().add_modifier(Modifier::REVERSED))
        } else {
            row
        }
    });
    Table::new(
        rows,
        [
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Length(3),
            Constraint::Length(10),
            Constraint::Length(21),
            Constraint::Min(8),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title))
}

fn draw_history(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)].as_ref())
        .split(area);

    let total = state.history.len();
    let current = if total > 0 { state.history_selected + 1 } else { 0 };
    let header = Paragraph::new(vec![
        Line::from(vec![
            Span::raw(format!("History ({current}/{total}) - ")),
            Span::styled("↑/↓/j/k", Style::default().fg(Color::Magenta)),
            Span::raw(": navigate, "),
            Span::styled("e", Style::default().fg(Color::Magenta)),
            Span::raw(": export JSON, "),
            Span::styled("c", Style::default().fg(Color::Magenta)),
            Span::raw(": export CSV, "),
            Span::styled("x", Style::default().fg(Color::Magenta)),
            Span::raw(": clear"),
        ]),
        Line::from(vec![
            Span::styled("Info: ", Style::default().fg(Color::Gray)),
            Span::raw(state.info.as_str()),
        ]),
    ]);
    f.render_widget(header, chunks[0]);

    // Newest first; keep the selected row on screen.
    let max_items = (chunks[1].height as usize).saturating_sub(3).max(1);
    let offset = if state.history_selected >= max_items {
        state.history_selected + 1 - max_items
    } else {
        0
    };
    let newest_first: Vec<_> = state.history.iter().rev().skip(offset).take(max_items).collect();
    let selected = state.history_selected.checked_sub(offset);
    f.render_widget(history_table(&newest_first, selected, "История"), chunks[1]);
}
