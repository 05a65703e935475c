// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use followup_app::{
    COLUMNS, DashboardCommand, DashboardState, EditDraft, FilterCriteria, NO_RECORDS_MESSAGE,
    NOTES_MAX_CHARS, RecordId, RecordService, StatusKind, StatusMessage, SyncRequest,
    SyncResponse, TableBody, TableView, UiPort, normalize,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

const FILTER_ALL_LABEL: &str = "all";
const COLUMN_WIDTHS: [Constraint; 9] = [
    Constraint::Length(6),
    Constraint::Min(14),
    Constraint::Length(18),
    Constraint::Length(12),
    Constraint::Length(20),
    Constraint::Length(24),
    Constraint::Length(17),
    Constraint::Min(16),
    Constraint::Length(9),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiOptions {
    pub title: String,
    pub statuses: Vec<String>,
    pub categories: Vec<String>,
    /// Success messages clear after this long; zero keeps them.
    pub status_clear: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    Sync(SyncResponse),
}

/// Executes dashboard requests for the event loop. The default runs each
/// request inline; real runtimes hand it to a worker and send the response
/// back over `tx`.
pub trait AppRuntime: RecordService {
    fn spawn_request(&mut self, request: SyncRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let response = request.execute(&*self);
        tx.send(InternalEvent::Sync(response))
            .map_err(|_| anyhow!("sync event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Focus {
    #[default]
    Table,
    Search,
    Form(FormField),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormField {
    Status,
    Notes,
}

impl FormField {
    const fn toggled(self) -> Self {
        match self {
            Self::Status => Self::Notes,
            Self::Notes => Self::Status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    title: String,
    status_choices: Vec<String>,
    category_choices: Vec<String>,
    status_clear: Duration,
    search: String,
    status_filter: Option<usize>,
    category_filter: Option<usize>,
    table: TableView,
    cursor: usize,
    draft: EditDraft,
    focus: Focus,
    status: Option<StatusMessage>,
    status_token: u64,
    help_visible: bool,
}

impl ViewData {
    fn new(options: &UiOptions) -> Self {
        Self {
            title: options.title.clone(),
            status_choices: options.statuses.clone(),
            category_choices: options.categories.clone(),
            status_clear: options.status_clear,
            ..Self::default()
        }
    }

    fn status_filter_label(&self) -> Option<&str> {
        self.status_filter
            .and_then(|index| self.status_choices.get(index))
            .map(String::as_str)
    }

    fn category_filter_label(&self) -> Option<&str> {
        self.category_filter
            .and_then(|index| self.category_choices.get(index))
            .map(String::as_str)
    }

    fn cursor_row_id(&self) -> Option<RecordId> {
        self.table.rows().get(self.cursor).map(|row| row.id.clone())
    }

    fn clamp_cursor(&mut self) {
        let len = self.table.rows().len();
        self.cursor = if len == 0 { 0 } else { self.cursor.min(len - 1) };
    }
}

impl UiPort for ViewData {
    fn render(&mut self, view: &TableView) {
        self.table = view.clone();
        self.clamp_cursor();
    }

    fn show_status(&mut self, message: &StatusMessage) {
        self.status = Some(message.clone());
        self.status_token = self.status_token.saturating_add(1);
    }

    fn read_filter_criteria(&self) -> FilterCriteria {
        FilterCriteria::from_inputs(
            &self.search,
            self.status_filter_label(),
            self.category_filter_label(),
        )
    }

    fn reset_filters(&mut self) {
        self.search.clear();
        self.status_filter = None;
        self.category_filter = None;
    }

    fn read_edit_draft(&self) -> EditDraft {
        self.draft.clone()
    }

    fn fill_edit_draft(&mut self, draft: &EditDraft) {
        self.draft = draft.clone();
    }
}

pub fn run_app<R: AppRuntime>(
    dashboard: &mut DashboardState,
    runtime: &mut R,
    options: &UiOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(options);
    let (internal_tx, internal_rx) = mpsc::channel();
    dispatch(
        dashboard,
        runtime,
        &mut view_data,
        &internal_tx,
        DashboardCommand::Load,
    );

    let mut result = Ok(());
    loop {
        process_internal_events(
            dashboard,
            runtime,
            &mut view_data,
            &internal_tx,
            &internal_rx,
        );

        if let Err(error) = terminal.draw(|frame| render(frame, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(dashboard, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events<R: AppRuntime>(
    dashboard: &mut DashboardState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                view_data.status = None;
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::Sync(response) => {
                let token = view_data.status_token;
                let follow_up = dashboard.complete(response, view_data);
                issue_requests(runtime, view_data, tx, follow_up);
                schedule_status_clear(view_data, tx, token);
            }
        }
    }
}

fn dispatch<R: AppRuntime>(
    dashboard: &mut DashboardState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: DashboardCommand,
) {
    let token = view_data.status_token;
    let requests = dashboard.dispatch(command, view_data);
    issue_requests(runtime, view_data, internal_tx, requests);
    schedule_status_clear(view_data, internal_tx, token);
}

fn issue_requests<R: AppRuntime>(
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    requests: Vec<SyncRequest>,
) {
    for request in requests {
        let request_id = request.request_id();
        debug!(request_id, "spawning request");
        if let Err(error) = runtime.spawn_request(request, internal_tx.clone()) {
            warn!(request_id, %error, "could not start request");
            view_data.show_status(&StatusMessage::error(format!(
                "could not start request: {error}"
            )));
        }
    }
}

fn schedule_status_clear(
    view_data: &ViewData,
    internal_tx: &Sender<InternalEvent>,
    previous_token: u64,
) {
    if view_data.status_token == previous_token || view_data.status_clear.is_zero() {
        return;
    }
    if view_data.status.as_ref().map(|status| status.kind) != Some(StatusKind::Success) {
        return;
    }
    let token = view_data.status_token;
    let delay = view_data.status_clear;
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(delay);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: StatusMessage,
) {
    let token = view_data.status_token;
    view_data.show_status(&message);
    schedule_status_clear(view_data, internal_tx, token);
}

fn handle_key_event<R: AppRuntime>(
    dashboard: &mut DashboardState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            view_data.help_visible = false;
        }
        return false;
    }

    match view_data.focus {
        Focus::Table => handle_table_key(dashboard, runtime, view_data, internal_tx, key),
        Focus::Search => handle_search_key(dashboard, runtime, view_data, internal_tx, key),
        Focus::Form(field) => {
            handle_form_key(dashboard, runtime, view_data, internal_tx, field, key);
        }
    }
    false
}

fn handle_table_key<R: AppRuntime>(
    dashboard: &mut DashboardState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let command = match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            move_cursor(view_data, 1);
            None
        }
        KeyCode::Char('k') | KeyCode::Up => {
            move_cursor(view_data, -1);
            None
        }
        KeyCode::Char('g') | KeyCode::Home => {
            view_data.cursor = 0;
            None
        }
        KeyCode::Char('G') | KeyCode::End => {
            view_data.cursor = view_data.table.rows().len().saturating_sub(1);
            None
        }
        KeyCode::Enter => match view_data.cursor_row_id() {
            Some(id) => Some(DashboardCommand::Select(id)),
            None => {
                emit_status(
                    view_data,
                    internal_tx,
                    StatusMessage::error("no record under the cursor"),
                );
                None
            }
        },
        KeyCode::Char('/') => {
            view_data.focus = Focus::Search;
            None
        }
        KeyCode::Char('s') => {
            view_data.status_filter =
                cycle_filter(view_data.status_filter, view_data.status_choices.len(), 1);
            Some(DashboardCommand::FilterChanged)
        }
        KeyCode::Char('S') => {
            view_data.status_filter =
                cycle_filter(view_data.status_filter, view_data.status_choices.len(), -1);
            Some(DashboardCommand::FilterChanged)
        }
        KeyCode::Char('c') => {
            view_data.category_filter =
                cycle_filter(view_data.category_filter, view_data.category_choices.len(), 1);
            Some(DashboardCommand::FilterChanged)
        }
        KeyCode::Char('C') => {
            view_data.category_filter =
                cycle_filter(view_data.category_filter, view_data.category_choices.len(), -1);
            Some(DashboardCommand::FilterChanged)
        }
        KeyCode::Char('x') => Some(DashboardCommand::ClearFilters),
        KeyCode::Char('r') => Some(DashboardCommand::Load),
        KeyCode::Char('e') => {
            view_data.focus = Focus::Form(FormField::Status);
            None
        }
        KeyCode::Char('?') => {
            view_data.help_visible = true;
            None
        }
        _ => None,
    };

    if let Some(command) = command {
        dispatch(dashboard, runtime, view_data, internal_tx, command);
    }
}

fn handle_search_key<R: AppRuntime>(
    dashboard: &mut DashboardState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Enter | KeyCode::Esc => {
            view_data.focus = Focus::Table;
        }
        KeyCode::Backspace => {
            if view_data.search.pop().is_some() {
                dispatch(
                    dashboard,
                    runtime,
                    view_data,
                    internal_tx,
                    DashboardCommand::FilterChanged,
                );
            }
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            view_data.search.push(ch);
            dispatch(
                dashboard,
                runtime,
                view_data,
                internal_tx,
                DashboardCommand::FilterChanged,
            );
        }
        _ => {}
    }
}

fn handle_form_key<R: AppRuntime>(
    dashboard: &mut DashboardState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    field: FormField,
    key: KeyEvent,
) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match (key.code, field) {
        (KeyCode::Esc, _) => view_data.focus = Focus::Table,
        (KeyCode::Tab | KeyCode::BackTab, _) => {
            view_data.focus = Focus::Form(field.toggled());
        }
        (KeyCode::Char('s'), _) if ctrl => {
            dispatch(
                dashboard,
                runtime,
                view_data,
                internal_tx,
                DashboardCommand::Submit,
            );
        }
        (KeyCode::Enter, FormField::Status) => {
            dispatch(
                dashboard,
                runtime,
                view_data,
                internal_tx,
                DashboardCommand::Submit,
            );
        }
        (KeyCode::Left, FormField::Status) => cycle_draft_status(view_data, -1),
        (KeyCode::Right, FormField::Status) => cycle_draft_status(view_data, 1),
        (KeyCode::Enter, FormField::Notes) => view_data.draft.notes.push('\n'),
        (KeyCode::Backspace, FormField::Notes) => {
            view_data.draft.notes.pop();
        }
        (KeyCode::Char(ch), FormField::Notes) if !ctrl => view_data.draft.notes.push(ch),
        _ => {}
    }
}

fn move_cursor(view_data: &mut ViewData, delta: isize) {
    let len = view_data.table.rows().len();
    if len == 0 {
        view_data.cursor = 0;
        return;
    }
    let next = (view_data.cursor as isize + delta).clamp(0, len as isize - 1);
    view_data.cursor = next as usize;
}

/// Steps through `None` ("all") followed by each choice index, wrapping.
fn cycle_filter(current: Option<usize>, choices: usize, delta: isize) -> Option<usize> {
    let slots = choices as isize + 1;
    let position = current.map_or(0, |index| index as isize + 1);
    match (position + delta).rem_euclid(slots) {
        0 => None,
        next => Some(next as usize - 1),
    }
}

fn cycle_choice(choices: &[String], current: &str, delta: isize) -> Option<String> {
    if choices.is_empty() {
        return None;
    }
    let len = choices.len() as isize;
    let wanted = normalize(current);
    let next = match choices.iter().position(|choice| normalize(choice) == wanted) {
        Some(index) => (index as isize + delta).rem_euclid(len),
        None if delta >= 0 => 0,
        None => len - 1,
    };
    choices.get(next as usize).cloned()
}

fn cycle_draft_status(view_data: &mut ViewData, delta: isize) {
    if let Some(next) = cycle_choice(&view_data.status_choices, &view_data.draft.status, delta) {
        view_data.draft.status = next;
    }
}

fn render(frame: &mut ratatui::Frame<'_>, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(7),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let filters = Paragraph::new(filter_bar_text(view_data)).block(
        Block::default()
            .title(view_data.title.as_str())
            .borders(Borders::ALL),
    );
    frame.render_widget(filters, layout[0]);

    render_table(frame, layout[1], view_data);

    let form_style = if matches!(view_data.focus, Focus::Form(_)) {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let form = Paragraph::new(form_text(view_data))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("update record")
                .borders(Borders::ALL)
                .border_style(form_style),
        );
    frame.render_widget(form, layout[2]);

    let status_widget = Paragraph::new(status_text(view_data))
        .style(Style::default().fg(status_color(view_data.status.as_ref())))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[3]);

    if view_data.help_visible {
        let area = centered_rect(70, 50, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_table(frame: &mut ratatui::Frame<'_>, area: Rect, view_data: &ViewData) {
    let block = Block::default()
        .title(view_data.table.title())
        .borders(Borders::ALL);

    let rows = match &view_data.table.body {
        TableBody::NoRecords => {
            let empty = Paragraph::new(NO_RECORDS_MESSAGE).block(block);
            frame.render_widget(empty, area);
            return;
        }
        TableBody::Rows(rows) => rows,
    };

    let header = Row::new(COLUMNS.iter().map(|&label| {
        Cell::from(if label.is_empty() { "action" } else { label }).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let selected = view_data.draft.selected_id.as_ref();
    let body = rows.iter().map(|row| {
        let is_selected = selected == Some(&row.id);
        let cells = row.cells.iter().enumerate().map(|(index, text)| {
            let text = if index == COLUMNS.len() - 1 && is_selected {
                "editing".to_owned()
            } else {
                text.replace('\n', " ")
            };
            Cell::from(text)
        });
        let style = if is_selected {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        Row::new(cells).style(style)
    });

    let highlight = if view_data.focus == Focus::Table {
        Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
    } else {
        Style::default().bg(Color::DarkGray)
    };
    let table = Table::new(body, COLUMN_WIDTHS)
        .header(header)
        .column_spacing(1)
        .row_highlight_style(highlight)
        .block(block);
    let mut state = TableState::default().with_selected(Some(view_data.cursor));
    frame.render_stateful_widget(table, area, &mut state);
}

fn filter_bar_text(view_data: &ViewData) -> String {
    let cursor = if view_data.focus == Focus::Search {
        "_"
    } else {
        ""
    };
    format!(
        "search: {}{cursor} | status: {} | category: {}",
        view_data.search,
        view_data.status_filter_label().unwrap_or(FILTER_ALL_LABEL),
        view_data.category_filter_label().unwrap_or(FILTER_ALL_LABEL),
    )
}

fn form_text(view_data: &ViewData) -> String {
    let draft = &view_data.draft;
    let marker = |field: FormField| {
        if view_data.focus == Focus::Form(field) {
            ">"
        } else {
            " "
        }
    };
    let selected = draft
        .selected_id
        .as_ref()
        .map_or_else(|| "(none)".to_owned(), ToString::to_string);
    let status = if draft.status.is_empty() {
        "(choose)"
    } else {
        draft.status.as_str()
    };
    [
        format!("  selected: {selected}"),
        format!("{} status: < {status} >", marker(FormField::Status)),
        format!(
            "{} notes ({}/{NOTES_MAX_CHARS}): {}",
            marker(FormField::Notes),
            draft.notes_len(),
            draft.notes
        ),
        String::new(),
        "  tab field | left/right status | ctrl+s submit | esc table".to_owned(),
    ]
    .join("\n")
}

fn status_text(view_data: &ViewData) -> String {
    let focus = match view_data.focus {
        Focus::Table => "TABLE",
        Focus::Search => "SEARCH",
        Focus::Form(_) => "FORM",
    };
    let hints = "j/k enter select | / search | s/S status | c/C category | x clear | r reload | e edit | ? help | ctrl+q";
    match &view_data.status {
        Some(status) => format!("{focus} | {}: {} | {hints}", status.kind.as_str(), status.text),
        None => format!("{focus} | {hints}"),
    }
}

fn status_color(status: Option<&StatusMessage>) -> Color {
    match status.map(|status| status.kind) {
        Some(StatusKind::Error) => Color::Red,
        Some(StatusKind::Success) => Color::Green,
        Some(StatusKind::Neutral) | None => Color::Yellow,
    }
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit\n\
table: j/k up/down g/G | enter select row | r reload | e edit form | ? help\n\
filters: / search name or phone | s/S status | c/C category | x clear all\n\
search: type to filter | backspace delete | enter/esc table\n\
form: tab field | left/right status | type notes | ctrl+s or enter (status) submit | esc table"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
