use crate::calendar::{days_in_month, first_of_month, month_grid, shift_month, weeks, Cell};
use crate::chat::{ChatClient, ChatSession, SubmitOutcome};
use crate::config::{describe, save_config, Config, ConfigLocation};
use crate::dashboard::Summary;
use crate::field::FieldValue;
use crate::modal::{DayModal, Modal, Tab, TaskField, TaskForm};
use crate::model::{Note, Priority, Role, Status, Task};
use crate::store::Planner;
use anyhow::Result;
use chrono::{Datelike, Duration as ChronoDuration, Local, NaiveDate};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use log::{debug, warn};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::time::Duration;

const SAGE: Color = Color::Rgb(129, 154, 145);
const MOSS: Color = Color::Rgb(167, 193, 168);
const PALE: Color = Color::Rgb(209, 216, 190);
const CLAY: Color = Color::Rgb(196, 120, 104);

pub fn run(config: Config, location: ConfigLocation, client: ChatClient) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(config, location, client, Local::now().date_naive());
    let result = app.event_loop(&mut terminal);
    app.chat.session.cancel();
    teardown_terminal(&mut terminal)?;
    result
}

struct App {
    planner: Planner,
    config: Config,
    location: ConfigLocation,
    panel: Panel,
    sidebar_collapsed: bool,
    month: NaiveDate,
    cursor: NaiveDate,
    today: NaiveDate,
    modal: Modal,
    chat: ChatPanel,
    settings: SettingsState,
    archive_idx: usize,
    status: String,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Panel {
    Calendar,
    Dashboard,
    NotesArchive,
    Settings,
}

struct ChatPanel {
    open: bool,
    session: ChatSession,
    input: FieldValue,
}

#[derive(Default)]
struct SettingsState {
    editing: bool,
    reveal: bool,
    key: FieldValue,
}

impl Panel {
    const ALL: [Panel; 4] = [
        Panel::Calendar,
        Panel::Dashboard,
        Panel::NotesArchive,
        Panel::Settings,
    ];

    fn label(&self) -> &'static str {
        match self {
            Panel::Calendar => "Calendar",
            Panel::Dashboard => "Dashboard",
            Panel::NotesArchive => "Notes Archive",
            Panel::Settings => "Settings",
        }
    }
}

impl App {
    fn new(config: Config, location: ConfigLocation, client: ChatClient, today: NaiveDate) -> Self {
        let status = if client.has_credential() {
            "Press Enter on a day to plan it, c to chat with the assistant".to_string()
        } else {
            "No API key yet: open Settings (4) to enable the assistant".to_string()
        };
        App {
            planner: Planner::new(),
            config,
            location,
            panel: Panel::Calendar,
            sidebar_collapsed: false,
            month: first_of_month(today),
            cursor: today,
            today,
            modal: Modal::default(),
            chat: ChatPanel {
                open: false,
                session: ChatSession::new(client),
                input: FieldValue::default(),
            },
            settings: SettingsState::default(),
            archive_idx: 0,
            status,
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            if self.chat.session.poll() {
                self.status = "Assistant replied".into();
            }
            self.today = Local::now().date_naive();
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key)? {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(true);
        }
        if self.chat.open {
            self.handle_chat_key(key);
        } else if self.modal.is_open() {
            self.handle_modal_key(key);
        } else if self.settings.editing {
            self.handle_key_entry(key);
        } else {
            return self.handle_normal_key(key);
        }
        Ok(false)
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char(c @ '1'..='4') => {
                self.set_panel(Panel::ALL[c as usize - '1' as usize]);
                return Ok(false);
            }
            KeyCode::Char('c') => {
                self.chat.open = true;
                self.status = "Chat open (Enter to send, Esc to hide)".into();
                return Ok(false);
            }
            KeyCode::Char('b') => {
                self.sidebar_collapsed = !self.sidebar_collapsed;
                return Ok(false);
            }
            _ => {}
        }

        match self.panel {
            Panel::Calendar => self.handle_calendar_key(key),
            Panel::NotesArchive => self.handle_archive_key(key),
            Panel::Settings => self.handle_settings_key(key),
            Panel::Dashboard => {}
        }
        Ok(false)
    }

    fn handle_calendar_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.move_cursor(-1),
            KeyCode::Right | KeyCode::Char('l') => self.move_cursor(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-7),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(7),
            KeyCode::PageUp | KeyCode::Char('[') | KeyCode::Char('<') => self.step_month(-1),
            KeyCode::PageDown | KeyCode::Char(']') | KeyCode::Char('>') => self.step_month(1),
            KeyCode::Char('t') => {
                self.cursor = self.today;
                self.month = first_of_month(self.today);
            }
            KeyCode::Enter => self.open_day(self.cursor),
            _ => {}
        }
    }

    fn handle_archive_key(&mut self, key: KeyEvent) {
        let count = self.planner.notes().len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.archive_idx = self.archive_idx.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.archive_idx + 1 < count {
                    self.archive_idx += 1;
                }
            }
            KeyCode::Enter => {
                let date = self.archived_notes().get(self.archive_idx).map(|n| n.date);
                match date {
                    Some(date) => self.open_day(date),
                    None => self.status = "No notes saved yet".into(),
                }
            }
            _ => {}
        }
    }

    fn handle_settings_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('k') | KeyCode::Enter => {
                self.settings.editing = true;
                self.settings.key.clear();
                self.status =
                    "Enter your Gemini API key (Enter save, Tab show/hide, Esc cancel)".into();
            }
            KeyCode::Char('w') => {
                self.config.week_start = self.config.week_start.toggled();
                let message = format!("Weeks now start on {}", self.config.week_start.label());
                self.save_settings(message);
            }
            KeyCode::Char('x') => {
                if self.config.api_key().is_none() {
                    self.status = "No API key to remove".into();
                    return;
                }
                self.config.clear_api_key();
                self.chat.session.set_api_key(None);
                self.save_settings("API key removed".into());
            }
            _ => {}
        }
    }

    fn handle_key_entry(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.settings.editing = false;
                self.settings.key.clear();
                self.status = "Canceled".into();
            }
            KeyCode::Tab => self.settings.reveal = !self.settings.reveal,
            KeyCode::Enter => {
                if self.config.set_api_key(&self.settings.key.value) {
                    let key = self.settings.key.take();
                    self.chat.session.set_api_key(Some(key));
                    self.settings.editing = false;
                    self.save_settings("✓ API key saved successfully!".into());
                }
            }
            _ => {
                edit_field(&mut self.settings.key, key, false);
            }
        }
    }

    fn handle_chat_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.chat.open = false;
                self.status = "Chat hidden".into();
            }
            KeyCode::Enter => {
                if self.chat.session.is_pending() {
                    self.status = "Still waiting for the assistant...".into();
                    return;
                }
                let text = self.chat.input.value.clone();
                match self.chat.session.submit(&text) {
                    SubmitOutcome::Sent => {
                        self.chat.input.clear();
                        if self.chat.session.is_pending() {
                            self.status = "Assistant is thinking...".into();
                        }
                    }
                    SubmitOutcome::Busy => {
                        self.status = "Still waiting for the assistant...".into();
                    }
                    SubmitOutcome::Ignored => {}
                }
            }
            _ => {
                edit_field(&mut self.chat.input, key, false);
            }
        }
    }

    fn handle_modal_key(&mut self, key: KeyEvent) {
        let Some(day) = self.modal.day_mut() else {
            return;
        };
        let control = key.modifiers.contains(KeyModifiers::CONTROL);

        if let Some(form) = day.form.as_mut() {
            match key.code {
                KeyCode::Esc => day.cancel_task(),
                KeyCode::Tab => form.next_field(),
                KeyCode::BackTab => form.prev_field(),
                KeyCode::Enter if form.field == TaskField::Description && !control => {
                    form.description.insert_char('\n');
                }
                KeyCode::Enter => {
                    if let Some(id) = day.submit_task(&mut self.planner) {
                        self.status = format!("Added task {}", id);
                    }
                }
                KeyCode::Left | KeyCode::Right if form.field == TaskField::Priority => {
                    form.priority = if key.code == KeyCode::Left {
                        form.priority.prev()
                    } else {
                        form.priority.next()
                    };
                }
                _ => {
                    if let Some(field) = form.active_text_mut() {
                        edit_field(field, key, false);
                    }
                }
            }
            return;
        }

        match (day.tab, key.code) {
            (_, KeyCode::Esc) => {
                self.modal.close();
                self.status = "Closed day view".into();
            }
            (_, KeyCode::Tab) | (_, KeyCode::BackTab) => day.switch_tab(),
            (Tab::Notes, KeyCode::Char('s')) if control => {
                day.save_note(&mut self.planner);
                self.status = format!("Saved notes for {}", day.date().format("%Y-%m-%d"));
            }
            (Tab::Notes, KeyCode::Enter) => day.note.insert_char('\n'),
            (Tab::Notes, _) => {
                edit_field(&mut day.note, key, true);
            }
            (Tab::Tasks, KeyCode::Up | KeyCode::Char('k')) => day.select_prev(),
            (Tab::Tasks, KeyCode::Down | KeyCode::Char('j')) => day.select_next(&self.planner),
            (Tab::Tasks, KeyCode::Left | KeyCode::Char('h')) => {
                let date = day.date() - ChronoDuration::days(1);
                self.open_day(date);
            }
            (Tab::Tasks, KeyCode::Right | KeyCode::Char('l')) => {
                let date = day.date() + ChronoDuration::days(1);
                self.open_day(date);
            }
            (Tab::Tasks, KeyCode::Char('a') | KeyCode::Char('n')) => day.begin_task(),
            (Tab::Tasks, KeyCode::Char(' ') | KeyCode::Char('x')) => {
                day.toggle_selected(&mut self.planner);
            }
            (Tab::Tasks, KeyCode::Char('s')) => {
                day.cycle_selected(&mut self.planner);
            }
            (Tab::Tasks, KeyCode::Char('d')) => {
                if let Some(id) = day.delete_selected(&mut self.planner) {
                    self.status = format!("Deleted task {}", id);
                }
            }
            _ => {}
        }
    }

    fn set_panel(&mut self, panel: Panel) {
        if self.panel != panel {
            debug!("event=panel_switch panel={}", panel.label());
            self.panel = panel;
            self.status = format!("Switched to {}", panel.label());
        }
    }

    fn open_day(&mut self, date: NaiveDate) {
        self.cursor = date;
        self.month = first_of_month(date);
        self.modal.open(date, &self.planner);
    }

    fn move_cursor(&mut self, days: i64) {
        if let Some(date) = self
            .cursor
            .checked_add_signed(ChronoDuration::days(days))
        {
            self.cursor = date;
            self.month = first_of_month(date);
        }
    }

    fn step_month(&mut self, delta: i32) {
        self.month = shift_month(self.month, delta);
        let day = self.cursor.day().min(days_in_month(self.month));
        self.cursor = self.month.with_day(day).unwrap_or(self.month);
    }

    fn save_settings(&mut self, message: String) {
        match save_config(&self.location, &self.config) {
            Ok(()) => self.status = message,
            Err(err) => {
                warn!("event=config_save status=failed error={}", err);
                self.status = format!("Could not save settings: {}", err);
            }
        }
    }

    fn archived_notes(&self) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self.planner.notes().iter().collect();
        notes.sort_by_key(|n| n.date);
        notes
    }

    fn draw(&self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);

        let sidebar_width = if self.sidebar_collapsed { 5 } else { 20 };
        let mut constraints = vec![Constraint::Length(sidebar_width), Constraint::Min(20)];
        if self.chat.open {
            constraints.push(Constraint::Length(42));
        }
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(layout[1]);

        self.draw_sidebar(f, body[0]);
        match self.panel {
            Panel::Calendar => self.draw_calendar(f, body[1]),
            Panel::Dashboard => self.draw_dashboard(f, body[1]),
            Panel::NotesArchive => self.draw_archive(f, body[1]),
            Panel::Settings => self.draw_settings(f, body[1]),
        }
        if self.chat.open {
            self.draw_chat(f, body[2]);
        }
        self.draw_footer(f, layout[2]);

        if let Some(day) = self.modal.day() {
            self.draw_modal(f, day);
        }
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let key_state = if self.config.api_key().is_some() {
            Span::styled("assistant ready", Style::default().fg(Color::Green))
        } else {
            Span::styled("no API key", Style::default().fg(Color::LightRed))
        };
        let title = Line::from(vec![
            Span::styled(
                "daymark ",
                Style::default().fg(SAGE).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                self.panel.label(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  •  "),
            Span::styled(
                match self.modal.date() {
                    Some(date) => date.format("%a %Y-%m-%d").to_string(),
                    None => self.month.format("%B %Y").to_string(),
                },
                Style::default().fg(Color::Yellow),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("{} task(s)", self.planner.tasks().len()),
                Style::default().fg(Color::Gray),
            ),
            Span::raw("  •  "),
            key_state,
        ]);
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(title)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_sidebar(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let items = Panel::ALL
            .iter()
            .enumerate()
            .map(|(idx, panel)| {
                let text = if self.sidebar_collapsed {
                    format!("{}", idx + 1)
                } else {
                    format!("{} {}", idx + 1, panel.label())
                };
                ListItem::new(text)
            })
            .collect::<Vec<_>>();
        let mut state = ListState::default();
        state.select(Panel::ALL.iter().position(|p| *p == self.panel));
        let title = if self.sidebar_collapsed { "" } else { "AI Calendar" };
        let list = List::new(items)
            .block(
                Block::default()
                    .title(Span::styled(
                        title,
                        Style::default().fg(SAGE).add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
            .highlight_style(
                Style::default()
                    .bg(MOSS)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            );
        f.render_stateful_widget(list, area, &mut state);
    }

    fn draw_calendar(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default()
            .title(Span::styled(
                format!(" {} ", self.month.format("%B %Y")),
                Style::default().fg(SAGE).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let rows = weeks(&month_grid(self.month, self.config.week_start));
        let mut constraints = vec![Constraint::Length(1)];
        constraints.extend(
            rows.iter()
                .map(|_| Constraint::Ratio(1, rows.len().max(1) as u32)),
        );
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);
        let columns = |r: Rect| {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Ratio(1, 7); 7])
                .split(r)
        };

        let heading_cols = columns(vertical[0]);
        for (idx, heading) in self.config.week_start.headings().iter().enumerate() {
            let paragraph = Paragraph::new(*heading)
                .alignment(Alignment::Center)
                .style(Style::default().fg(SAGE).add_modifier(Modifier::BOLD));
            f.render_widget(paragraph, heading_cols[idx]);
        }
        for (row_idx, week) in rows.iter().enumerate() {
            let cols = columns(vertical[row_idx + 1]);
            for (col_idx, cell) in week.iter().enumerate() {
                self.draw_day_cell(f, cols[col_idx], *cell);
            }
        }
    }

    fn draw_day_cell(&self, f: &mut ratatui::Frame<'_>, area: Rect, cell: Cell) {
        let Some(date) = cell.date() else {
            let blank = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Rgb(40, 42, 48)));
            f.render_widget(blank, area);
            return;
        };
        let selected = date == self.cursor;
        let mut day_style = Style::default().fg(Color::White);
        if date == self.today {
            day_style = day_style.fg(Color::Yellow).add_modifier(Modifier::BOLD);
        }
        let mut title = vec![Span::styled(format!("{}", date.day()), day_style)];
        if self.planner.note_for_date(date).is_some() {
            title.push(Span::styled(" ✎", Style::default().fg(MOSS)));
        }
        let block = Block::default()
            .title(Line::from(title))
            .borders(Borders::ALL)
            .border_style(if selected {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            });

        let width = area.width.saturating_sub(2) as usize;
        let tasks = self.planner.tasks_on(date);
        let mut lines = tasks
            .iter()
            .take(2)
            .map(|task| {
                Line::from(Span::styled(
                    truncate_text(&task.title, width),
                    Style::default().fg(Color::Black).bg(status_color(task.status)),
                ))
            })
            .collect::<Vec<_>>();
        if tasks.len() > 2 {
            lines.push(Line::from(Span::styled(
                format!("+{} more", tasks.len() - 2),
                Style::default().fg(Color::Gray),
            )));
        }
        f.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_dashboard(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let summary = Summary::collect(self.planner.tasks(), self.planner.notes());
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(9),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(area);

        let stat = |label: &str, value: usize, color: Color| {
            Line::from(vec![
                Span::styled(format!("{:<14}", label), Style::default().fg(Color::Gray)),
                Span::styled(
                    value.to_string(),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
            ])
        };
        let lines = vec![
            stat("Total tasks", summary.total, Color::White),
            stat("Not started", summary.not_started, status_color(Status::NotStarted)),
            stat("In progress", summary.in_progress, status_color(Status::InProgress)),
            stat("Completed", summary.completed, status_color(Status::Completed)),
            stat("Overdue", summary.overdue, status_color(Status::Overdue)),
            stat("Notes", summary.notes, Color::White),
            match summary.busiest_day {
                Some((date, count)) => Line::from(vec![
                    Span::styled(format!("{:<14}", "Busiest day"), Style::default().fg(Color::Gray)),
                    Span::raw(format!("{} ({} tasks)", date.format("%Y-%m-%d"), count)),
                ]),
                None => Line::from(Span::styled("Busiest day   -", Style::default().fg(Color::Gray))),
            },
        ];
        let stats = Paragraph::new(lines).block(
            Block::default()
                .title(Span::styled(
                    "Overview",
                    Style::default().fg(SAGE).add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(stats, chunks[0]);

        let rate = summary.completion_rate();
        let completion = Gauge::default()
            .block(Block::default().title("Completion rate").borders(Borders::ALL))
            .gauge_style(Style::default().fg(SAGE).bg(Color::Rgb(40, 42, 48)))
            .percent(rate)
            .label(format!("{}%", rate));
        f.render_widget(completion, chunks[1]);

        for (idx, priority) in Priority::ALL.iter().enumerate() {
            let share = summary.priority_share(*priority);
            let gauge = Gauge::default()
                .block(
                    Block::default()
                        .title(format!("{} priority", priority.label()))
                        .borders(Borders::ALL),
                )
                .gauge_style(Style::default().fg(priority_color(*priority)))
                .percent(share)
                .label(format!("{} task(s)", summary.priority_count(*priority)));
            f.render_widget(gauge, chunks[idx + 2]);
        }
    }

    fn draw_archive(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let notes = self.archived_notes();
        let width = area.width.saturating_sub(16) as usize;
        let items = if notes.is_empty() {
            vec![ListItem::new("No notes yet. Open a day and use the Notes tab.")]
        } else {
            notes
                .iter()
                .map(|note| {
                    let first_line = note.content.lines().next().unwrap_or("(empty)");
                    ListItem::new(Line::from(vec![
                        Span::styled(
                            note.date.format("%Y-%m-%d").to_string(),
                            Style::default().fg(Color::LightYellow),
                        ),
                        Span::raw("  "),
                        Span::raw(truncate_text(first_line, width.saturating_sub(14))),
                        Span::styled(
                            format!("  edited {}", note.updated_at.with_timezone(&Local).format("%H:%M")),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ]))
                })
                .collect()
        };
        let mut state = ListState::default();
        if !notes.is_empty() {
            state.select(Some(self.archive_idx.min(notes.len() - 1)));
        }
        let list = List::new(items)
            .block(
                Block::default()
                    .title(Span::styled(
                        format!("Notes Archive ({})", notes.len()),
                        Style::default().fg(SAGE).add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
            .highlight_style(
                Style::default()
                    .bg(Color::LightCyan)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            );
        f.render_stateful_widget(list, area, &mut state);
    }

    fn draw_settings(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let label = Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD);
        let key_text = match self.config.api_key() {
            Some(key) if self.settings.reveal => key.to_string(),
            Some(key) => format!("{} (saved)", "•".repeat(key.chars().count().min(24))),
            None => "not set".to_string(),
        };
        let mut lines = vec![
            Line::from(Span::styled(
                "Setup Gemini API",
                Style::default().fg(SAGE).add_modifier(Modifier::BOLD),
            )),
            Line::from(
                "To enable AI features, enter your Gemini API key. You can get one from Google AI Studio.",
            ),
            Line::from(""),
            Line::from(vec![Span::styled("API key:     ", label), Span::raw(key_text)]),
        ];
        if self.settings.editing {
            let shown = if self.settings.reveal {
                self.settings.key.with_caret()
            } else {
                format!("{}▌", self.settings.key.masked())
            };
            lines.push(Line::from(vec![
                Span::styled("New key:     ", label),
                Span::styled(shown, Style::default().fg(Color::Cyan)),
            ]));
            let hint = if self.settings.key.is_blank() {
                "Type a key to enable saving"
            } else {
                "Enter to save"
            };
            lines.push(Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))));
        }
        lines.extend([
            Line::from(""),
            Line::from(vec![
                Span::styled("Week starts: ", label),
                Span::raw(self.config.week_start.label()),
            ]),
            Line::from(vec![
                Span::styled("Model:       ", label),
                Span::raw(self.config.model.clone()),
            ]),
            Line::from(vec![
                Span::styled("Config file: ", label),
                Span::raw(describe(&self.location.path)),
            ]),
        ]);
        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            Block::default()
                .title(Span::styled(
                    "Settings",
                    Style::default().fg(SAGE).add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(paragraph, area);
    }

    fn draw_chat(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default()
            .title(Line::from(vec![
                Span::styled(
                    "AI Assistant",
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ),
                Span::styled(" · Powered by Gemini", Style::default().fg(Color::Gray)),
            ]))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(SAGE));
        let inner = block.inner(area);
        f.render_widget(Clear, area);
        f.render_widget(block, area);

        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(3)])
            .split(inner);

        let width = parts[0].width.saturating_sub(1) as usize;
        let mut lines: Vec<Line<'static>> = Vec::new();
        for message in self.chat.session.messages() {
            let (who, style, alignment) = match message.role {
                Role::User => ("You", Style::default().fg(Color::Black).bg(SAGE), Alignment::Right),
                Role::Assistant => ("Assistant", Style::default().fg(Color::White), Alignment::Left),
            };
            lines.push(
                Line::from(Span::styled(
                    format!("{} · {}", who, message.created_at.format("%H:%M")),
                    Style::default().fg(Color::DarkGray),
                ))
                .alignment(alignment),
            );
            for chunk in wrap_text(&message.content, width.saturating_sub(4).max(8)) {
                lines.push(Line::from(Span::styled(chunk, style)).alignment(alignment));
            }
            lines.push(Line::from(""));
        }
        if self.chat.session.is_pending() {
            lines.push(Line::from(Span::styled(
                "Assistant is thinking...",
                Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
            )));
        }
        let visible = parts[0].height as usize;
        let skip = lines.len().saturating_sub(visible);
        let history = Paragraph::new(lines.into_iter().skip(skip).collect::<Vec<_>>());
        f.render_widget(history, parts[0]);

        let (input, input_style) = if self.chat.session.is_pending() {
            ("(waiting for reply)".to_string(), Style::default().fg(Color::DarkGray))
        } else {
            (self.chat.input.with_caret(), Style::default().fg(Color::Cyan))
        };
        let input_box = Paragraph::new(Span::styled(input, input_style)).block(
            Block::default()
                .title("Ask me anything...")
                .borders(Borders::TOP)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(input_box, parts[1]);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);

        let help_bar = Paragraph::new(self.footer_help_line())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(help_bar, rows[0]);

        let status = Paragraph::new(self.status.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(status, rows[1]);
    }

    fn footer_help_line(&self) -> Line<'static> {
        let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::LightCyan));
        if self.chat.open {
            return Line::from(vec![
                key("Enter"),
                Span::raw(" send  "),
                key("Esc"),
                Span::raw(" hide chat  "),
                key("Ctrl+C"),
                Span::raw(" quit"),
            ]);
        }
        if let Some(day) = self.modal.day() {
            let mut spans = vec![key("Tab"), Span::raw(" switch tab  ")];
            match (day.tab, day.form.is_some()) {
                (Tab::Tasks, true) => spans.extend([
                    key("Tab"),
                    Span::raw(" next field  "),
                    key("←→"),
                    Span::raw(" priority  "),
                    key("Ctrl+Enter"),
                    Span::raw(" add  "),
                    key("Esc"),
                    Span::raw(" cancel"),
                ]),
                (Tab::Tasks, false) => spans.extend([
                    key("a"),
                    Span::raw(" add  "),
                    key("space"),
                    Span::raw(" done  "),
                    key("s"),
                    Span::raw(" status  "),
                    key("d"),
                    Span::raw(" delete  "),
                    key("←→"),
                    Span::raw(" day  "),
                    key("Esc"),
                    Span::raw(" close"),
                ]),
                (Tab::Notes, _) => spans.extend([
                    key("Ctrl+S"),
                    Span::raw(" save notes  "),
                    key("Esc"),
                    Span::raw(" close"),
                ]),
            }
            return Line::from(spans);
        }

        let mut spans = vec![
            key("1-4"),
            Span::raw(" panels  "),
            key("c"),
            Span::raw(" chat  "),
            key("b"),
            Span::raw(" sidebar  "),
        ];
        match self.panel {
            Panel::Calendar => spans.extend([
                key("←↑↓→ / h j k l"),
                Span::raw(" move  "),
                key("[ ]"),
                Span::raw(" month  "),
                key("t"),
                Span::raw(" today  "),
                key("Enter"),
                Span::raw(" open day  "),
            ]),
            Panel::NotesArchive => spans.extend([
                key("↑↓"),
                Span::raw(" browse  "),
                key("Enter"),
                Span::raw(" open day  "),
            ]),
            Panel::Settings => spans.extend([
                key("k"),
                Span::raw(" set API key  "),
                key("x"),
                Span::raw(" remove key  "),
                key("w"),
                Span::raw(" week start  "),
            ]),
            Panel::Dashboard => {}
        }
        spans.extend([
            Span::styled("q", Style::default().fg(Color::LightRed)),
            Span::raw(" quit"),
        ]);
        Line::from(spans)
    }

    fn draw_modal(&self, f: &mut ratatui::Frame<'_>, day: &DayModal) {
        let area = centered_rect(70, 75, f.size());
        let block = Block::default()
            .title(Span::styled(
                day.date().format("%A, %B %-d, %Y").to_string(),
                Style::default().fg(SAGE).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(SAGE));
        let inner = block.inner(area);
        f.render_widget(Clear, area);
        f.render_widget(block, area);

        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(1)])
            .split(inner);

        let task_count = self.planner.tasks_on(day.date()).len();
        let tab_span = |tab: Tab, text: String| {
            let style = if day.tab == tab {
                Style::default()
                    .fg(Color::Black)
                    .bg(SAGE)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            Span::styled(format!(" {} ", text), style)
        };
        let tabs = Paragraph::new(Line::from(vec![
            tab_span(Tab::Tasks, format!("{} ({})", Tab::Tasks.label(), task_count)),
            Span::raw("  "),
            tab_span(Tab::Notes, Tab::Notes.label().to_string()),
        ]))
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(tabs, parts[0]);

        match day.tab {
            Tab::Tasks => self.draw_modal_tasks(f, parts[1], day),
            Tab::Notes => {
                let notes = Paragraph::new(field_lines("Notes", &day.note, true))
                    .wrap(Wrap { trim: false });
                f.render_widget(notes, parts[1]);
            }
        }
    }

    fn draw_modal_tasks(&self, f: &mut ratatui::Frame<'_>, area: Rect, day: &DayModal) {
        let mut list_area = area;
        if let Some(form) = &day.form {
            let split = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(8), Constraint::Min(0)])
                .split(area);
            self.draw_task_form(f, split[0], form);
            list_area = split[1];
        }

        let tasks = self.planner.tasks_on(day.date());
        if tasks.is_empty() {
            if day.form.is_none() {
                let empty = Paragraph::new(vec![
                    Line::from(""),
                    Line::from("No tasks for this date."),
                    Line::from("Press a to add one and get started!"),
                ])
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Gray));
                f.render_widget(empty, list_area);
            }
            return;
        }

        let width = list_area.width.saturating_sub(4) as usize;
        let items = tasks
            .iter()
            .map(|task| task_item(task, width))
            .collect::<Vec<_>>();
        let mut state = ListState::default();
        if day.form.is_none() {
            state.select(Some(day.selected.min(tasks.len() - 1)));
        }
        let list = List::new(items)
            .highlight_style(Style::default().bg(Color::Rgb(40, 44, 52)))
            .highlight_symbol("▶ ");
        f.render_stateful_widget(list, list_area, &mut state);
    }

    fn draw_task_form(&self, f: &mut ratatui::Frame<'_>, area: Rect, form: &TaskForm) {
        let mut lines = Vec::new();
        lines.extend(field_lines(
            "Title",
            &form.title,
            form.field == TaskField::Title,
        ));
        lines.extend(field_lines(
            "Description",
            &form.description,
            form.field == TaskField::Description,
        ));
        let active = form.field == TaskField::Priority;
        lines.push(Line::from(vec![
            Span::styled(
                "Priority: ",
                Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::BOLD | Modifier::DIM),
            ),
            Span::styled(
                if active { "◀ " } else { "  " },
                Style::default().fg(Color::Cyan),
            ),
            priority_badge(form.priority),
            Span::styled(
                if active { " ▶" } else { "  " },
                Style::default().fg(Color::Cyan),
            ),
        ]));
        let dialog = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(Span::styled(
                        "New Task",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(dialog, area);
    }
}

/// Shared single/multi-line editing keys. Returns whether the key was used.
fn edit_field(field: &mut FieldValue, key: KeyEvent, multiline: bool) -> bool {
    match key.code {
        KeyCode::Left => field.move_left(),
        KeyCode::Right => field.move_right(),
        KeyCode::Home => field.move_home(),
        KeyCode::End => field.move_end(),
        KeyCode::Up if multiline => field.move_up(),
        KeyCode::Down if multiline => field.move_down(),
        KeyCode::Backspace => field.backspace(),
        KeyCode::Enter if multiline => field.insert_char('\n'),
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            field.insert_char(c)
        }
        _ => return false,
    }
    true
}

fn status_color(status: Status) -> Color {
    match status {
        Status::NotStarted => SAGE,
        Status::InProgress => MOSS,
        Status::Completed => PALE,
        Status::Overdue => CLAY,
    }
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => Color::LightRed,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::LightGreen,
    }
}

fn priority_badge(priority: Priority) -> Span<'static> {
    let bg = match priority {
        Priority::High => Color::Rgb(254, 226, 226),
        Priority::Medium => Color::Rgb(254, 249, 195),
        Priority::Low => Color::Rgb(220, 252, 231),
    };
    let fg = match priority {
        Priority::High => Color::Rgb(153, 27, 27),
        Priority::Medium => Color::Rgb(133, 77, 14),
        Priority::Low => Color::Rgb(22, 101, 52),
    };
    Span::styled(
        format!(" {} ", priority.label()),
        Style::default().fg(fg).bg(bg),
    )
}

fn task_item(task: &Task, width: usize) -> ListItem<'static> {
    let done = task.status.is_done();
    let mut title_style = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
    if done {
        title_style = Style::default()
            .fg(Color::Gray)
            .add_modifier(Modifier::CROSSED_OUT);
    }
    let mut lines = vec![Line::from(vec![
        Span::styled(
            if done { "[x] " } else { "[ ] " },
            Style::default().fg(SAGE),
        ),
        Span::styled(truncate_text(&task.title, width.saturating_sub(14)), title_style),
        Span::raw("  "),
        priority_badge(task.priority),
    ])];
    if let Some(description) = &task.description {
        let mut style = Style::default().fg(Color::Gray);
        if done {
            style = style.add_modifier(Modifier::CROSSED_OUT);
        }
        for chunk in wrap_text(description, width.saturating_sub(4).max(8)) {
            lines.push(Line::from(Span::styled(format!("    {}", chunk), style)));
        }
    }
    lines.push(Line::from(vec![
        Span::raw("    "),
        Span::styled(
            format!(" {} ", task.status.label()),
            Style::default().fg(Color::Black).bg(status_color(task.status)),
        ),
        Span::styled(
            format!(
                "  added {}",
                task.created_at.with_timezone(&Local).format("%b %-d %H:%M")
            ),
            Style::default().fg(Color::DarkGray),
        ),
    ]));
    lines.push(Line::from(""));
    ListItem::new(lines)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn truncate_text(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max <= 3 {
        return text.chars().take(max).collect();
    }
    let mut out: String = text.chars().take(max - 3).collect();
    out.push_str("...");
    out
}

/// Greedy word wrap on char counts; words longer than `width` are split.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word = word.to_string();
            while word.chars().count() > width {
                if !line.is_empty() {
                    out.push(std::mem::take(&mut line));
                }
                let head: String = word.chars().take(width).collect();
                word = word.chars().skip(width).collect();
                out.push(head);
            }
            let needed = if line.is_empty() {
                word.chars().count()
            } else {
                line.chars().count() + 1 + word.chars().count()
            };
            if needed > width && !line.is_empty() {
                out.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&word);
        }
        out.push(line);
    }
    out
}

fn field_lines(label: &str, field: &FieldValue, active: bool) -> Vec<Line<'static>> {
    let label_style = Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::BOLD | Modifier::DIM);
    let value_style = Style::default().fg(if active { Color::Cyan } else { Color::White });
    let prefix = format!("{}: ", label);
    let spacer = " ".repeat(prefix.chars().count());
    let text = if active {
        field.with_caret()
    } else {
        field.value.clone()
    };
    text.split('\n')
        .enumerate()
        .map(|(idx, line)| {
            Line::from(vec![
                Span::styled(
                    if idx == 0 {
                        prefix.clone()
                    } else {
                        spacer.clone()
                    },
                    label_style,
                ),
                Span::styled(line.to_string(), value_style),
            ])
        })
        .collect()
}
