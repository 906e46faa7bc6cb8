use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;

use crate::db::Database;
use crate::models::{ApplicationStatus, Job, Preferences};
use crate::score::{match_score, score_breakdown, tier};

struct AppState {
    jobs: Vec<Job>,
    prefs: Option<Preferences>,
    selected: usize,
    scroll_offset: u16,
    saved: bool,
    status: ApplicationStatus,
}

impl AppState {
    fn new(jobs: Vec<Job>, prefs: Option<Preferences>) -> Self {
        Self {
            jobs,
            prefs,
            selected: 0,
            scroll_offset: 0,
            saved: false,
            status: ApplicationStatus::NotApplied,
        }
    }

    fn current_job(&self) -> Option<&Job> {
        self.jobs.get(self.selected)
    }

    fn refresh_job_state(&mut self, db: &Database) {
        let Some(job) = self.current_job() else { return };
        let job_id = job.id;
        self.saved = db.is_saved(job_id).unwrap_or(false);
        self.status = db.current_status(job_id).unwrap_or_default();
    }

    fn next(&mut self) {
        if !self.jobs.is_empty() && self.selected < self.jobs.len() - 1 {
            self.selected += 1;
            self.scroll_offset = 0;
        }
    }

    fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.scroll_offset = 0;
        }
    }

    fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }
}

pub fn run_browse(db: &Database, jobs: Vec<Job>, prefs: Option<Preferences>) -> Result<()> {
    if jobs.is_empty() {
        println!("No jobs to browse.");
        return Ok(());
    }

    let mut state = AppState::new(jobs, prefs);
    state.refresh_job_state(db);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, db);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    db: &Database,
) -> Result<()> {
    let mut list_state = ListState::default();
    list_state.select(Some(0));

    loop {
        terminal.draw(|frame| draw(frame, state, &mut list_state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let prev_selected = state.selected;
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Down | KeyCode::Char('j') => state.next(),
                KeyCode::Up | KeyCode::Char('k') => state.prev(),
                KeyCode::Char('J') | KeyCode::PageDown => state.scroll_down(),
                KeyCode::Char('K') | KeyCode::PageUp => state.scroll_up(),
                KeyCode::Char('s') => {
                    if let Some(job) = state.current_job() {
                        let job_id = job.id;
                        if state.saved {
                            let _ = db.unsave_job(job_id);
                        } else {
                            let _ = db.save_job(job_id);
                        }
                        state.refresh_job_state(db);
                    }
                }
                KeyCode::Char('a') => {
                    if let Some(job) = state.current_job() {
                        let _ = db.record_status(job.id, ApplicationStatus::Applied);
                        state.refresh_job_state(db);
                    }
                }
                KeyCode::Char('x') => {
                    if let Some(job) = state.current_job() {
                        let _ = db.record_status(job.id, ApplicationStatus::Rejected);
                        state.refresh_job_state(db);
                    }
                }
                KeyCode::Char('w') => {
                    if let Some(job) = state.current_job() {
                        let _ = db.record_status(job.id, ApplicationStatus::Selected);
                        state.refresh_job_state(db);
                    }
                }
                KeyCode::Char('n') => {
                    if let Some(job) = state.current_job() {
                        let _ = db.record_status(job.id, ApplicationStatus::NotApplied);
                        state.refresh_job_state(db);
                    }
                }
                _ => {}
            }
            if state.selected != prev_selected {
                list_state.select(Some(state.selected));
                state.refresh_job_state(db);
            }
        }
    }
    Ok(())
}

fn draw(frame: &mut Frame, state: &AppState, list_state: &mut ListState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(60),
        ])
        .split(frame.area());

    // Left panel: job list with scores
    let items: Vec<ListItem> = state
        .jobs
        .iter()
        .map(|job| {
            let score = match_score(job, state.prefs.as_ref());
            let title = crate::truncate(&job.title, 32);
            ListItem::new(format!(
                "{:>3} #{:<4} {} | {}",
                score, job.id, title, job.company
            ))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!(
            " Jobs ({}) ", state.jobs.len()
        )))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[0], list_state);

    // Right panel: job detail
    let detail = build_detail(state);
    let detail_widget = Paragraph::new(detail)
        .block(Block::default().borders(Borders::ALL).title(" Detail "))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset, 0));

    frame.render_widget(detail_widget, chunks[1]);

    // Footer help
    let help_area = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let help = Paragraph::new(
        " j/k:navigate  J/K:scroll  s:save/unsave  a:applied x:rejected w:selected n:reset  q:quit"
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, help_area[1]);
}

fn build_detail<'a>(state: &'a AppState) -> Text<'a> {
    let Some(job) = state.current_job() else {
        return Text::raw("No job selected");
    };

    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled(
        &job.title,
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(format!("at {}", job.company)));

    let status_style = match state.status {
        ApplicationStatus::NotApplied => Style::default().fg(Color::DarkGray),
        ApplicationStatus::Applied => Style::default().fg(Color::Cyan),
        ApplicationStatus::Rejected => Style::default().fg(Color::Red),
        ApplicationStatus::Selected => Style::default().fg(Color::Green),
    };
    let saved_mark = if state.saved { "  [saved]" } else { "" };
    lines.push(Line::from(Span::styled(
        format!("Status: {}{}", state.status, saved_mark),
        status_style,
    )));

    lines.push(Line::from(format!(
        "{} ({}) | {} exp | {}",
        job.location, job.mode, job.experience, job.salary_range
    )));
    lines.push(Line::from(format!(
        "Posted {} day(s) ago via {}",
        job.posted_days_ago, job.source
    )));
    lines.push(Line::from(format!("Apply: {}", job.apply_url)));
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled(
        format!("Skills: {}", job.skills.join(", ")),
        Style::default().fg(Color::Cyan),
    )));
    lines.push(Line::from(""));

    // Match breakdown
    match &state.prefs {
        Some(prefs) => {
            let score = match_score(job, Some(prefs));
            let score_style = match tier(score) {
                "high" => Style::default().fg(Color::Green),
                "mid" => Style::default().fg(Color::Yellow),
                "low" => Style::default().fg(Color::Magenta),
                _ => Style::default().fg(Color::Red),
            };
            lines.push(Line::from(Span::styled(
                format!("Match: {} ({})", score, tier(score)),
                score_style.add_modifier(Modifier::BOLD),
            )));
            for (signal, points) in score_breakdown(job, prefs) {
                lines.push(Line::from(format!("  +{:<3} {}", points, signal)));
            }
        }
        None => {
            lines.push(Line::from(Span::styled(
                "(No preferences set - run: jobtrack prefs set)",
                Style::default().fg(Color::DarkGray),
            )));
        }
    }
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled(
        "About the role",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for line in textwrap::fill(&job.description, 70).lines() {
        lines.push(Line::from(format!("  {}", line)));
    }

    Text::from(lines)
}
