use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use fixturecast::config::ModelConfig;
use fixturecast::state::{AppState, Delta, WorkerCommand, apply_delta};
use fixturecast::worker;

struct App {
    state: AppState,
    cfg: ModelConfig,
    cmd_tx: mpsc::Sender<WorkerCommand>,
    competition: String,
    season: Option<i32>,
    local_dir: PathBuf,
    should_quit: bool,
}

impl App {
    fn new(cfg: ModelConfig, cmd_tx: mpsc::Sender<WorkerCommand>) -> Self {
        let competition = std::env::var("COMPETITION_CODE")
            .ok()
            .map(|code| code.trim().to_uppercase())
            .filter(|code| !code.is_empty())
            .unwrap_or_else(|| "PL".to_string());
        let season = std::env::var("SEASON")
            .ok()
            .and_then(|val| val.trim().parse::<i32>().ok());
        let local_dir = std::env::var("OPENFOOTBALL_DIR")
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/openfootball"));
        Self {
            state: AppState::new(),
            cfg,
            cmd_tx,
            competition,
            season,
            local_dir,
            should_quit: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('f') => {
                let cmd = WorkerCommand::FetchRemote {
                    competition: self.competition.clone(),
                    season: self.season,
                };
                self.send(cmd, "Fetch requested");
            }
            KeyCode::Char('o') => {
                let cmd = WorkerCommand::LoadLocal {
                    dir: self.local_dir.clone(),
                };
                self.send(cmd, "Local load requested");
            }
            KeyCode::Char('t') => self.send(WorkerCommand::Train, "Training requested"),
            KeyCode::Char('p') => self.send(WorkerCommand::Predict, "Prediction requested"),
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('s') => self.state.cycle_sort(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            _ => {}
        }
    }

    fn send(&mut self, cmd: WorkerCommand, announce: &str) {
        if self.cmd_tx.send(cmd).is_err() {
            self.state.push_log("[WARN] Worker unavailable");
        } else {
            self.state.push_log(format!("[INFO] {announce}"));
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let cfg = ModelConfig::from_env();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    worker::spawn_worker(tx, cmd_rx, cfg);

    let mut app = App::new(cfg, cmd_tx);
    app.state
        .push_log("[INFO] Press f to fetch, t to train, p to predict, ? for help");
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(4),
            Constraint::Length(3),
            Constraint::Length(7),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(app))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    render_predictions(frame, chunks[1], app);
    render_top_scores(frame, chunks[2], app);

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::TOP));
    frame.render_widget(console, chunks[3]);

    let footer = Paragraph::new(
        "f fetch · o load files · t train · p predict · j/k move · s sort · ? help · q quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[4]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(app: &App) -> String {
    let season = app
        .season
        .map(|year| format!(" season {year}"))
        .unwrap_or_default();
    let trained = app
        .state
        .train
        .map(|t| format!("{} matches replayed, {} teams", t.matches_applied, t.teams_rated))
        .unwrap_or_else(|| "not trained".to_string());
    format!(
        "fixturecast · {}{season} · {trained}\nsort: {} · K={} · home adv ×{:.2}",
        app.competition,
        app.state.sort.label(),
        app.cfg.k_factor,
        app.cfg.home_advantage,
    )
}

fn prediction_columns() -> [Constraint; 8] {
    [
        Constraint::Length(11),
        Constraint::Min(24),
        Constraint::Length(7),
        Constraint::Length(7),
        Constraint::Length(7),
        Constraint::Length(6),
        Constraint::Length(6),
        Constraint::Length(7),
    ]
}

fn render_predictions(frame: &mut Frame, area: Rect, app: &App) {
    if area.height < 2 {
        return;
    }
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let widths = prediction_columns();
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths)
        .split(sections[0]);
    let bold = Style::default().add_modifier(Modifier::BOLD);
    for (idx, title) in ["Date", "Match", "H%", "D%", "A%", "xG H", "xG A", "Top"]
        .iter()
        .enumerate()
    {
        render_cell(frame, cols[idx], title, bold);
    }

    let list_area = sections[1];
    if app.state.predictions.is_empty() {
        let empty = Paragraph::new("No predictions yet. Train (t), then predict (p).")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, list_area);
        return;
    }

    let visible = list_area.height as usize;
    let total = app.state.predictions.len();
    let start = app
        .state
        .selected
        .saturating_sub(visible.saturating_sub(1))
        .min(total.saturating_sub(visible.max(1)));
    let end = (start + visible).min(total);

    for (i, idx) in (start..end).enumerate() {
        let row_area = Rect {
            x: list_area.x,
            y: list_area.y + i as u16,
            width: list_area.width,
            height: 1,
        };
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(widths)
            .split(row_area);

        let p = &app.state.predictions[idx];
        let style = if idx == app.state.selected {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        let top = p
            .top_scorelines
            .first()
            .map(|s| format!("{}-{}", s.home_goals, s.away_goals))
            .unwrap_or_else(|| "-".to_string());

        render_cell(frame, cols[0], &p.date.to_string(), style);
        render_cell(frame, cols[1], &p.label(), style);
        render_cell(frame, cols[2], &format!("{:5.1}", p.home_win_prob * 100.0), style);
        render_cell(frame, cols[3], &format!("{:5.1}", p.draw_prob * 100.0), style);
        render_cell(frame, cols[4], &format!("{:5.1}", p.away_win_prob * 100.0), style);
        render_cell(frame, cols[5], &format!("{:.2}", p.expected_home_goals), style);
        render_cell(frame, cols[6], &format!("{:.2}", p.expected_away_goals), style);
        render_cell(frame, cols[7], &top, style);
    }
}

fn render_top_scores(frame: &mut Frame, area: Rect, app: &App) {
    let text = match app.state.selected_prediction() {
        Some(p) => {
            let scores = p
                .top_scorelines
                .iter()
                .map(|s| format!("{}-{} {:.1}%", s.home_goals, s.away_goals, s.prob * 100.0))
                .collect::<Vec<_>>()
                .join("  ·  ");
            format!("{}: {scores}", p.label())
        }
        None => "-".to_string(),
    };
    let block = Paragraph::new(text)
        .block(Block::default().title("Most likely scores").borders(Borders::TOP));
    frame.render_widget(block, area);
}

fn console_text(state: &AppState) -> String {
    let lines: Vec<&str> = state
        .log
        .iter()
        .rev()
        .take(5)
        .map(|s| s.as_str())
        .collect();
    lines
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_cell(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let paragraph = Paragraph::new(text.to_string()).style(style);
    frame.render_widget(paragraph, area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "fixturecast - Help",
        "",
        "  f            Fetch competition from football-data.org",
        "  o            Load openfootball NDJSON folder",
        "  t            Train (replay stored history)",
        "  p            Predict upcoming fixtures",
        "  j/k or ↑/↓   Move selection",
        "  s            Cycle sort mode",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Set COMPETITION_CODE, SEASON, OPENFOOTBALL_DIR and",
        "FOOTBALL_DATA_API_KEY in the environment or .env",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
