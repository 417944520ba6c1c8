use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use chrono::{Local, TimeZone};
use crossterm::event::{
    self, DisableFocusChange, EnableFocusChange, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use carousel_terminal::config::AppConfig;
use carousel_terminal::feed::spawn_provider;
use carousel_terminal::invite::{Clipboard, copy_invite, default_clipboards};
use carousel_terminal::listing::CardViewModel;
use carousel_terminal::loader::ListingLoader;
use carousel_terminal::render::fmt_count;
use carousel_terminal::state::{
    self, AppState, CARD_GAP, CARD_WIDTH, DataSource, ProviderCommand, Section, ToastKind,
    apply_delta, section_label,
};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: mpsc::Sender<ProviderCommand>,
    next_seq: u64,
    refresh_interval: Duration,
    last_refresh: Instant,
    invite_text: String,
    clipboards: Vec<Box<dyn Clipboard>>,
}

impl App {
    fn new(config: &AppConfig, cmd_tx: mpsc::Sender<ProviderCommand>) -> Self {
        Self {
            state: AppState::new(&config.loader),
            should_quit: false,
            cmd_tx,
            next_seq: 0,
            refresh_interval: config.refresh_interval,
            last_refresh: Instant::now(),
            invite_text: config.invite_text.clone(),
            clipboards: default_clipboards(),
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.go_to(Section::Home),
            KeyCode::Char('2') => self.go_to(Section::Games),
            KeyCode::Char('3') => self.go_to(Section::Community),
            KeyCode::Left | KeyCode::Char('h') => self.state.scroll_left(),
            KeyCode::Right | KeyCode::Char('l') => self.state.scroll_right(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.request_reload(true),
            KeyCode::Char('c') | KeyCode::Char('C') => self.copy_invite(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }

    fn go_to(&mut self, section: Section) {
        if self.state.set_section(section) {
            self.request_reload(false);
        }
    }

    fn request_reload(&mut self, announce: bool) {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.last_refresh = Instant::now();
        if self.cmd_tx.send(ProviderCommand::Reload { seq }).is_err() {
            self.state.push_log("[WARN] Listing provider stopped");
            return;
        }
        self.state.mark_requested(seq);
        if announce {
            self.state.push_log(format!("[INFO] Reload #{seq} requested"));
        }
    }

    fn maybe_refresh(&mut self) {
        if self.last_refresh.elapsed() >= self.refresh_interval {
            self.request_reload(false);
        }
    }

    fn copy_invite(&mut self) {
        match copy_invite(&self.invite_text, &self.clipboards) {
            Ok(method) => {
                self.state.show_toast("Invite copied", ToastKind::Success);
                self.state.push_log(format!("[INFO] Invite copied via {method}"));
            }
            Err(err) => {
                self.state.show_toast("Copy failed", ToastKind::Error);
                self.state.push_log(format!("[WARN] Invite copy failed: {err}"));
            }
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(2);
        }
    };
    let loader = match ListingLoader::from_config(config.loader.clone()) {
        Ok(loader) => loader,
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    };
    let initial_section = std::env::args()
        .nth(1)
        .and_then(|arg| Section::from_hash(&arg))
        .unwrap_or(Section::Games);

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_provider(loader, tx, cmd_rx);

    let mut app = App::new(&config, cmd_tx);
    app.state.set_section(initial_section);
    app.request_reload(false);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableFocusChange
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
    rx: mpsc::Receiver<state::Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        app.maybe_refresh();
        app.state.expire_toast(Instant::now());
        let size = terminal.size()?;
        app.state.set_viewport_width(size.width.saturating_sub(2));

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.on_key(key),
                // Coming back to the terminal refreshes, like a tab becoming visible.
                Event::FocusGained => app.request_reload(false),
                _ => {}
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
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.section {
        Section::Home => render_home(frame, chunks[1], &app.state),
        Section::Games => render_games(frame, chunks[1], &app.state),
        Section::Community => render_community(frame, chunks[1], app),
    }

    let footer = Paragraph::new(footer_text())
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);

    if let Some(toast) = &app.state.toast {
        render_toast(frame, frame.size(), &toast.message, toast.kind);
    }
    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> Text<'static> {
    let tabs: Vec<Span> = Section::ALL
        .iter()
        .enumerate()
        .flat_map(|(i, section)| {
            let style = if *section == state.section {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            [
                Span::styled(format!(" {} {} ", i + 1, section_label(*section)), style),
                Span::raw(" "),
            ]
        })
        .collect();

    let status = match state.source {
        _ if state.loading() => "loading…".to_string(),
        DataSource::Live => "live".to_string(),
        DataSource::Cached { at } => format!("offline · cached {}", format_cached_at(at)),
        DataSource::Placeholder => "waiting for live data".to_string(),
        DataSource::Nothing => String::new(),
    };

    Text::from(vec![
        Line::from(vec![
            Span::styled(
                "  GAMES CAROUSEL  ",
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(status, Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(tabs),
    ])
}

fn footer_text() -> &'static str {
    "1 Home | 2 Games | 3 Community | ←/→ Scroll | r Reload | c Copy invite | ? Help | q Quit"
}

fn stats_line(state: &AppState) -> Line<'static> {
    let stats = state.stats.as_ref();
    let value_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    Line::from(vec![
        Span::raw(" Playing "),
        Span::styled(fmt_count(stats.map(|s| s.playing)), value_style),
        Span::raw("   Visits "),
        Span::styled(fmt_count(stats.map(|s| s.visits)), value_style),
        Span::raw("   Games "),
        Span::styled(fmt_count(stats.map(|s| s.count as u64)), value_style),
    ])
}

fn render_home(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(area);

    let stats = Paragraph::new(stats_line(state))
        .block(Block::default().borders(Borders::ALL).title(" Totals "));
    frame.render_widget(stats, sections[0]);
    render_console(frame, sections[1], state);
}

fn render_games(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(CARD_HEIGHT),
            Constraint::Min(0),
        ])
        .split(area);

    frame.render_widget(Paragraph::new(stats_line(state)), sections[0]);
    render_carousel(frame, sections[1], state);
    render_console(frame, sections[2], state);
}

const CARD_HEIGHT: u16 = 7;

fn render_carousel(frame: &mut Frame, area: Rect, state: &AppState) {
    let inner = Rect {
        x: area.x + 1,
        width: area.width.saturating_sub(2),
        ..area
    };
    if state.cards.is_empty() || inner.width == 0 {
        return;
    }

    let stale = matches!(state.source, DataSource::Cached { .. });
    let pitch = CARD_WIDTH + CARD_GAP;
    let offset = state.scroll_offset;
    for (i, card) in state.cards.iter().enumerate() {
        let start = (i as u16).saturating_mul(pitch);
        if start < offset {
            continue;
        }
        let x = start - offset;
        if x >= inner.width {
            break;
        }
        let card_area = Rect {
            x: inner.x + x,
            y: inner.y,
            width: CARD_WIDTH.min(inner.width - x),
            height: inner.height,
        };
        render_card(frame, card_area, card, stale);
    }

    let arrow_style = Style::default().fg(Color::DarkGray);
    if offset > 0 {
        frame.render_widget(
            Paragraph::new("‹").style(arrow_style),
            Rect { width: 1, ..area },
        );
    }
    if state.content_width() > offset + inner.width {
        frame.render_widget(
            Paragraph::new("›").style(arrow_style),
            Rect {
                x: area.x + area.width.saturating_sub(1),
                width: 1,
                ..area
            },
        );
    }
}

fn render_card(frame: &mut Frame, area: Rect, card: &CardViewModel, stale: bool) {
    let border = if stale { Color::Yellow } else { Color::Cyan };
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));
    if stale {
        block = block.title(" cached ");
    }

    let lines = vec![
        Line::from(Span::styled(
            card.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!(
            "👥 {}  ▶ {}",
            fmt_count(card.playing),
            fmt_count(card.visits)
        )),
        Line::from(Span::styled(
            if card.image_url.is_some() { "▣ icon" } else { "" },
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(Span::styled(
            card.play_url.clone(),
            Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
        )),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_community(frame: &mut Frame, area: Rect, app: &App) {
    let text = vec![
        Line::from("Invite your friends:"),
        Line::from(""),
        Line::from(Span::styled(
            app.invite_text.clone(),
            Style::default().fg(Color::Cyan),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Press c to copy",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let body = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Community "));
    frame.render_widget(body, area);
}

fn render_console(frame: &mut Frame, area: Rect, state: &AppState) {
    if area.height < 3 {
        return;
    }
    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = state
        .logs
        .iter()
        .rev()
        .take(visible)
        .rev()
        .map(|line| {
            let style = if line.starts_with("[WARN]") {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Line::from(Span::styled(line.clone(), style))
        })
        .collect();
    let console = Paragraph::new(lines).block(Block::default().borders(Borders::TOP).title(" Console "));
    frame.render_widget(console, area);
}

fn render_toast(frame: &mut Frame, area: Rect, message: &str, kind: ToastKind) {
    let width = (message.chars().count() as u16 + 4).min(area.width);
    let rect = Rect {
        x: area.x + area.width.saturating_sub(width + 1),
        y: area.y + area.height.saturating_sub(5),
        width,
        height: 3.min(area.height),
    };
    let color = match kind {
        ToastKind::Info => Color::Yellow,
        ToastKind::Success => Color::Green,
        ToastKind::Error => Color::Red,
    };
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(message.to_string())
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(color))),
        rect,
    );
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let width = 46.min(area.width);
    let height = 11.min(area.height);
    let rect = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };
    let text = vec![
        Line::from("1 / 2 / 3   switch section"),
        Line::from("← / h       scroll carousel left"),
        Line::from("→ / l       scroll carousel right"),
        Line::from("r           reload listings"),
        Line::from("c           copy invite text"),
        Line::from("?  / Esc    toggle help"),
        Line::from("q           quit"),
    ];
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(text).block(Block::default().borders(Borders::ALL).title(" Help ")),
        rect,
    );
}

fn format_cached_at(millis: i64) -> String {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "earlier".to_string())
}
