use std::{
    io::{self, Stdout},
    time::{Duration, Instant},
};

use anyhow::Result;
use courier_world_core::{
    Cell, KeyColor,
    engine::OutputFact,
    keyring::KeyRing,
    world::{CellKind, GridWorld},
};
use ratatui::{
    crossterm::{
        self,
        event::{self, Event, KeyCode},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};

/// Positions and held keys, rebuilt from the fact stream alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayState {
    pub agent: Cell,
    pub human: Cell,
    pub keys: KeyRing,
}

impl ReplayState {
    pub fn new(world: &GridWorld) -> Self {
        ReplayState {
            agent: world.agent_start(),
            human: world.human_start(),
            keys: KeyRing::new(),
        }
    }

    pub fn apply(&mut self, fact: &OutputFact) {
        match *fact {
            OutputFact::AgentStart { cell } | OutputFact::AgentMoved { cell, .. } => {
                self.agent = cell
            }
            OutputFact::HumanMoved { cell } => self.human = cell,
            OutputFact::KeyPickedUp { color } => self.keys.add(color),
            OutputFact::KeyDropped { color } | OutputFact::DoorUnlocked { color } => {
                // The engine only logs these for held keys
                self.keys.remove(color).ok();
            }
            OutputFact::LocateHuman { .. }
            | OutputFact::MoveToHuman
            | OutputFact::Diagnostic(_) => {}
        }
    }
}

struct App<'a> {
    world: &'a GridWorld,
    facts: &'a [OutputFact],
    /// Number of facts applied so far.
    cursor: usize,
    state: ReplayState,
    paused: bool,
    should_quit: bool,
}

impl<'a> App<'a> {
    fn new(world: &'a GridWorld, facts: &'a [OutputFact]) -> Self {
        App {
            world,
            facts,
            cursor: 0,
            state: ReplayState::new(world),
            paused: false,
            should_quit: false,
        }
    }

    /// Advances the replay by one fact.
    fn tick(&mut self) {
        if self.paused {
            return;
        }
        if let Some(fact) = self.facts.get(self.cursor) {
            self.state.apply(fact);
            self.cursor += 1;
        }
    }
}

/// Plays `facts` back over `world` until the user quits.
pub fn run(world: &GridWorld, facts: &[OutputFact], tick_rate: Duration) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(world, facts);
    let result = run_app(&mut terminal, &mut app, tick_rate);
    restore_terminal(&mut terminal)?;
    result
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    tick_rate: Duration,
) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
                    KeyCode::Char(' ') => app.paused = !app.paused,
                    _ => {}
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn ui(frame: &mut Frame, app: &App) {
    let [top, help] = Layout::vertical([Constraint::Min(3), Constraint::Length(2)]).areas(frame.area());
    let [map_area, side] =
        Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)]).areas(top);
    let [keys_area, log_area] =
        Layout::vertical([Constraint::Length(3), Constraint::Min(3)]).areas(side);

    render_map(frame, map_area, app);
    render_keys(frame, keys_area, &app.state.keys);
    render_log(frame, log_area, app);

    let status = if app.paused { "paused" } else { "playing" };
    let help_text = Paragraph::new(format!(
        "Step {}/{} ({status})  Space: pause  q/Esc: quit",
        app.cursor,
        app.facts.len()
    ))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, help);
}

fn key_style(color: KeyColor) -> Style {
    match color {
        KeyColor::Red => Style::default().fg(Color::Red),
        KeyColor::Green => Style::default().fg(Color::Green),
        KeyColor::Blue => Style::default().fg(Color::Blue),
        KeyColor::Yellow => Style::default().fg(Color::Yellow),
    }
}

fn render_map(frame: &mut Frame, area: Rect, app: &App) {
    let world = app.world;
    let state = &app.state;
    let mut lines: Vec<Line> = Vec::with_capacity(world.rows());

    for row in 0..world.rows() {
        let mut spans: Vec<Span> = Vec::with_capacity(world.cols());
        for col in 0..world.cols() {
            let cell = Cell { row, col };
            let loose_key = world
                .key_locations()
                .find(|(color, at)| *at == cell && !state.keys.contains(*color))
                .map(|(color, _)| color);

            let span = if cell == state.agent {
                Span::styled("@", Style::default().fg(Color::Cyan).bold())
            } else if cell == state.human {
                Span::styled("h", Style::default().fg(Color::Magenta).bold())
            } else if let Some(color) = loose_key {
                Span::styled("k", key_style(color))
            } else {
                match world.cell_kind(cell).unwrap_or_default() {
                    CellKind::Open => Span::raw("."),
                    CellKind::Wall => Span::styled("#", Style::default().fg(Color::DarkGray)),
                    CellKind::Door(color) if state.keys.contains(color) => {
                        Span::styled("+", key_style(color))
                    }
                    CellKind::Door(color) => Span::styled("|", key_style(color)),
                }
            };
            spans.push(span);
        }
        lines.push(Line::from(spans));
    }

    let map_paragraph = Paragraph::new(lines)
        .block(Block::default().title("Courier World").borders(Borders::ALL))
        .alignment(Alignment::Center);
    frame.render_widget(map_paragraph, area);
}

fn render_keys(frame: &mut Frame, area: Rect, keys: &KeyRing) {
    let mut spans = vec![Span::raw("Held: ")];
    if keys.is_empty() {
        spans.push(Span::styled("none", Style::default().fg(Color::DarkGray)));
    }
    for color in keys.iter() {
        spans.push(Span::styled(format!("{color} "), key_style(color)));
    }
    let widget = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("Keys"));
    frame.render_widget(widget, area);
}

fn render_log(frame: &mut Frame, area: Rect, app: &App) {
    let visible = usize::from(area.height.saturating_sub(2));
    let start = app.cursor.saturating_sub(visible);
    let items: Vec<ListItem> = app.facts[start..app.cursor]
        .iter()
        .map(|fact| {
            let style = match fact {
                OutputFact::Diagnostic(_) => Style::default().fg(Color::Red),
                OutputFact::HumanMoved { .. } => Style::default().fg(Color::Magenta),
                _ => Style::default(),
            };
            ListItem::new(fact.to_string()).style(style)
        })
        .collect();

    let log = List::new(items).block(Block::default().borders(Borders::ALL).title("Log"));
    frame.render_widget(log, area);
}
