//! # Trace viewer
//!
//! Full-screen terminal viewer for recorded [`Traces`]. Every signal gets its
//! own line chart, all sharing one time window that can be scrolled and
//! zoomed.
//!
//! ## Keys
//! - `q`, `Esc`: quit
//! - `←`/`→`: scroll the time window
//! - `+`/`-`: zoom in/out
//! - `Home`/`End`: jump to the start/end of the run
//! - `h`: toggle help

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Wrap},
    Frame, Terminal,
};
use serde::{Deserialize, Serialize};
use std::io;
use std::time::Duration;

use crate::signal::{HIGH_LEVEL_VOLT, LOW_LEVEL_VOLT};
use crate::testbed::Traces;

const MIN_WINDOW: usize = 8;
const COLORS: [Color; 6] = [
    Color::Cyan,
    Color::Yellow,
    Color::Green,
    Color::Magenta,
    Color::LightBlue,
    Color::LightRed,
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    pub title: String,
    /// Initial width of the time window in ticks
    pub window: usize,
    pub poll_interval_ms: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "gatesim".to_string(),
            window: 200,
            poll_interval_ms: 100,
        }
    }
}

/// Viewer state, independent of the terminal.
pub struct TraceViewer<'a> {
    traces: &'a Traces,
    config: ViewerConfig,
    offset: usize,
    window: usize,
    show_help: bool,
    running: bool,
}

impl<'a> TraceViewer<'a> {
    pub fn new(traces: &'a Traces, config: ViewerConfig) -> Self {
        let window = config.window.clamp(MIN_WINDOW, traces.len().max(MIN_WINDOW));
        Self {
            traces,
            config,
            offset: 0,
            window,
            show_help: false,
            running: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// First and one-past-last tick of the visible window.
    pub fn visible_range(&self) -> (usize, usize) {
        (self.offset, (self.offset + self.window).min(self.traces.len()))
    }

    fn max_offset(&self) -> usize {
        self.traces.len().saturating_sub(self.window)
    }

    pub fn handle_key(&mut self, key: KeyCode) {
        if self.show_help {
            self.show_help = false;
            return;
        }
        let step = (self.window / 4).max(1);
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('h') | KeyCode::Char('H') => self.show_help = true,
            KeyCode::Left => self.offset = self.offset.saturating_sub(step),
            KeyCode::Right => self.offset = (self.offset + step).min(self.max_offset()),
            KeyCode::Home => self.offset = 0,
            KeyCode::End => self.offset = self.max_offset(),
            KeyCode::Char('+') => {
                self.window = (self.window / 2).max(MIN_WINDOW);
            }
            KeyCode::Char('-') => {
                self.window = (self.window * 2).min(self.traces.len().max(MIN_WINDOW));
                self.offset = self.offset.min(self.max_offset());
            }
            _ => {}
        }
    }

    fn draw(&self, f: &mut Frame) {
        if self.show_help {
            self.draw_help_screen(f);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(4)])
            .split(f.size());

        let (start, end) = self.visible_range();
        let status = Paragraph::new(Line::from(vec![
            Span::styled(
                self.config.title.clone(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(
                "  ticks {}..{} of {}  ",
                start,
                end,
                self.traces.len()
            )),
            Span::styled("q", Style::default().fg(Color::Yellow)),
            Span::raw("=quit "),
            Span::styled("h", Style::default().fg(Color::Yellow)),
            Span::raw("=help"),
        ]))
        .block(Block::default().borders(Borders::ALL).title("Status"));
        f.render_widget(status, chunks[0]);

        let names: Vec<&str> = self.traces.names().collect();
        if names.is_empty() {
            let empty = Paragraph::new("No traces recorded")
                .block(Block::default().borders(Borders::ALL));
            f.render_widget(empty, chunks[1]);
            return;
        }

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                names
                    .iter()
                    .map(|_| Constraint::Ratio(1, names.len() as u32))
                    .collect::<Vec<_>>(),
            )
            .split(chunks[1]);

        for (i, name) in names.iter().enumerate() {
            self.draw_trace(f, rows[i], name, COLORS[i % COLORS.len()]);
        }
    }

    fn draw_trace(&self, f: &mut Frame, area: Rect, name: &str, color: Color) {
        let (start, end) = self.visible_range();
        let points: Vec<(f64, f64)> = self
            .traces
            .get(name)
            .unwrap_or(&[])
            .iter()
            .enumerate()
            .skip(start)
            .take(end - start)
            .map(|(tick, &v)| (tick as f64, v))
            .collect();

        let datasets = vec![Dataset::default()
            .name(name.to_string())
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(color))
            .data(&points)];

        let chart = Chart::new(datasets)
            .block(Block::default().borders(Borders::ALL).title(name.to_string()))
            .x_axis(
                Axis::default()
                    .bounds([start as f64, end.max(start + 1) as f64])
                    .labels(vec![
                        Span::raw(start.to_string()),
                        Span::raw(end.to_string()),
                    ]),
            )
            .y_axis(
                Axis::default()
                    .bounds([LOW_LEVEL_VOLT - 0.5, HIGH_LEVEL_VOLT + 0.5])
                    .labels(vec![Span::raw("0V"), Span::raw("5V")]),
            );
        f.render_widget(chart, area);
    }

    fn draw_help_screen(&self, f: &mut Frame) {
        let key = |k: &'static str, text: &'static str| {
            Line::from(vec![
                Span::styled(k, Style::default().fg(Color::Yellow)),
                Span::raw(text),
            ])
        };
        let help_text = vec![
            Line::from(vec![Span::styled(
                "Trace viewer help",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
            key("  q, Esc", " - Quit"),
            key("  Left/Right", " - Scroll the time window"),
            key("  +/-", " - Zoom in/out"),
            key("  Home/End", " - Jump to start/end"),
            key("  h", " - Show/hide this help"),
            Line::from(""),
            Line::from(vec![Span::raw("Press any key to return to the traces...")]),
        ];

        let help = Paragraph::new(help_text)
            .style(Style::default().fg(Color::White))
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Help"));
        f.render_widget(help, f.size());
    }

    pub fn run(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        let poll = Duration::from_millis(self.config.poll_interval_ms);
        while self.running {
            terminal.draw(|f| self.draw(f))?;
            if event::poll(poll)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Opens the viewer on `traces` and blocks until the user quits.
pub fn run_viewer(traces: &Traces, config: ViewerConfig) -> io::Result<()> {
    tracing::debug!("opening trace viewer on {} ticks", traces.len());
    TraceViewer::new(traces, config).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuits::toggle_divider;
    use crate::signal::NoNoise;
    use crate::testbed::Testbed;

    fn traces(ticks: u64) -> Traces {
        let mut network = toggle_divider().unwrap();
        network.set_noise(Box::new(NoNoise));
        let mut bed = Testbed::new(network);
        bed.add_clock_source("CLK", 10, 0).unwrap();
        bed.run(ticks).unwrap()
    }

    fn config(window: usize) -> ViewerConfig {
        ViewerConfig {
            window,
            ..ViewerConfig::default()
        }
    }

    #[test]
    fn test_window_clamped_to_trace_length() {
        let traces = traces(50);
        let viewer = TraceViewer::new(&traces, config(500));
        assert_eq!(viewer.visible_range(), (0, 50));
    }

    #[test]
    fn test_scroll_and_zoom() {
        let traces = traces(100);
        let mut viewer = TraceViewer::new(&traces, config(40));

        viewer.handle_key(KeyCode::Right);
        assert_eq!(viewer.visible_range(), (10, 50));
        viewer.handle_key(KeyCode::End);
        assert_eq!(viewer.visible_range(), (60, 100));
        viewer.handle_key(KeyCode::Left);
        assert_eq!(viewer.visible_range(), (50, 90));

        viewer.handle_key(KeyCode::Char('+'));
        assert_eq!(viewer.visible_range(), (50, 70));
        viewer.handle_key(KeyCode::Char('-'));
        viewer.handle_key(KeyCode::Char('-'));
        assert_eq!(viewer.visible_range(), (20, 100));
        viewer.handle_key(KeyCode::Home);
        assert_eq!(viewer.visible_range(), (0, 80));
    }

    #[test]
    fn test_help_and_quit_keys() {
        let traces = traces(20);
        let mut viewer = TraceViewer::new(&traces, config(20));
        viewer.handle_key(KeyCode::Char('h'));
        // Any key closes help without acting
        viewer.handle_key(KeyCode::Char('q'));
        assert!(viewer.is_running());
        viewer.handle_key(KeyCode::Esc);
        assert!(!viewer.is_running());
    }
}
