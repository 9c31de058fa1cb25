use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Cursor};
use std::time::Duration;

use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use image::ImageReader;
use miette::IntoDiagnostic;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::app::{App, ManifestState, ProgressEvent, ProgressSink, Resolution};
use crate::domain::{GalleryMode, Threshold};
use crate::labels::{format_label, heading, insights_for};
use crate::render::render_page;
use crate::selection::{Control, Controls};
use crate::store::{FileStore, SavedImages};

const LOGS_MAX: usize = 200;
const HINTS: &str = "Tab focus  ↑/↓ choose  ←/→ threshold  m mode  s save  h html  r reload  l logs  ? help  q quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Gallery,
    Logs,
    Help,
}

struct LogSink {
    logs: RefCell<VecDeque<String>>,
}

impl LogSink {
    fn new() -> Self {
        Self {
            logs: RefCell::new(VecDeque::new()),
        }
    }

    fn push(&self, message: impl Into<String>) {
        let line = format!("[{}] {}", timestamp(), message.into());
        let mut logs = self.logs.borrow_mut();
        logs.push_back(line);
        while logs.len() > LOGS_MAX {
            logs.pop_front();
        }
    }

    fn last(&self) -> Option<String> {
        self.logs.borrow().back().cloned()
    }
}

impl ProgressSink for LogSink {
    fn event(&self, event: ProgressEvent) {
        let message = event.message.trim().to_string();
        match event.elapsed {
            Some(elapsed) => self.push(format!("{message} ({} ms)", elapsed.as_millis())),
            None => self.push(message),
        }
    }
}

struct ModeView {
    manifest: ManifestState,
    controls: Option<Controls>,
    resolution: Option<Resolution>,
}

pub struct Tui {
    mode: GalleryMode,
    focus: Control,
    view: View,
    hexbin: Option<ModeView>,
    ratio: Option<ModeView>,
    sink: LogSink,
    status: String,
    log_scroll: u16,
}

impl Tui {
    pub fn new(mode: GalleryMode) -> Self {
        Self {
            mode,
            focus: Control::Var1,
            view: View::Gallery,
            hexbin: None,
            ratio: None,
            sink: LogSink::new(),
            status: "ready".to_string(),
            log_scroll: 0,
        }
    }

    pub fn run<S: FileStore>(&mut self, app: &App<S>, saved: &SavedImages) -> miette::Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().into_diagnostic()?;
        stdout.execute(EnterAlternateScreen).into_diagnostic()?;

        let backend = CrosstermBackend::new(stdout);
        let result = Terminal::new(backend)
            .into_diagnostic()
            .and_then(|mut terminal| self.event_loop(&mut terminal, app, saved));

        disable_raw_mode().into_diagnostic()?;
        io::stdout()
            .execute(LeaveAlternateScreen)
            .into_diagnostic()?;
        result
    }

    fn event_loop<S: FileStore>(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        app: &App<S>,
        saved: &SavedImages,
    ) -> miette::Result<()> {
        terminal.clear().into_diagnostic()?;
        terminal
            .draw(|frame| draw_loading(frame, self.mode))
            .into_diagnostic()?;
        self.ensure_loaded(app);
        self.refresh(app);

        loop {
            terminal.draw(|frame| draw_ui(frame, self)).into_diagnostic()?;

            if event::poll(Duration::from_millis(250)).into_diagnostic()?
                && let Event::Key(key) = event::read().into_diagnostic()?
                && self.handle_key(key, app, saved)
            {
                return Ok(());
            }
        }
    }

    fn handle_key<S: FileStore>(
        &mut self,
        key: KeyEvent,
        app: &App<S>,
        saved: &SavedImages,
    ) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        if self.view != View::Gallery {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc | KeyCode::Char('l') | KeyCode::Char('?') => {
                    self.view = View::Gallery;
                }
                KeyCode::PageUp | KeyCode::Up => self.scroll_logs(1),
                KeyCode::PageDown | KeyCode::Down => self.scroll_logs(-1),
                _ => {}
            }
            return false;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('?') => self.view = View::Help,
            KeyCode::Char('l') => {
                self.log_scroll = 0;
                self.view = View::Logs;
            }
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.prev(),
            KeyCode::Up => self.step(app, self.focus, -1),
            KeyCode::Down => self.step(app, self.focus, 1),
            KeyCode::Left => self.step(app, Control::Threshold, -1),
            KeyCode::Right => self.step(app, Control::Threshold, 1),
            KeyCode::Char(ch @ '0'..='9') => {
                if let Ok(threshold) = Threshold::new(ch as u8 - b'0')
                    && let Some(controls) = self.current_mut().and_then(|v| v.controls.as_mut())
                {
                    controls.set_threshold(threshold);
                    self.refresh(app);
                }
            }
            KeyCode::Char('m') => {
                self.mode = self.mode.toggle();
                self.status = format!("mode: {}", self.mode.title());
                self.ensure_loaded(app);
                self.refresh(app);
            }
            KeyCode::Char('r') => {
                app.invalidate();
                self.hexbin = None;
                self.ratio = None;
                self.sink.push("caches dropped, reloading");
                self.ensure_loaded(app);
                self.refresh(app);
            }
            KeyCode::Char('s') => self.save_image(saved),
            KeyCode::Char('h') => self.save_html(saved),
            _ => {}
        }
        false
    }

    fn step<S: FileStore>(&mut self, app: &App<S>, control: Control, delta: i32) {
        let Some(view) = self.current_mut() else {
            return;
        };
        let (Some(table), Some(controls)) = (view.manifest.table(), view.controls.as_mut()) else {
            return;
        };
        let before = controls.selection().clone();
        controls.step(table, control, delta);
        if controls.selection() != &before {
            self.refresh(app);
        }
    }

    fn ensure_loaded<S: FileStore>(&mut self, app: &App<S>) {
        if self.current().is_some() {
            return;
        }
        let manifest = app.manifest(self.mode, &self.sink);
        let controls = manifest.table().and_then(Controls::new);
        if let Some(message) = manifest.error_message() {
            self.status = message.to_string();
        }
        let view = ModeView {
            manifest,
            controls,
            resolution: None,
        };
        match self.mode {
            GalleryMode::Hexbin => self.hexbin = Some(view),
            GalleryMode::Ratio => self.ratio = Some(view),
        }
    }

    fn refresh<S: FileStore>(&mut self, app: &App<S>) {
        let mode = self.mode;
        let slot = match mode {
            GalleryMode::Hexbin => self.hexbin.as_mut(),
            GalleryMode::Ratio => self.ratio.as_mut(),
        };
        let Some(view) = slot else {
            return;
        };
        let Some(controls) = &view.controls else {
            return;
        };
        let resolution = app.resolve(mode, controls.selection(), &self.sink);
        let status = match &resolution {
            Resolution::Found { bytes, .. } => format!(
                "showing {} ({})",
                resolution.filename(),
                bytes_to_human(bytes.len() as u64)
            ),
            other => other.message().unwrap_or_default(),
        };
        view.resolution = Some(resolution);
        self.status = status;
    }

    fn save_image(&mut self, saved: &SavedImages) {
        let outcome = match self.current().and_then(|view| view.resolution.as_ref()) {
            Some(Resolution::Found {
                filename, bytes, ..
            }) => match saved.save(filename, bytes) {
                Ok(path) => format!("saved {path}"),
                Err(err) => format!("save failed: {err}"),
            },
            _ => "nothing to save".to_string(),
        };
        self.sink.push(outcome.clone());
        self.status = outcome;
    }

    fn save_html(&mut self, saved: &SavedImages) {
        let mode = self.mode;
        let export = self.current().and_then(|view| match (&view.controls, &view.resolution) {
            (Some(controls), Some(resolution)) => Some((
                format!("{}.html", resolution.filename().trim_end_matches(".png")),
                render_page(mode, controls.selection(), resolution),
            )),
            _ => None,
        });
        let outcome = match export {
            Some((name, page)) => match saved.save(&name, page.as_bytes()) {
                Ok(path) => format!("exported {path}"),
                Err(err) => format!("export failed: {err}"),
            },
            None => "nothing to export".to_string(),
        };
        self.sink.push(outcome.clone());
        self.status = outcome;
    }

    fn current(&self) -> Option<&ModeView> {
        match self.mode {
            GalleryMode::Hexbin => self.hexbin.as_ref(),
            GalleryMode::Ratio => self.ratio.as_ref(),
        }
    }

    fn current_mut(&mut self) -> Option<&mut ModeView> {
        match self.mode {
            GalleryMode::Hexbin => self.hexbin.as_mut(),
            GalleryMode::Ratio => self.ratio.as_mut(),
        }
    }

    fn scroll_logs(&mut self, delta: i16) {
        let max = self.sink.logs.borrow().len().saturating_sub(1) as i16;
        self.log_scroll = (self.log_scroll as i16 + delta).clamp(0, max.max(0)) as u16;
    }
}

fn draw_loading(frame: &mut ratatui::Frame, mode: GalleryMode) {
    let text = Paragraph::new(vec![Line::from(format!(
        "Loading {} manifest...",
        mode.as_str()
    ))])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).title("chart-gallery"));
    frame.render_widget(text, frame.area());
}

fn draw_ui(frame: &mut ratatui::Frame, tui: &Tui) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
        ])
        .split(frame.area());

    frame.render_widget(draw_header(tui), chunks[0]);
    match tui.view {
        View::Gallery => draw_gallery(frame, tui, chunks[1]),
        View::Logs => frame.render_widget(draw_logs_view(tui, chunks[1]), chunks[1]),
        View::Help => frame.render_widget(draw_help(), chunks[1]),
    }
    frame.render_widget(draw_status_line(tui), chunks[2]);
}

fn draw_header(tui: &Tui) -> Paragraph<'static> {
    let mode_span = |mode: GalleryMode| {
        let style = if mode == tui.mode {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::Gray)
        };
        Span::styled(mode.title(), style)
    };
    let title = Line::from(vec![
        Span::styled(
            "CHART-GALLERY",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(env!("CARGO_PKG_VERSION"), Style::default().fg(Color::Gray)),
        Span::raw("   "),
        mode_span(GalleryMode::Hexbin),
        Span::raw("  |  "),
        mode_span(GalleryMode::Ratio),
    ]);
    Paragraph::new(vec![title])
        .alignment(Alignment::Left)
        .block(Block::default().borders(Borders::BOTTOM))
}

fn draw_gallery(frame: &mut ratatui::Frame, tui: &Tui, area: Rect) {
    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let Some(view) = tui.current() else {
        frame.render_widget(Paragraph::new("loading..."), area);
        return;
    };

    frame.render_widget(draw_controls_panel(tui, view), main[0]);
    frame.render_widget(draw_chart_panel(tui.mode, view), main[1]);
}

fn draw_controls_panel(tui: &Tui, view: &ModeView) -> Paragraph<'static> {
    let mut lines = vec![Line::from(Span::styled(
        "GRAPH CONTROLS",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))];

    let (Some(table), Some(controls)) = (view.manifest.table(), &view.controls) else {
        let message = view
            .manifest
            .error_message()
            .unwrap_or("no selectable charts")
            .to_string();
        lines.push(Line::from(Span::styled(
            format!("Error: {message}"),
            Style::default().fg(Color::Red),
        )));
        return Paragraph::new(lines)
            .block(Block::default().borders(Borders::RIGHT))
            .wrap(Wrap { trim: true });
    };

    let selection = controls.selection();
    for control in Control::ORDER {
        let focused = control == tui.focus;
        let label_style = if focused {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(control.label(), label_style)));

        let value_line = if control == Control::Threshold {
            Line::from(vec![
                Span::raw(slider(selection.threshold)),
                Span::raw(format!(" {}", selection.threshold)),
            ])
        } else {
            let options = controls.options(table, control);
            let current = match control {
                Control::Var1 => &selection.var1,
                Control::Var2 => &selection.var2,
                _ => &selection.filter,
            };
            let position = options
                .iter()
                .position(|option| *option == current.as_str())
                .map(|index| index + 1)
                .unwrap_or(0);
            let marker = if focused { "▸ " } else { "  " };
            Line::from(vec![
                Span::raw(marker),
                Span::styled(format_label(current), Style::default().fg(Color::White)),
                Span::styled(
                    format!("  ({position}/{})", options.len()),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        };
        lines.push(value_line);
    }

    Paragraph::new(lines)
        .block(Block::default().borders(Borders::RIGHT))
        .wrap(Wrap { trim: true })
}

fn draw_chart_panel(mode: GalleryMode, view: &ModeView) -> Paragraph<'static> {
    let mut lines = Vec::new();
    let Some(controls) = &view.controls else {
        return Paragraph::new(lines);
    };
    let selection = controls.selection();
    lines.push(Line::from(Span::styled(
        heading(&selection.var1, &selection.var2).to_uppercase(),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    )));
    if mode == GalleryMode::Hexbin {
        lines.push(Line::from(vec![
            Span::styled("● Non-Defaulters ", Style::default().fg(Color::Blue)),
            Span::styled("● Loan Defaulters", Style::default().fg(Color::Red)),
        ]));
    }
    lines.push(Line::from(""));

    match &view.resolution {
        None => lines.push(Line::from("resolving...")),
        Some(resolution) => {
            lines.push(Line::from(vec![
                Span::styled("File: ", Style::default().fg(Color::Gray)),
                Span::raw(resolution.filename().to_string()),
            ]));
            match resolution {
                Resolution::Found { file_id, bytes, .. } => {
                    lines.push(Line::from(vec![
                        Span::styled("Id: ", Style::default().fg(Color::Gray)),
                        Span::raw(file_id.clone()),
                    ]));
                    let dims = image_dimensions(bytes)
                        .map(|(w, h)| format!("{w}x{h} px, "))
                        .unwrap_or_default();
                    lines.push(Line::from(vec![
                        Span::styled("Image: ", Style::default().fg(Color::Gray)),
                        Span::styled(
                            format!("{dims}{}", bytes_to_human(bytes.len() as u64)),
                            Style::default().fg(Color::Green),
                        ),
                    ]));
                    lines.push(Line::from(Span::styled(
                        "press s to save the PNG, h to export an HTML page",
                        Style::default().fg(Color::DarkGray),
                    )));
                    if mode == GalleryMode::Hexbin {
                        let insights = insights_for(&selection.var1, &selection.var2);
                        if !insights.is_empty() {
                            lines.push(Line::from(""));
                            lines.push(Line::from(Span::styled(
                                "Attribute Intuition",
                                Style::default()
                                    .fg(Color::Cyan)
                                    .add_modifier(Modifier::BOLD),
                            )));
                        }
                        for (label, text) in insights {
                            lines.push(Line::from(vec![
                                Span::styled(
                                    format!("{label}: "),
                                    Style::default().add_modifier(Modifier::BOLD),
                                ),
                                Span::raw(text),
                            ]));
                        }
                    }
                }
                Resolution::FetchFailed { message, .. } => {
                    lines.push(Line::from(Span::styled(
                        format!("Error downloading image: {message}"),
                        Style::default().fg(Color::Red),
                    )));
                }
                Resolution::NotFound { filename, notice } => {
                    lines.push(Line::from(Span::styled(
                        "Graph not found.",
                        Style::default().fg(Color::Yellow),
                    )));
                    lines.push(Line::from(format!("Looking for: {filename}")));
                    if let Some(notice) = notice {
                        lines.push(Line::from(Span::styled(
                            notice.clone(),
                            Style::default().fg(Color::Red),
                        )));
                    }
                }
            }
        }
    }

    Paragraph::new(lines).wrap(Wrap { trim: true })
}

fn draw_status_line(tui: &Tui) -> Paragraph<'static> {
    let last = tui.sink.last().unwrap_or_default();
    Paragraph::new(vec![
        Line::from(vec![
            Span::styled("= ", Style::default().fg(Color::DarkGray)),
            Span::raw(tui.status.clone()),
        ]),
        Line::from(Span::styled(
            if tui.view == View::Gallery {
                HINTS.to_string()
            } else {
                format!("{last}   (q back)")
            },
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .block(Block::default().borders(Borders::TOP))
}

fn draw_logs_view(tui: &Tui, area: Rect) -> Paragraph<'static> {
    let logs = tui.sink.logs.borrow();
    let visible = area.height.saturating_sub(1).max(1) as usize;
    let start = logs
        .len()
        .saturating_sub(tui.log_scroll as usize + visible);
    let mut lines = Vec::with_capacity(visible + 1);
    lines.push(Line::from(Span::styled(
        "LOGS (PgUp/PgDown to scroll)",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )));
    for line in logs.iter().skip(start).take(visible) {
        lines.push(Line::from(line.clone()));
    }
    Paragraph::new(lines).wrap(Wrap { trim: true })
}

fn draw_help() -> Paragraph<'static> {
    let lines = vec![
        Line::from("Tab / Shift-Tab   move between controls"),
        Line::from("Up / Down         previous / next option of the focused control"),
        Line::from("Left / Right, 0-9 bin threshold"),
        Line::from("m                 switch gallery (hexbin / ratio)"),
        Line::from("s                 save the current PNG to the image cache"),
        Line::from("h                 export the current chart as a standalone HTML page"),
        Line::from("r                 drop cached manifests and listings, reload"),
        Line::from("l                 logs        q / Esc  quit"),
    ];
    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Help"))
        .wrap(Wrap { trim: true })
}

fn slider(threshold: Threshold) -> String {
    let mut out = String::from("[");
    for i in 0..=Threshold::MAX.value() {
        out.push(if i <= threshold.value() { '#' } else { '.' });
    }
    out.push(']');
    out
}

fn image_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

fn bytes_to_human(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let value = bytes as f64;
    if value >= MB {
        format!("{:.1} MB", value / MB)
    } else if value >= KB {
        format!("{:.1} KB", value / KB)
    } else {
        format!("{bytes} B")
    }
}
