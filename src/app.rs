use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::model::config::AppConfig;
use crate::model::instance::{ConfiguredInstances, InstanceProvider};
use crate::model::manager::{Outcome, SettingsManager};
use crate::model::mode::Mode;
use crate::model::status::PanelStatus;
use crate::msg::Msg;
use crate::prompt::Prompter;

const SWITCH_REMINDER: &str =
    "Please ensure that the in-game standard settings menu is closed before switching!";
const MAX_NOTIFICATIONS: usize = 6;

/// A workflow that needs modal prompts, run outside `update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Switch,
}

/// Everything the panel draws, detached from `App` so dialogs can paint it
/// underneath themselves.
#[derive(Debug, Clone, Default)]
pub struct PanelView {
    pub folder: String,
    pub instance: Option<String>,
    pub status: PanelStatus,
    pub notifications: Vec<String>,
}

pub struct App {
    pub config: AppConfig,
    pub instances: ConfiguredInstances,
    pub manager: SettingsManager,
    pub should_quit: bool,
    notifications: VecDeque<String>,
    pending_action: Option<Action>,
    reload_pending: bool,
}

impl App {
    pub fn new(config: AppConfig, manager: SettingsManager) -> Self {
        let instances = ConfiguredInstances::new(config.instance_paths(), config.instances.active);
        let mut app = Self {
            config,
            instances,
            manager,
            should_quit: false,
            notifications: VecDeque::new(),
            pending_action: None,
            reload_pending: false,
        };
        app.reload();
        app
    }

    pub fn reload(&mut self) {
        self.reload_pending = false;
        self.manager.reload(&self.instances);
    }

    pub fn take_pending_action(&mut self) -> Option<Action> {
        self.pending_action.take()
    }

    /// Folders whose changes should refresh the panel.
    pub fn watched_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = vec![self.manager.store().dir().to_path_buf()];
        dirs.extend(
            self.config
                .instance_paths()
                .into_iter()
                .map(|root| crate::model::instance::Instance::new(root).config_dir()),
        );
        dirs
    }

    // ── MVU: Update ──────────────────────────────────────────────

    pub fn update(&mut self, msg: Msg) {
        match msg {
            Msg::Key(key) => self.handle_key(key),
            Msg::FocusGained => self.reload(),
            Msg::FileChanged(path) => {
                if self.is_relevant_change(&path) {
                    self.reload_pending = true;
                }
            }
            Msg::Tick => {
                if self.reload_pending {
                    self.reload();
                }
            }
            Msg::Resize => {}
            Msg::Quit => self.should_quit = true,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') => self.pending_action = Some(Action::Create),
            KeyCode::Char('s') => self.pending_action = Some(Action::Switch),
            KeyCode::Char('o') => self.open_switcher_folder(),
            KeyCode::Char('r') => self.reload(),
            KeyCode::Tab => self.select_instance(1),
            KeyCode::BackTab => self.select_instance(-1),
            _ => {}
        }
    }

    fn select_instance(&mut self, delta: isize) {
        if self.instances.select_relative(delta) {
            tracing::info!(
                index = self.instances.active_index(),
                "active instance changed"
            );
            self.reload();
        }
    }

    fn is_relevant_change(&self, path: &Path) -> bool {
        if path.starts_with(self.manager.store().dir()) {
            return true;
        }
        self.instances
            .active_instance()
            .is_some_and(|instance| path.starts_with(instance.config_dir()))
    }

    /// Run a prompting workflow to completion and report failures in the
    /// notification area.
    pub fn run_action(&mut self, action: Action, prompter: &mut dyn Prompter) {
        let outcome = match action {
            Action::Create => self.manager.create_snapshot(&self.instances, prompter),
            Action::Switch => self.manager.switch_snapshot(&self.instances, prompter),
        };

        match outcome {
            Outcome::Applied(path) => {
                let name = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.push_notification(format!("now using {name}"));
            }
            Outcome::Failed(notice) => self.push_notification(notice.message().to_string()),
            Outcome::Cancelled | Outcome::NoInstance => {}
        }
    }

    fn open_switcher_folder(&mut self) {
        let dir = self.manager.store().dir().to_path_buf();
        if let Err(err) = open_in_file_browser(&dir) {
            tracing::warn!("failed to open {}: {err}", dir.display());
            self.push_notification(format!("could not open {}: {err}", dir.display()));
        }
    }

    fn push_notification(&mut self, message: String) {
        self.notifications.push_back(message);
        while self.notifications.len() > MAX_NOTIFICATIONS {
            self.notifications.pop_front();
        }
    }

    pub fn panel_view(&self) -> PanelView {
        let instance = self.instances.active_root().map(|root| {
            format!(
                "Instance {}/{}: {}",
                self.instances.active_index() + 1,
                self.instances.len(),
                root.display()
            )
        });

        PanelView {
            folder: self.manager.store().dir().display().to_string(),
            instance,
            status: self.manager.status().clone(),
            notifications: self.notifications.iter().cloned().collect(),
        }
    }

    // ── MVU: View ────────────────────────────────────────────────

    pub fn view(&self, frame: &mut Frame) {
        render_screen(frame, &self.panel_view(), Mode::Panel);
    }
}

/// Draw the panel and status bar.
pub fn render_screen(frame: &mut Frame, panel: &PanelView, mode: Mode) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // body
            Constraint::Length(1), // status bar
        ])
        .split(frame.area());

    render_panel(frame, chunks[0], panel);
    render_status_bar(frame, chunks[1], mode);
}

fn render_panel(frame: &mut Frame, area: Rect, panel: &PanelView) {
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Switcher folder: ", Style::default().fg(Color::DarkGray)),
            Span::raw(panel.folder.clone()),
        ]),
        Line::from(Span::styled(
            panel
                .instance
                .clone()
                .unwrap_or_else(|| "No instances configured".to_string()),
            Style::default().fg(Color::DarkGray),
        )),
        Line::default(),
    ];

    if let Some(warning) = panel.status.warning() {
        lines.push(Line::from(Span::styled(
            warning,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
    }

    if let Some(current) = panel.status.current_file_line() {
        lines.push(Line::from(Span::styled(
            current,
            Style::default().fg(Color::Cyan),
        )));
        lines.push(Line::from(Span::styled(
            SWITCH_REMINDER,
            Style::default().fg(Color::Red),
        )));
        lines.push(Line::default());
        lines.push(Line::from(vec![
            Span::styled(
                " [c] Create New File ",
                Style::default().fg(Color::Black).bg(Color::Magenta),
            ),
            Span::raw("  "),
            Span::styled(
                " [s] Switch to Another File ",
                Style::default().fg(Color::Black).bg(Color::Magenta),
            ),
        ]));
    }

    if !panel.notifications.is_empty() {
        lines.push(Line::default());
        lines.extend(panel.notifications.iter().map(|note| {
            Line::from(Span::styled(
                format!("» {note}"),
                Style::default().fg(Color::Gray),
            ))
        }));
    }

    let body = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(" Standard Switcher ")
            .borders(Borders::ALL)
            .style(Style::default().bg(Color::Rgb(10, 10, 18))),
    );
    frame.render_widget(body, area);
}

fn render_status_bar(frame: &mut Frame, area: Rect, mode: Mode) {
    let mode_style = match mode {
        Mode::Panel => Style::default()
            .fg(Color::Black)
            .bg(Color::Magenta)
            .add_modifier(Modifier::BOLD),
        Mode::Notice => Style::default()
            .fg(Color::Black)
            .bg(Color::Red)
            .add_modifier(Modifier::BOLD),
        _ => Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    };

    let bar = Line::from(vec![
        Span::styled(format!(" {} ", mode.label()), mode_style),
        Span::styled(
            format!(" {} ", mode.hints()),
            Style::default().fg(Color::Gray).bg(Color::DarkGray),
        ),
    ]);
    let status = Paragraph::new(bar).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status, area);
}

/// Clear and frame a centered popup, returning its inner area.
pub fn render_popup(frame: &mut Frame, title: &str, percent_x: u16, height: u16) -> Rect {
    let area = centered_rect(percent_x, height, frame.area());
    frame.render_widget(Clear, area);
    let block = Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .style(Style::default().bg(Color::Rgb(15, 15, 24)));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    inner
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let height = height.min(r.height);
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(height),
            Constraint::Fill(1),
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

fn open_in_file_browser(dir: &Path) -> std::io::Result<()> {
    let opener = if cfg!(target_os = "windows") {
        "explorer"
    } else if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    std::process::Command::new(opener).arg(dir).spawn().map(|_| ())
}
