use std::cell::{Cell, RefCell};
use std::sync::mpsc::Receiver;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Terminal;
use ratatui::backend::Backend;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};

use crate::app::{PanelView, render_popup, render_screen};
use crate::model::mode::Mode;
use crate::msg::Msg;
use crate::prompt::{Notice, Prompter};

/// Modal dialogs drawn over the panel. Each call blocks on the message
/// channel until the user answers, like a desktop message box.
pub struct TerminalPrompter<'a, B: Backend> {
    terminal: &'a mut Terminal<B>,
    rx: &'a Receiver<Msg>,
    backdrop: PanelView,
    deferred: Vec<Msg>,
}

enum KeyResult<T> {
    Continue,
    Done(Option<T>),
}

impl<'a, B: Backend> TerminalPrompter<'a, B> {
    pub fn new(terminal: &'a mut Terminal<B>, rx: &'a Receiver<Msg>, backdrop: PanelView) -> Self {
        Self {
            terminal,
            rx,
            backdrop,
            deferred: Vec::new(),
        }
    }

    /// Messages that arrived while a dialog was open and still need `App::update`.
    pub fn into_deferred(self) -> Vec<Msg> {
        self.deferred
    }

    /// Draw with `draw_overlay`, then feed keys to `on_key` until it finishes.
    /// A closed channel or a quit request cancels. Reload hooks and quit
    /// requests are kept for the caller.
    fn modal<T>(
        &mut self,
        mode: Mode,
        mut draw_overlay: impl FnMut(&mut ratatui::Frame),
        mut on_key: impl FnMut(KeyEvent) -> KeyResult<T>,
    ) -> Option<T> {
        loop {
            let backdrop = &self.backdrop;
            if let Err(err) = self.terminal.draw(|frame| {
                render_screen(frame, backdrop, mode);
                draw_overlay(frame);
            }) {
                tracing::error!("dialog draw failed: {err}");
                return None;
            }

            let key = loop {
                match self.rx.recv() {
                    Ok(Msg::Key(key)) => break key,
                    Ok(Msg::Resize) => break KeyEvent::new(KeyCode::Null, KeyModifiers::NONE),
                    Ok(Msg::Quit) => {
                        self.deferred.push(Msg::Quit);
                        return None;
                    }
                    Ok(msg @ (Msg::FocusGained | Msg::FileChanged(_))) => self.deferred.push(msg),
                    Ok(Msg::Tick) => {}
                    Err(_) => return None,
                }
            };

            if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                return None;
            }

            if let KeyResult::Done(answer) = on_key(key) {
                return answer;
            }
        }
    }
}

impl<B: Backend> Prompter for TerminalPrompter<'_, B> {
    fn ask_text(&mut self, title: &str, warning: Option<&str>, message: &str) -> Option<String> {
        let input = RefCell::new(String::new());

        self.modal(
            Mode::NamePrompt,
            |frame| {
                let inner = render_popup(frame, title, 70, 8);
                let mut lines = Vec::new();
                if let Some(warning) = warning {
                    lines.push(Line::from(Span::styled(
                        warning,
                        Style::default().fg(Color::Yellow),
                    )));
                }
                lines.push(Line::from(message));
                lines.push(Line::default());
                lines.push(Line::from(Span::styled(
                    format!("> {}", input.borrow()),
                    Style::default().fg(Color::Cyan),
                )));
                let body = Paragraph::new(lines).wrap(Wrap { trim: false });
                frame.render_widget(body, inner);
            },
            |key| {
                match key.code {
                    KeyCode::Esc => return KeyResult::Done(None),
                    KeyCode::Enter => return KeyResult::Done(Some(input.borrow().clone())),
                    KeyCode::Backspace => {
                        input.borrow_mut().pop();
                    }
                    KeyCode::Char(ch)
                        if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
                    {
                        input.borrow_mut().push(ch);
                    }
                    _ => {}
                }
                KeyResult::Continue
            },
        )
    }

    fn choose(
        &mut self,
        title: &str,
        message: &str,
        options: &[String],
        default: usize,
    ) -> Option<String> {
        if options.is_empty() {
            return None;
        }
        let last = options.len() - 1;
        let selected = Cell::new(default.min(last));
        let height = (options.len() as u16).saturating_add(4).min(20);

        self.modal(
            Mode::SelectFile,
            |frame| {
                let inner = render_popup(frame, title, 60, height);
                let current = selected.get();
                let visible = inner.height.saturating_sub(2) as usize;
                let skip = current.saturating_sub(visible.saturating_sub(1));

                let mut lines = vec![Line::from(message), Line::default()];
                lines.extend(options.iter().enumerate().skip(skip).take(visible).map(
                    |(idx, name)| {
                        if idx == current {
                            Line::from(Span::styled(
                                format!("> {name}"),
                                Style::default().fg(Color::Black).bg(Color::Cyan),
                            ))
                        } else {
                            Line::from(Span::styled(
                                format!("  {name}"),
                                Style::default().fg(Color::Gray),
                            ))
                        }
                    },
                ));
                frame.render_widget(Paragraph::new(lines), inner);
            },
            |key| {
                match key.code {
                    KeyCode::Esc => return KeyResult::Done(None),
                    KeyCode::Enter => {
                        return KeyResult::Done(options.get(selected.get()).cloned());
                    }
                    KeyCode::Char('j') | KeyCode::Down => {
                        selected.set((selected.get() + 1).min(last));
                    }
                    KeyCode::Char('k') | KeyCode::Up => {
                        selected.set(selected.get().saturating_sub(1));
                    }
                    KeyCode::Home => selected.set(0),
                    KeyCode::End => selected.set(last),
                    _ => {}
                }
                KeyResult::Continue
            },
        )
    }

    fn notify(&mut self, notice: Notice) {
        self.modal::<()>(
            Mode::Notice,
            |frame| {
                let inner = render_popup(frame, notice.title(), 60, 7);
                let body = Paragraph::new(vec![
                    Line::from(Span::styled(
                        notice.message(),
                        Style::default().fg(Color::Red),
                    )),
                    Line::default(),
                    Line::from(Span::styled("[ OK ]", Style::default().fg(Color::Gray))),
                ])
                .wrap(Wrap { trim: false });
                frame.render_widget(body, inner);
            },
            |key| match key.code {
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => KeyResult::Done(None),
                _ => KeyResult::Continue,
            },
        );
    }
}
