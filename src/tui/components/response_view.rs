use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    text::Line,
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::{components::Component, Event, Theme};

/// Streamed assistant output. Each poll replaces the whole text, so the view
/// keeps a single block and follows its bottom edge unless the user scrolls.
pub struct ResponseView {
    text: String,
    is_focused: bool,
    auto_scroll: bool,
    scroll_offset: u16,
    last_height: u16,
}

impl ResponseView {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            is_focused: false,
            auto_scroll: true,
            scroll_offset: 0,
            last_height: 0,
        }
    }

    pub fn focus(&mut self) {
        self.is_focused = true;
    }

    pub fn unfocus(&mut self) {
        self.is_focused = false;
    }

    pub fn set_text(&mut self, text: &str) {
        if self.text != text {
            self.text = text.to_string();
            if self.auto_scroll {
                self.scroll_offset = u16::MAX; // clamped in render
            }
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
        self.auto_scroll = false;
    }

    pub fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(1);
        self.auto_scroll = false;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = u16::MAX;
        self.auto_scroll = true;
    }

    fn line_count(&self, width: u16) -> u16 {
        if width == 0 {
            return 0;
        }
        let width = width as usize;
        self.text
            .lines()
            .map(|line| {
                let chars = line.chars().count();
                (chars.max(1)).div_ceil(width) as u16
            })
            .sum()
    }
}

impl Default for ResponseView {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for ResponseView {
    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let border_style = if self.is_focused {
            theme.accent()
        } else {
            theme.border()
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(" Assistant ");

        let inner_width = area.width.saturating_sub(2);
        let inner_height = area.height.saturating_sub(2);
        self.last_height = inner_height;

        let total_lines = self.line_count(inner_width);
        let max_offset = total_lines.saturating_sub(inner_height);
        if self.scroll_offset > max_offset {
            self.scroll_offset = max_offset;
        }

        let lines: Vec<Line> = self.text.lines().map(Line::from).collect();
        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .style(theme.normal())
            .scroll((self.scroll_offset, 0));

        frame.render_widget(paragraph, area);
    }

    fn handle_event(&mut self, event: &Event) -> bool {
        if !self.is_focused {
            return false;
        }

        match event {
            Event::Key(key) => match key.code {
                KeyCode::Up => {
                    self.scroll_up();
                    true
                }
                KeyCode::Down => {
                    self.scroll_down();
                    true
                }
                KeyCode::PageUp => {
                    self.scroll_offset = self.scroll_offset.saturating_sub(self.last_height);
                    self.auto_scroll = false;
                    true
                }
                KeyCode::PageDown => {
                    self.scroll_offset = self.scroll_offset.saturating_add(self.last_height);
                    true
                }
                KeyCode::Home => {
                    self.scroll_offset = 0;
                    self.auto_scroll = false;
                    true
                }
                KeyCode::End => {
                    self.scroll_to_bottom();
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }
}
