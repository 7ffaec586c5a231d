use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::tui::{components::Component, Event, Theme};

#[derive(Debug, Clone)]
pub struct InputBox {
    input: Input,
    is_focused: bool,
    enabled: bool,
    placeholder: String,
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            input: Input::default(),
            is_focused: false,
            enabled: true,
            placeholder: "Type your message... (Enter to send)".to_string(),
        }
    }

    pub fn focus(&mut self) {
        self.is_focused = true;
    }

    pub fn unfocus(&mut self) {
        self.is_focused = false;
    }

    /// Mirrors the widget invariant: disabled whenever a cycle is in flight.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn clear(&mut self) {
        self.input.reset();
    }

    pub fn get_content(&self) -> String {
        self.input.value().to_string()
    }
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let border_style = if !self.enabled {
            theme.secondary()
        } else if self.is_focused {
            theme.accent()
        } else {
            theme.border()
        };

        let title = if self.enabled {
            " Message "
        } else {
            " Message (waiting) "
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title);

        let available_width = area.width.saturating_sub(2) as usize;

        if self.input.value().is_empty() {
            let content = Line::from(Span::styled(&self.placeholder, theme.secondary()));
            let paragraph = Paragraph::new(content).block(block).style(theme.normal());
            frame.render_widget(paragraph, area);
            return;
        }

        let text = self.input.value();
        let cursor_pos = self.input.visual_cursor();

        // Horizontal scroll so the cursor stays visible; char indices keep
        // the slicing UTF-8 safe.
        let scroll_offset = if cursor_pos >= available_width {
            cursor_pos.saturating_sub(available_width) + 1
        } else {
            0
        };

        let chars: Vec<char> = text.chars().collect();
        let start = scroll_offset.min(chars.len());
        let end = (start + available_width).min(chars.len());
        let visible_text: String = chars[start..end].iter().collect();
        let cursor_in_view = cursor_pos.saturating_sub(scroll_offset);

        let paragraph = Paragraph::new(Line::from(visible_text))
            .block(block)
            .style(theme.normal());
        frame.render_widget(paragraph, area);

        if self.is_focused && self.enabled {
            let cursor_x = area.x + 1 + cursor_in_view as u16;
            let cursor_y = area.y + 1;
            if cursor_x < area.x + area.width - 1 {
                frame.set_cursor(cursor_x, cursor_y);
            }
        }
    }

    fn handle_event(&mut self, event: &Event) -> bool {
        if !self.is_focused || !self.enabled {
            return false;
        }

        match event {
            Event::Key(key) => match key.code {
                KeyCode::Enter => false, // Let parent handle send
                _ => {
                    // Don't consume control/alt combinations; those are
                    // global hotkeys.
                    if key.modifiers.contains(KeyModifiers::CONTROL)
                        || key.modifiers.contains(KeyModifiers::ALT)
                    {
                        false
                    } else {
                        self.input
                            .handle_event(&crossterm::event::Event::Key(*key));
                        true
                    }
                }
            },
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEvent;

    #[test]
    fn test_disabled_input_ignores_keys() {
        let mut input_box = InputBox::new();
        input_box.focus();
        input_box.set_enabled(false);

        let handled =
            input_box.handle_event(&Event::Key(KeyEvent::from(KeyCode::Char('x'))));
        assert!(!handled);
        assert_eq!(input_box.get_content(), "");
    }

    #[test]
    fn test_typing_and_clear() {
        let mut input_box = InputBox::new();
        input_box.focus();

        for c in "hi".chars() {
            input_box.handle_event(&Event::Key(KeyEvent::from(KeyCode::Char(c))));
        }
        assert_eq!(input_box.get_content(), "hi");

        input_box.clear();
        assert_eq!(input_box.get_content(), "");
    }
}
