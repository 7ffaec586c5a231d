use ratatui::{
    layout::Rect,
    text::Line,
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::{components::Component, Event, Theme};

/// Dedicated region for the agent's final answer. Only rendered when the
/// `include_final_answer_box` option is set.
pub struct AnswerView {
    text: String,
}

impl AnswerView {
    pub fn new() -> Self {
        Self {
            text: String::new(),
        }
    }

    pub fn set_text(&mut self, text: &str) {
        if self.text != text {
            self.text = text.to_string();
        }
    }
}

impl Default for AnswerView {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for AnswerView {
    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border())
            .title(" Final Answer ");

        let paragraph = Paragraph::new(Line::from(self.text.as_str()))
            .block(block)
            .wrap(Wrap { trim: false })
            .style(theme.success());

        frame.render_widget(paragraph, area);
    }

    fn handle_event(&mut self, _event: &Event) -> bool {
        false
    }
}
