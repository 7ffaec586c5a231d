use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::chat::UiState;
use crate::tui::{components::Component, Event, Theme};

pub struct StatusBar {
    status_message: String,
    backend_info: String,
    ui_state: UiState,
}

impl StatusBar {
    pub fn new() -> Self {
        Self {
            status_message: "Ready".to_string(),
            backend_info: String::new(),
            ui_state: UiState::Idle,
        }
    }

    pub fn set_status(&mut self, message: &str) {
        if self.status_message != message {
            self.status_message = message.to_string();
        }
    }

    pub fn set_backend_info(&mut self, base_url: &str) {
        self.backend_info = base_url.to_string();
    }

    pub fn set_ui_state(&mut self, state: UiState) {
        self.ui_state = state;
    }

    fn state_indicator(&self, theme: &Theme) -> (&'static str, Style) {
        match self.ui_state {
            UiState::Idle => ("○ idle", theme.secondary()),
            UiState::Sending => ("◐ sending", theme.warning()),
            UiState::Polling => ("● polling", theme.success()),
        }
    }
}

impl Default for StatusBar {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for StatusBar {
    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let (state_symbol, state_style) = self.state_indicator(theme);

        let status_line = Line::from(vec![
            Span::styled(&self.status_message, theme.normal()),
            Span::raw(" | "),
            Span::styled(state_symbol, state_style),
            Span::raw(" | "),
            Span::styled(&self.backend_info, theme.accent()),
            Span::raw(" | "),
            Span::styled("Tab: Panels", theme.secondary()),
            Span::raw(" | "),
            Span::styled("Ctrl+Q: Quit", theme.secondary()),
        ]);

        let paragraph = Paragraph::new(status_line)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(theme.border()),
            )
            .alignment(Alignment::Left);

        frame.render_widget(paragraph, area);
    }

    fn handle_event(&mut self, _event: &Event) -> bool {
        false
    }
}
