pub mod answer_view;
pub mod input_box;
pub mod response_view;
pub mod status_bar;

use crate::tui::{Event, Theme};
use ratatui::{layout::Rect, Frame};

pub use answer_view::AnswerView;
pub use input_box::InputBox;
pub use response_view::ResponseView;
pub use status_bar::StatusBar;

/// Base trait for all TUI components
pub trait Component {
    /// Render the component
    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme);

    /// Handle input events
    fn handle_event(&mut self, event: &Event) -> bool;
}
