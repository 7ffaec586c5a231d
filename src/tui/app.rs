use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::app::AppState;
use crate::chat::{ChatController, PollOutcome, SubmitOutcome};
use crate::tui::{
    components::{AnswerView, Component, InputBox, ResponseView, StatusBar},
    Event, Theme,
};

#[derive(Clone, Debug, PartialEq)]
pub enum FocusedPanel {
    ResponseView,
    InputBox,
}

pub struct App {
    // Components
    response_view: ResponseView,
    answer_view: AnswerView,
    input_box: InputBox,
    status_bar: StatusBar,

    // State
    focused_panel: FocusedPanel,
    theme: Theme,
    should_quit: bool,

    // Widget controller and its poll timer. The ticker task is the single
    // repeating timer of the widget; it is always aborted before a new cycle
    // starts and when its cycle terminates.
    controller: ChatController,
    poll_interval: Duration,
    poll_task: Option<JoinHandle<()>>,
    event_sender: mpsc::UnboundedSender<Event>,
}

impl App {
    pub fn new(state: Arc<AppState>, event_sender: mpsc::UnboundedSender<Event>) -> Self {
        let controller = ChatController::new(state.backend(), state.widget_options());
        let theme = Theme::by_name(&state.config().ui.theme);

        let mut status_bar = StatusBar::new();
        status_bar.set_backend_info(&state.config().backend.base_url);

        let mut app = Self {
            response_view: ResponseView::new(),
            answer_view: AnswerView::new(),
            input_box: InputBox::new(),
            status_bar,
            focused_panel: FocusedPanel::InputBox,
            theme,
            should_quit: false,
            controller,
            poll_interval: state.poll_interval(),
            poll_task: None,
            event_sender,
        };

        app.update_focus();
        app.sync_views();
        app
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub async fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => {
                if self.handle_global_keys(key) {
                    return;
                }
                self.handle_panel_specific_keys(key);
            }
            Event::Submit(content) => {
                self.submit(content).await;
            }
            Event::PollTick(generation) => {
                self.poll(generation).await;
            }
            _ => {}
        }
    }

    fn handle_global_keys(&mut self, key: KeyEvent) -> bool {
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL)
            | (KeyCode::Char('q'), KeyModifiers::CONTROL) => {
                self.should_quit = true;
                true
            }
            (KeyCode::Tab, KeyModifiers::NONE) | (KeyCode::BackTab, _) => {
                self.next_panel();
                true
            }
            (KeyCode::Esc, KeyModifiers::NONE) => {
                self.set_focused_panel(FocusedPanel::InputBox);
                true
            }
            _ => false,
        }
    }

    fn handle_panel_specific_keys(&mut self, key: KeyEvent) {
        let handled = match self.focused_panel {
            FocusedPanel::ResponseView => self.response_view.handle_event(&Event::Key(key)),
            FocusedPanel::InputBox => self.input_box.handle_event(&Event::Key(key)),
        };

        if handled {
            return;
        }

        if self.focused_panel == FocusedPanel::InputBox && key.code == KeyCode::Enter {
            // The disabled control swallows submits, same as the greyed-out
            // send button.
            if !self.controller.input_enabled() {
                return;
            }
            let content = self.input_box.get_content();
            if !content.trim().is_empty() {
                let _ = self.event_sender.send(Event::Submit(content));
            }
        }
    }

    async fn submit(&mut self, content: String) {
        // Starting a new poll cycle always clears any prior timer first.
        self.stop_poll_ticker();

        match self.controller.submit(&content).await {
            SubmitOutcome::Started(generation) => {
                self.start_poll_ticker(generation);
            }
            SubmitOutcome::Rejected | SubmitOutcome::Failed => {}
        }
        self.sync_views();
    }

    async fn poll(&mut self, generation: u64) {
        match self.controller.poll_once(generation).await {
            PollOutcome::Completed => {
                self.input_box.clear();
                self.stop_poll_ticker();
            }
            PollOutcome::Failed => {
                self.stop_poll_ticker();
            }
            PollOutcome::Continue | PollOutcome::Stale => {}
        }
        self.sync_views();
    }

    fn start_poll_ticker(&mut self, generation: u64) {
        debug!(generation, "Starting poll ticker");
        let sender = self.event_sender.clone();
        let period = self.poll_interval;
        self.poll_task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick of a tokio interval completes immediately; skip
            // it so polling starts one period after the send, like the
            // original repeating timer.
            interval.tick().await;
            loop {
                interval.tick().await;
                if sender.send(Event::PollTick(generation)).is_err() {
                    break;
                }
            }
        }));
    }

    fn stop_poll_ticker(&mut self) {
        if let Some(task) = self.poll_task.take() {
            task.abort();
        }
    }

    /// Pulls the controller's view snapshot into the display components.
    fn sync_views(&mut self) {
        let state = self.controller.state();
        let input_enabled = self.controller.input_enabled();
        let view = self.controller.view();

        self.response_view.set_text(&view.response);
        self.answer_view.set_text(&view.final_answer);
        self.status_bar.set_status(&view.status);
        self.status_bar.set_ui_state(state);
        self.input_box.set_enabled(input_enabled);
    }

    fn next_panel(&mut self) {
        self.focused_panel = match self.focused_panel {
            FocusedPanel::ResponseView => FocusedPanel::InputBox,
            FocusedPanel::InputBox => FocusedPanel::ResponseView,
        };
        self.update_focus();
    }

    fn set_focused_panel(&mut self, panel: FocusedPanel) {
        self.focused_panel = panel;
        self.update_focus();
    }

    fn update_focus(&mut self) {
        self.response_view.unfocus();
        self.input_box.unfocus();

        match self.focused_panel {
            FocusedPanel::ResponseView => self.response_view.focus(),
            FocusedPanel::InputBox => self.input_box.focus(),
        }
    }

    pub fn shutdown(&mut self) {
        self.stop_poll_ticker();
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let include_answer_box = self.controller.options().include_final_answer_box;

        let mut constraints = vec![Constraint::Min(1)]; // Response view
        if include_answer_box {
            constraints.push(Constraint::Length(4)); // Final answer
        }
        constraints.push(Constraint::Length(3)); // Input box
        constraints.push(Constraint::Length(1)); // Status bar

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(frame.size());

        let mut index = 0;
        self.response_view.render(frame, chunks[index], &self.theme);
        index += 1;

        if include_answer_box {
            self.answer_view.render(frame, chunks[index], &self.theme);
            index += 1;
        }

        self.input_box.render(frame, chunks[index], &self.theme);
        self.status_bar.render(frame, chunks[index + 1], &self.theme);
    }
}
