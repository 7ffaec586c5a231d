use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::chat::client::ChatBackend;
use crate::chat::template;
use crate::chat::types::{FinalAnswer, GetChatRequest, SendChatRequest, SessionId};

pub const STATUS_SENDING: &str = "Sending your message...";
pub const STATUS_WAITING: &str = "Waiting for the assistant...";
pub const STATUS_READY: &str = "Ready for your next question.";
pub const STATUS_SEND_FAILED: &str = "Something went wrong. Please try again.";
pub const STATUS_POLL_FAILED: &str = "Error while receiving response.";

pub const RESPONSE_PLACEHOLDER: &str = "The assistant's response will stream here...";
pub const ANSWER_WAITING: &str = "Waiting for final answer...";
pub const ANSWER_MISSING: &str = "No answer received.";

/// Whether the widget accepts input. Input is enabled iff `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiState {
    Idle,
    Sending,
    Polling,
}

/// Recognized widget options, unifying the two deployed variants of the
/// original page: one with a separate final-answer region and JSON input
/// pre-templating, one with neither.
#[derive(Debug, Clone, Copy)]
pub struct WidgetOptions {
    pub include_final_answer_box: bool,
    pub rewrite_json_input: bool,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            include_final_answer_box: true,
            rewrite_json_input: false,
        }
    }
}

/// Snapshot of the display regions the controller drives.
#[derive(Debug, Clone)]
pub struct WidgetView {
    pub status: String,
    pub response: String,
    pub final_answer: String,
}

impl WidgetView {
    fn new() -> Self {
        Self {
            status: STATUS_READY.to_string(),
            response: RESPONSE_PLACEHOLDER.to_string(),
            final_answer: ANSWER_WAITING.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A poll cycle started; the value is its generation. The caller should
    /// start a ticker and feed the generation back into `poll_once`.
    Started(u64),
    /// Empty input or the widget was busy; nothing happened.
    Rejected,
    /// The send request failed; the widget is back to `Idle`.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Not complete yet; keep the ticker running.
    Continue,
    /// The cycle finished; stop the ticker and clear the input field.
    Completed,
    /// The poll failed; stop the ticker.
    Failed,
    /// The tick belonged to a cycle that no longer exists.
    Stale,
}

/// The chat widget controller: a bounded state machine over
/// `Idle -> Sending -> Polling -> Idle`.
///
/// The controller owns the session handle and a monotonic generation counter.
/// Every poll cycle gets a fresh generation; terminating a cycle bumps the
/// counter again, so a stale in-flight tick can never touch a newer cycle.
/// The repeating timer itself belongs to the caller (an event loop), which
/// invokes `poll_once` with the generation it was handed by `submit`.
pub struct ChatController {
    backend: Arc<dyn ChatBackend>,
    options: WidgetOptions,
    state: UiState,
    session: Option<SessionId>,
    generation: u64,
    view: WidgetView,
}

impl ChatController {
    pub fn new(backend: Arc<dyn ChatBackend>, options: WidgetOptions) -> Self {
        Self {
            backend,
            options,
            state: UiState::Idle,
            session: None,
            generation: 0,
            view: WidgetView::new(),
        }
    }

    pub fn state(&self) -> UiState {
        self.state
    }

    pub fn options(&self) -> WidgetOptions {
        self.options
    }

    pub fn input_enabled(&self) -> bool {
        self.state == UiState::Idle
    }

    pub fn view(&self) -> &WidgetView {
        &self.view
    }

    pub fn session(&self) -> Option<&SessionId> {
        self.session.as_ref()
    }

    /// Submits user text to the backend. No-op when the text trims to empty
    /// or when a cycle is already in flight.
    pub async fn submit(&mut self, text: &str) -> SubmitOutcome {
        let trimmed = text.trim();
        if trimmed.is_empty() || self.state != UiState::Idle {
            return SubmitOutcome::Rejected;
        }

        let outgoing = if self.options.rewrite_json_input {
            template::rewrite_json_report(trimmed)
        } else {
            trimmed.to_string()
        };

        self.state = UiState::Sending;
        self.view.status = STATUS_SENDING.to_string();
        self.view.response = RESPONSE_PLACEHOLDER.to_string();
        self.view.final_answer = ANSWER_WAITING.to_string();

        let request = SendChatRequest { text: outgoing };
        match self.backend.send_chat(&request).await {
            Ok(response) => {
                info!(session_id = %response.session_id, "Chat accepted, starting poll cycle");
                self.session = Some(response.session_id);
                self.state = UiState::Polling;
                self.generation += 1;
                self.view.status = STATUS_WAITING.to_string();
                SubmitOutcome::Started(self.generation)
            }
            Err(e) => {
                error!("Failed to send message: {}", e);
                self.state = UiState::Idle;
                self.view.status = STATUS_SEND_FAILED.to_string();
                SubmitOutcome::Failed
            }
        }
    }

    /// Runs one poll tick for the cycle identified by `generation`. Ticks for
    /// a finished or superseded cycle are discarded before any network call.
    pub async fn poll_once(&mut self, generation: u64) -> PollOutcome {
        if self.state != UiState::Polling || generation != self.generation {
            debug!(
                generation,
                current = self.generation,
                "Discarding stale poll tick"
            );
            return PollOutcome::Stale;
        }

        let Some(session_id) = self.session.clone() else {
            // Polling without a session cannot happen through submit; treat
            // it as a terminated cycle.
            return PollOutcome::Stale;
        };

        let request = GetChatRequest { session_id };
        match self.backend.get_chat(&request).await {
            Ok(poll) => {
                if let Some(text) = poll.response {
                    self.view.response = text;
                }

                if poll.chat_complete {
                    self.finish_cycle(STATUS_READY);
                    if self.options.include_final_answer_box {
                        self.view.final_answer = resolve_final_answer(poll.answer.as_deref());
                    }
                    info!("Chat session complete");
                    PollOutcome::Completed
                } else {
                    PollOutcome::Continue
                }
            }
            Err(e) => {
                error!("Polling failed: {}", e);
                self.finish_cycle(STATUS_POLL_FAILED);
                PollOutcome::Failed
            }
        }
    }

    fn finish_cycle(&mut self, status: &str) {
        self.session = None;
        self.state = UiState::Idle;
        self.generation += 1;
        self.view.status = status.to_string();
    }
}

/// Extracts the display text from the JSON-encoded `answer` field. A missing
/// or malformed payload degrades to the placeholder rather than aborting the
/// completed cycle.
fn resolve_final_answer(answer: Option<&str>) -> String {
    match answer {
        Some(raw) => match serde_json::from_str::<FinalAnswer>(raw) {
            Ok(parsed) => parsed.answer,
            Err(e) => {
                warn!("Malformed final answer payload: {}", e);
                ANSWER_MISSING.to_string()
            }
        },
        None => ANSWER_MISSING.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::types::{GetChatResponse, SendChatResponse};
    use crate::error::{Error, Result};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted backend double: hands out queued results and records traffic.
    struct ScriptedBackend {
        send_results: Mutex<VecDeque<Result<SendChatResponse>>>,
        poll_results: Mutex<VecDeque<Result<GetChatResponse>>>,
        sent_texts: Mutex<Vec<String>>,
        poll_count: Mutex<usize>,
    }

    impl ScriptedBackend {
        fn new() -> Self {
            Self {
                send_results: Mutex::new(VecDeque::new()),
                poll_results: Mutex::new(VecDeque::new()),
                sent_texts: Mutex::new(Vec::new()),
                poll_count: Mutex::new(0),
            }
        }

        fn queue_send_ok(&self, session_id: &str) {
            self.send_results
                .lock()
                .unwrap()
                .push_back(Ok(SendChatResponse {
                    session_id: SessionId::new(session_id),
                }));
        }

        fn queue_send_err(&self) {
            self.send_results
                .lock()
                .unwrap()
                .push_back(Err(Error::backend_status("/api/send_chat", 500)));
        }

        fn queue_poll(&self, response: Option<&str>, chat_complete: bool, answer: Option<&str>) {
            self.poll_results
                .lock()
                .unwrap()
                .push_back(Ok(GetChatResponse {
                    response: response.map(str::to_string),
                    chat_complete,
                    answer: answer.map(str::to_string),
                }));
        }

        fn queue_poll_err(&self) {
            self.poll_results
                .lock()
                .unwrap()
                .push_back(Err(Error::backend_status("/api/get_chat", 502)));
        }

        fn sent_texts(&self) -> Vec<String> {
            self.sent_texts.lock().unwrap().clone()
        }

        fn poll_count(&self) -> usize {
            *self.poll_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn send_chat(&self, request: &SendChatRequest) -> Result<SendChatResponse> {
            self.sent_texts.lock().unwrap().push(request.text.clone());
            self.send_results
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected send_chat call")
        }

        async fn get_chat(&self, _request: &GetChatRequest) -> Result<GetChatResponse> {
            *self.poll_count.lock().unwrap() += 1;
            self.poll_results
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected get_chat call")
        }

        async fn health(&self) -> Result<()> {
            Ok(())
        }
    }

    fn controller_with(
        backend: Arc<ScriptedBackend>,
        options: WidgetOptions,
    ) -> ChatController {
        ChatController::new(backend, options)
    }

    #[tokio::test]
    async fn test_empty_submit_never_hits_the_network() {
        let backend = Arc::new(ScriptedBackend::new());
        let mut controller = controller_with(backend.clone(), WidgetOptions::default());

        assert_eq!(controller.submit("   ").await, SubmitOutcome::Rejected);
        assert_eq!(controller.state(), UiState::Idle);
        assert!(backend.sent_texts().is_empty());
    }

    #[tokio::test]
    async fn test_submit_disables_input_until_completion() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.queue_send_ok("s-1");
        let mut controller = controller_with(backend.clone(), WidgetOptions::default());

        let outcome = controller.submit("diagnose host42").await;
        let generation = match outcome {
            SubmitOutcome::Started(g) => g,
            other => panic!("expected Started, got {:?}", other),
        };
        assert_eq!(controller.state(), UiState::Polling);
        assert!(!controller.input_enabled());
        assert_eq!(controller.view().status, STATUS_WAITING);

        // A second submit while polling is a no-op.
        assert_eq!(controller.submit("again").await, SubmitOutcome::Rejected);
        assert_eq!(backend.sent_texts().len(), 1);

        backend.queue_poll(Some("done"), true, None);
        assert_eq!(controller.poll_once(generation).await, PollOutcome::Completed);
        assert!(controller.input_enabled());
    }

    #[tokio::test]
    async fn test_send_failure_returns_to_idle() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.queue_send_err();
        let mut controller = controller_with(backend.clone(), WidgetOptions::default());

        assert_eq!(controller.submit("hello").await, SubmitOutcome::Failed);
        assert_eq!(controller.state(), UiState::Idle);
        assert!(controller.input_enabled());
        assert_eq!(controller.view().status, STATUS_SEND_FAILED);
        assert!(controller.session().is_none());
    }

    #[tokio::test]
    async fn test_incomplete_poll_keeps_cycle_running() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.queue_send_ok("s-1");
        let mut controller = controller_with(backend.clone(), WidgetOptions::default());

        let SubmitOutcome::Started(generation) = controller.submit("hi").await else {
            panic!("send should succeed");
        };

        backend.queue_poll(Some("partial text"), false, None);
        assert_eq!(controller.poll_once(generation).await, PollOutcome::Continue);
        assert_eq!(controller.state(), UiState::Polling);
        assert_eq!(controller.view().response, "partial text");
        assert_eq!(controller.view().status, STATUS_WAITING);

        // A poll without a response field leaves the displayed text alone.
        backend.queue_poll(None, false, None);
        assert_eq!(controller.poll_once(generation).await, PollOutcome::Continue);
        assert_eq!(controller.view().response, "partial text");
    }

    #[tokio::test]
    async fn test_completion_with_answer_shows_answer_text() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.queue_send_ok("s-1");
        let mut controller = controller_with(backend.clone(), WidgetOptions::default());

        let SubmitOutcome::Started(generation) = controller.submit("hi").await else {
            panic!("send should succeed");
        };

        backend.queue_poll(Some("full transcript"), true, Some(r#"{"answer":"42"}"#));
        assert_eq!(controller.poll_once(generation).await, PollOutcome::Completed);

        assert_eq!(controller.state(), UiState::Idle);
        assert!(controller.session().is_none());
        assert_eq!(controller.view().final_answer, "42");
        assert_eq!(controller.view().status, STATUS_READY);
    }

    #[tokio::test]
    async fn test_completion_without_answer_shows_placeholder() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.queue_send_ok("s-1");
        let mut controller = controller_with(backend.clone(), WidgetOptions::default());

        let SubmitOutcome::Started(generation) = controller.submit("hi").await else {
            panic!("send should succeed");
        };

        backend.queue_poll(Some("done"), true, None);
        controller.poll_once(generation).await;
        assert_eq!(controller.view().final_answer, ANSWER_MISSING);
    }

    #[tokio::test]
    async fn test_malformed_answer_degrades_to_placeholder() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.queue_send_ok("s-1");
        let mut controller = controller_with(backend.clone(), WidgetOptions::default());

        let SubmitOutcome::Started(generation) = controller.submit("hi").await else {
            panic!("send should succeed");
        };

        backend.queue_poll(None, true, Some("{not json"));
        assert_eq!(controller.poll_once(generation).await, PollOutcome::Completed);
        assert_eq!(controller.view().final_answer, ANSWER_MISSING);
        assert!(controller.input_enabled());
    }

    #[tokio::test]
    async fn test_answer_box_disabled_leaves_answer_region_alone() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.queue_send_ok("s-1");
        let options = WidgetOptions {
            include_final_answer_box: false,
            rewrite_json_input: false,
        };
        let mut controller = controller_with(backend.clone(), options);

        let SubmitOutcome::Started(generation) = controller.submit("hi").await else {
            panic!("send should succeed");
        };

        backend.queue_poll(None, true, Some(r#"{"answer":"42"}"#));
        controller.poll_once(generation).await;
        assert_eq!(controller.view().final_answer, ANSWER_WAITING);
    }

    #[tokio::test]
    async fn test_poll_failure_terminates_cycle() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.queue_send_ok("s-1");
        let mut controller = controller_with(backend.clone(), WidgetOptions::default());

        let SubmitOutcome::Started(generation) = controller.submit("hi").await else {
            panic!("send should succeed");
        };

        backend.queue_poll_err();
        assert_eq!(controller.poll_once(generation).await, PollOutcome::Failed);
        assert_eq!(controller.state(), UiState::Idle);
        assert_eq!(controller.view().status, STATUS_POLL_FAILED);

        // The dead cycle's ticks are discarded without touching the backend.
        let polls_before = backend.poll_count();
        assert_eq!(controller.poll_once(generation).await, PollOutcome::Stale);
        assert_eq!(backend.poll_count(), polls_before);
    }

    #[tokio::test]
    async fn test_stale_generation_cannot_race_a_fresh_cycle() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.queue_send_ok("s-1");
        let mut controller = controller_with(backend.clone(), WidgetOptions::default());

        let SubmitOutcome::Started(first) = controller.submit("first").await else {
            panic!("send should succeed");
        };

        backend.queue_poll(None, true, None);
        controller.poll_once(first).await;

        backend.queue_send_ok("s-2");
        let SubmitOutcome::Started(second) = controller.submit("second").await else {
            panic!("send should succeed");
        };
        assert_ne!(first, second);

        // A leftover tick from the first cycle is a no-op against the second.
        let polls_before = backend.poll_count();
        assert_eq!(controller.poll_once(first).await, PollOutcome::Stale);
        assert_eq!(backend.poll_count(), polls_before);
        assert_eq!(controller.state(), UiState::Polling);
    }

    #[tokio::test]
    async fn test_json_input_is_rewrapped_when_enabled() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.queue_send_ok("s-1");
        let options = WidgetOptions {
            include_final_answer_box: true,
            rewrite_json_input: true,
        };
        let mut controller = controller_with(backend.clone(), options);

        controller.submit(r#"{"err":1}"#).await;
        let sent = backend.sent_texts();
        assert!(sent[0].starts_with("Find a job template"));
        assert!(sent[0].contains(r#"'{"err":1}'"#));
    }

    #[tokio::test]
    async fn test_plain_input_is_verbatim_even_when_rewrite_enabled() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.queue_send_ok("s-1");
        let options = WidgetOptions {
            include_final_answer_box: true,
            rewrite_json_input: true,
        };
        let mut controller = controller_with(backend.clone(), options);

        controller.submit("hello").await;
        assert_eq!(backend.sent_texts(), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn test_rewrite_disabled_sends_json_verbatim() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.queue_send_ok("s-1");
        let mut controller = controller_with(backend.clone(), WidgetOptions::default());

        controller.submit(r#"{"err":1}"#).await;
        assert_eq!(backend.sent_texts(), vec![r#"{"err":1}"#.to_string()]);
    }
}
