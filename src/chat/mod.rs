pub mod client;
pub mod controller;
pub mod template;
pub mod types;

pub use client::{ChatBackend, HttpBackend};
pub use controller::{ChatController, PollOutcome, SubmitOutcome, UiState, WidgetOptions};
pub use types::{GetChatRequest, GetChatResponse, SendChatRequest, SendChatResponse, SessionId};
