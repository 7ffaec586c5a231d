use serde::{Deserialize, Serialize};

/// Opaque backend-issued identifier correlating a send with subsequent polls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Body for POST /api/send_chat.
#[derive(Debug, Clone, Serialize)]
pub struct SendChatRequest {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendChatResponse {
    pub session_id: SessionId,
}

/// Body for POST /api/get_chat.
#[derive(Debug, Clone, Serialize)]
pub struct GetChatRequest {
    pub session_id: SessionId,
}

/// Poll result. `response` carries the partial transcript so far; `answer`,
/// when present, is itself a JSON-encoded string with shape `{"answer": ...}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetChatResponse {
    #[serde(default)]
    pub response: Option<String>,
    pub chat_complete: bool,
    #[serde(default)]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FinalAnswer {
    pub answer: String,
}
