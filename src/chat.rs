use crate::model::{ChatMessage, Role};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

const TEMPERATURE: f32 = 0.7;
const TOP_K: u32 = 40;
const TOP_P: f32 = 0.95;
const MAX_OUTPUT_TOKENS: u32 = 1024;

pub const GREETING: &str = "Hi! I'm your AI scheduling assistant. I can help you organize tasks, \
suggest optimal meeting times, and provide productivity insights. How can I help you today?";
pub const NO_KEY_REPLY: &str = "Please set up your Gemini API key in Settings to start chatting \
with the AI assistant.";
pub const APOLOGY_REPLY: &str = "Sorry, I'm having trouble connecting right now. Please try \
again in a moment.";

#[derive(thiserror::Error, Debug)]
pub enum ChatError {
    #[error("request failed: {0}")]
    Http(reqwest::Error),
    #[error("completion endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("response carried no candidate text")]
    MissingCandidate,
}

/// Something that turns a prompt into completion text.
pub trait CompletionBackend: Send + Sync {
    fn complete(&self, api_key: &str, prompt: &str) -> Result<String, ChatError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

pub struct GeminiBackend {
    http: reqwest::blocking::Client,
    model: String,
}

impl GeminiBackend {
    pub fn new(model: impl Into<String>) -> Self {
        GeminiBackend {
            http: reqwest::blocking::Client::new(),
            model: model.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", API_BASE, self.model)
    }
}

impl CompletionBackend for GeminiBackend {
    fn complete(&self, api_key: &str, prompt: &str) -> Result<String, ChatError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                top_k: TOP_K,
                top_p: TOP_P,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };
        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .map_err(redact)?;
        let status = response.status();
        let body = response.text().map_err(redact)?;
        if !status.is_success() {
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }
        extract_text(&body)
    }
}

// The request URL carries the key as a query parameter.
fn redact(err: reqwest::Error) -> ChatError {
    ChatError::Http(err.without_url())
}

/// Text of the first part of the first candidate.
pub fn extract_text(body: &str) -> Result<String, ChatError> {
    let parsed: GenerateResponse = serde_json::from_str(body)?;
    parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or(ChatError::MissingCandidate)
}

pub fn build_prompt(user_text: &str) -> String {
    format!(
        "You are a helpful AI scheduling assistant inside a calendar and task tracking app. \
         Help the user organize tasks, suggest optimal meeting times, and share productivity \
         insights. Keep replies short and practical.\n\nUser message: {}",
        user_text
    )
}

#[derive(Clone)]
pub struct ChatClient {
    backend: Arc<dyn CompletionBackend>,
    api_key: Option<String>,
}

impl ChatClient {
    pub fn new(backend: Arc<dyn CompletionBackend>, api_key: Option<String>) -> Self {
        let mut client = ChatClient {
            backend,
            api_key: None,
        };
        client.set_api_key(api_key);
        client
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn set_api_key(&mut self, api_key: Option<String>) {
        self.api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
    }

    /// Never fails: a missing key yields setup instructions, and any
    /// transport or decoding problem yields the apology reply.
    pub fn send(&self, text: &str) -> String {
        let Some(api_key) = self.api_key.as_deref() else {
            return NO_KEY_REPLY.to_string();
        };
        info!("event=chat_request chars={}", text.chars().count());
        match self.backend.complete(api_key, &build_prompt(text)) {
            Ok(reply) => reply,
            Err(err) => {
                warn!("event=chat_request status=failed error={}", err);
                APOLOGY_REPLY.to_string()
            }
        }
    }
}

/// A reply being produced on a worker thread. Dropping the handle cancels
/// delivery: the worker throws its result away instead of sending it.
pub struct PendingReply {
    rx: Receiver<String>,
    cancelled: Arc<AtomicBool>,
}

impl Drop for PendingReply {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Ignored,
    Busy,
    Sent,
}

pub struct ChatSession {
    client: ChatClient,
    messages: Vec<ChatMessage>,
    next_id: u64,
    pending: Option<PendingReply>,
}

impl ChatSession {
    pub fn new(client: ChatClient) -> Self {
        let mut session = ChatSession {
            client,
            messages: Vec::new(),
            next_id: 1,
            pending: None,
        };
        session.push(Role::Assistant, GREETING);
        session
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn set_api_key(&mut self, api_key: Option<String>) {
        self.client.set_api_key(api_key);
    }

    pub fn submit(&mut self, text: &str) -> SubmitOutcome {
        if text.trim().is_empty() {
            return SubmitOutcome::Ignored;
        }
        if self.pending.is_some() {
            return SubmitOutcome::Busy;
        }
        self.push(Role::User, text);
        if !self.client.has_credential() {
            let reply = self.client.send(text);
            self.push(Role::Assistant, reply);
            return SubmitOutcome::Sent;
        }

        let (tx, rx) = mpsc::channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let worker_cancelled = Arc::clone(&cancelled);
        let client = self.client.clone();
        let text = text.to_string();
        thread::spawn(move || {
            let reply = client.send(&text);
            if worker_cancelled.load(Ordering::SeqCst) {
                debug!("event=chat_reply status=discarded reason=cancelled");
                return;
            }
            let _ = tx.send(reply);
        });
        self.pending = Some(PendingReply { rx, cancelled });
        SubmitOutcome::Sent
    }

    /// Moves a finished reply into the history. Returns true when one arrived.
    pub fn poll(&mut self) -> bool {
        let result = match &self.pending {
            Some(pending) => pending.rx.try_recv(),
            None => return false,
        };
        match result {
            Ok(reply) => {
                self.pending = None;
                self.push(Role::Assistant, reply);
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                self.pending = None;
                self.push(Role::Assistant, APOLOGY_REPLY);
                true
            }
        }
    }

    /// Drops any in-flight request without waiting for it.
    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            debug!("event=chat_request status=cancelled");
        }
    }

    fn push(&mut self, role: Role, content: impl Into<String>) {
        let message = ChatMessage::new(self.next_id, role, content);
        debug!("event=chat_message id={} role={:?}", message.id, message.role);
        self.messages.push(message);
        self.next_id += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    #[derive(Default)]
    struct CountingBackend {
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
        fail: bool,
    }

    impl CompletionBackend for CountingBackend {
        fn complete(&self, _api_key: &str, prompt: &str) -> Result<String, ChatError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.fail {
                Err(ChatError::MissingCandidate)
            } else {
                Ok("Block 9-11 for deep work.".to_string())
            }
        }
    }

    fn wait_for_reply(session: &mut ChatSession) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !session.poll() {
            assert!(Instant::now() < deadline, "reply never arrived");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn missing_key_short_circuits_without_network() {
        let backend = Arc::new(CountingBackend::default());
        for key in [None, Some(String::new()), Some("   ".to_string())] {
            let client = ChatClient::new(backend.clone(), key);
            assert_eq!(client.send("hello"), NO_KEY_REPLY);
        }
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn send_embeds_text_in_prompt() {
        let backend = Arc::new(CountingBackend::default());
        let client = ChatClient::new(backend.clone(), Some("k".into()));
        assert_eq!(client.send("plan my week"), "Block 9-11 for deep work.");
        let prompts = backend.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].ends_with("User message: plan my week"));
    }

    #[test]
    fn backend_failure_becomes_apology() {
        let backend = Arc::new(CountingBackend {
            fail: true,
            ..CountingBackend::default()
        });
        let client = ChatClient::new(backend, Some("k".into()));
        assert_eq!(client.send("hi"), APOLOGY_REPLY);
    }

    #[test]
    fn extract_text_reads_first_candidate() {
        let body = r#"{"candidates":[
            {"content":{"parts":[{"text":"first"},{"text":"ignored"}],"role":"model"}},
            {"content":{"parts":[{"text":"second"}]}}
        ]}"#;
        assert_eq!(extract_text(body).unwrap(), "first");
    }

    #[test]
    fn extract_text_rejects_bad_envelopes() {
        for body in [
            r#"{}"#,
            r#"{"candidates":[]}"#,
            r#"{"candidates":[{}]}"#,
            r#"{"candidates":[{"content":{"parts":[]}}]}"#,
            r#"{"candidates":[{"content":{"parts":[{"inlineData":{}}]}}]}"#,
        ] {
            assert!(matches!(extract_text(body), Err(ChatError::MissingCandidate)), "{body}");
        }
        assert!(matches!(extract_text("not json"), Err(ChatError::Decode(_))));
    }

    #[test]
    fn session_starts_with_greeting_and_counts_ids() {
        let backend = Arc::new(CountingBackend::default());
        let mut session = ChatSession::new(ChatClient::new(backend, None));
        assert_eq!(session.messages()[0].content, GREETING);
        assert_eq!(session.submit("  "), SubmitOutcome::Ignored);
        assert_eq!(session.submit("hello"), SubmitOutcome::Sent);
        let ids: Vec<u64> = session.messages().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(session.messages()[1].role, Role::User);
        assert_eq!(session.messages()[2].content, NO_KEY_REPLY);
        assert!(!session.is_pending());
    }

    #[test]
    fn session_blocks_second_submit_until_reply() {
        let backend = Arc::new(CountingBackend::default());
        let mut session = ChatSession::new(ChatClient::new(backend.clone(), Some("k".into())));
        assert_eq!(session.submit("first"), SubmitOutcome::Sent);
        assert!(session.is_pending());
        assert_eq!(session.submit("second"), SubmitOutcome::Busy);
        wait_for_reply(&mut session);
        assert!(!session.is_pending());
        let last = session.messages().last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.content, "Block 9-11 for deep work.");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancel_drops_pending_reply() {
        let backend = Arc::new(CountingBackend::default());
        let mut session = ChatSession::new(ChatClient::new(backend, Some("k".into())));
        session.submit("first");
        session.cancel();
        assert!(!session.is_pending());
        assert!(!session.poll());
        assert_eq!(session.messages().len(), 2);
    }
}
