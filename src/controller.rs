//! Chat interface controller.
//!
//! Orchestrates one round trip: append the user message, call the relay
//! (plus the analysis detector when no files are attached), append the
//! assistant reply, and auto-create a project record after the first
//! successful exchange. States: Idle -> Sending -> Idle; a new submission is
//! ignored while one is in flight.

use chrono::{DateTime, Local, Utc};
use rand::{distr::Alphanumeric, Rng};
use serde::Serialize;
use uuid::Uuid;

use crate::detector::{self, AnalysisType};
use crate::files::FileAttachment;
use crate::logging;
use crate::prompts::{BIO_SYSTEM_PROMPT, WELCOME_MESSAGE};
use crate::relay::{self, ChatRelay};
use crate::store::{ChatStore, Message, Session};

/// Fixed user-visible reply when the relay fails. Raw error detail never
/// reaches the transcript.
pub const APOLOGY_MESSAGE: &str =
    "Sorry, an error occurred while processing your request. Please try again later.";

const PROJECT_CODE_LEN: usize = 8;
const LAST_MESSAGE_PREVIEW_CHARS: usize = 100;

/// Grouping record auto-named from the first assistant reply in a session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    /// Short human-facing code, also recorded in the store.
    pub project_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub message_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
}

/// Everything one completed round trip produced.
#[derive(Debug, Clone)]
pub struct RoundTrip {
    pub reply: String,
    /// The detector asked for a file-upload prompt.
    pub needs_upload_prompt: bool,
    pub analysis_type: Option<AnalysisType>,
    pub detection_reasoning: Option<String>,
    /// Present exactly once per session, on the first successful exchange.
    pub project: Option<Project>,
    /// The relay failed and `reply` is the fixed apology.
    pub failed: bool,
}

#[derive(Debug, Clone)]
pub enum Submit {
    /// Empty submission, or a round trip already in flight. Nothing was
    /// appended and the relay was not invoked.
    Ignored,
    Completed(RoundTrip),
}

pub struct ChatController<R: ChatRelay> {
    relay: R,
    store: ChatStore,
    session_id: String,
    /// Re-entrancy gate, checked at submit time only. Not a lock: state
    /// updates are synchronous between suspension points.
    sending: bool,
    /// One-shot; never reset for the lifetime of the controller.
    project_created: bool,
}

impl<R: ChatRelay> ChatController<R> {
    pub fn new(relay: R, session_id: impl Into<String>) -> Self {
        let session_id = session_id.into();
        let mut store = ChatStore::new();
        store.set_current_session(Some(Session::new(&session_id, "New chat")));
        store.append_message(Message::assistant(WELCOME_MESSAGE));
        logging::log_session(Some(&session_id), "Session started");

        Self {
            relay,
            store,
            session_id,
            sending: false,
            project_created: false,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn store(&self) -> &ChatStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ChatStore {
        &mut self.store
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// Run one round trip for a user submission.
    pub async fn submit(&mut self, input: &str, files: &[FileAttachment]) -> Submit {
        if self.sending {
            return Submit::Ignored;
        }

        let trimmed = input.trim();
        if trimmed.is_empty() && files.is_empty() {
            return Submit::Ignored;
        }

        // Empty text with attachments gets a synthetic message.
        let content = if trimmed.is_empty() {
            format!("Uploaded {} file(s) for analysis", files.len())
        } else {
            trimmed.to_string()
        };

        self.store.append_message(Message::user(&content));
        self.sending = true;

        let outcome = self.run_round_trip(&content, files).await;

        // Back to Idle whether or not the relay failed.
        self.sending = false;

        Submit::Completed(outcome)
    }

    async fn run_round_trip(&mut self, content: &str, files: &[FileAttachment]) -> RoundTrip {
        let (reply, detection) = if files.is_empty() {
            // Detector and chat call are independent and unordered relative
            // to each other; both settle before the assistant message is
            // appended.
            let (detection, reply) = tokio::join!(
                detector::detect(&self.relay, Some(&self.session_id), content),
                relay::send_chat(&self.relay, BIO_SYSTEM_PROMPT, content),
            );
            (reply, Some(detection))
        } else {
            // Attachments already satisfy any implied analysis input; the
            // detector is skipped and the manifest goes into the prompt.
            logging::log_relay(
                Some(&self.session_id),
                &format!("Relaying with {} attached file(s)", files.len()),
            );
            let reply =
                relay::send_chat_with_files(&self.relay, BIO_SYSTEM_PROMPT, content, files).await;
            (reply, None)
        };

        match reply {
            Ok(text) => {
                self.store.append_message(Message::assistant(&text));
                let project = self.maybe_create_project(&text);

                let (needs_upload_prompt, analysis_type, detection_reasoning) = match detection {
                    Some(detection) => {
                        let value = detection.into_value();
                        (value.needs_analysis, value.analysis_type, value.reasoning)
                    }
                    None => (false, None, None),
                };

                RoundTrip {
                    reply: text,
                    needs_upload_prompt,
                    analysis_type,
                    detection_reasoning,
                    project,
                    failed: false,
                }
            }
            Err(e) => {
                logging::log_error(Some(&self.session_id), &format!("Relay failed: {}", e));
                self.store.append_message(Message::assistant(APOLOGY_MESSAGE));

                RoundTrip {
                    reply: APOLOGY_MESSAGE.to_string(),
                    needs_upload_prompt: false,
                    analysis_type: None,
                    detection_reasoning: None,
                    project: None,
                    failed: true,
                }
            }
        }
    }

    /// Emit a project record after the first successful exchange, at most
    /// once per session instance.
    fn maybe_create_project(&mut self, reply: &str) -> Option<Project> {
        if self.project_created || self.store.user_message_count() != 1 {
            return None;
        }
        self.project_created = true;

        let project = Project {
            id: Uuid::new_v4().to_string(),
            project_id: generate_short_project_id(),
            name: derive_project_name(reply),
            created_at: Utc::now(),
            message_count: self.store.len(),
            last_message: Some(truncate_for_preview(reply, LAST_MESSAGE_PREVIEW_CHARS)),
        };

        self.store.set_current_project_id(&project.project_id);
        logging::log_project(
            Some(&self.session_id),
            &format!("Created project '{}' ({})", project.name, project.project_id),
        );

        Some(project)
    }
}

/// Derive a project name from the first assistant reply: lower-case, strip
/// punctuation, keep the first three words of at least four characters,
/// title-case them. Falls back to a date-stamped name when nothing qualifies.
pub fn derive_project_name(reply: &str) -> String {
    let lowered = reply.to_lowercase();
    let stripped: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();

    let words: Vec<String> = stripped
        .split_whitespace()
        .filter(|word| word.chars().count() >= 4)
        .take(3)
        .map(title_case)
        .collect();

    if words.is_empty() {
        return format!("Project_{}", Local::now().format("%Y-%m-%d"));
    }

    words.join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Short human-facing project code.
pub fn generate_short_project_id() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(PROJECT_CODE_LEN)
        .map(char::from)
        .collect()
}

/// Truncate text for the project's last-message preview, adding "..." when
/// shortened.
fn truncate_for_preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}
