//! In-memory chat session store.
//!
//! Owns the ordered message list and the active session/project identifiers
//! for the lifetime of a session. All operations are synchronous and total:
//! updating or removing an unknown id is a no-op, never an error. Mutations
//! arrive from a single logical thread of event handling, so there is no
//! internal locking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub role: Role,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            content: content.into(),
            role,
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Random UUID ids: unique per store and safe against same-millisecond
/// collisions, unlike timestamp-derived ids.
pub fn new_message_id() -> String {
    Uuid::new_v4().to_string()
}

/// Partial-update payload for `update_message`. Used for in-place content
/// replacement during streaming updates; absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct MessageUpdate {
    pub content: Option<String>,
}

impl MessageUpdate {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
        }
    }
}

/// Session aggregate; optional bookkeeping on top of the message list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: usize,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub starred: bool,
}

impl Session {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            created_at: now,
            updated_at: now,
            message_count: 0,
            archived: false,
            starred: false,
        }
    }
}

/// Holds the ordered message list plus the active session and project
/// identifiers. Exclusively owned by one controller.
#[derive(Debug, Default)]
pub struct ChatStore {
    messages: Vec<Message>,
    current_session: Option<Session>,
    current_project_id: String,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of user-authored messages; drives first-exchange detection.
    pub fn user_message_count(&self) -> usize {
        self.messages.iter().filter(|m| m.role == Role::User).count()
    }

    /// Append to the end of the list. No de-duplication; the list grows by
    /// exactly one.
    pub fn append_message(&mut self, message: Message) {
        self.messages.push(message);
        if let Some(session) = &mut self.current_session {
            session.message_count += 1;
            session.updated_at = Utc::now();
        }
    }

    /// Replace fields of the matching message in place. No-op when the id
    /// is unknown.
    pub fn update_message(&mut self, id: &str, update: MessageUpdate) {
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == id) {
            if let Some(content) = update.content {
                message.content = content;
            }
        }
    }

    /// Remove the message with the matching id. No-op when absent.
    pub fn remove_message(&mut self, id: &str) {
        if let Some(position) = self.messages.iter().position(|m| m.id == id) {
            self.messages.remove(position);
        }
    }

    pub fn clear_messages(&mut self) {
        self.messages.clear();
    }

    pub fn current_session(&self) -> Option<&Session> {
        self.current_session.as_ref()
    }

    pub fn set_current_session(&mut self, session: Option<Session>) {
        self.current_session = session;
    }

    pub fn current_project_id(&self) -> &str {
        &self.current_project_id
    }

    pub fn set_current_project_id(&mut self, project_id: impl Into<String>) {
        self.current_project_id = project_id.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order_and_count() {
        let mut store = ChatStore::new();

        store.append_message(Message::user("first"));
        store.append_message(Message::assistant("second"));
        store.append_message(Message::user("third"));

        assert_eq!(store.len(), 3);
        let contents: Vec<&str> = store.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let mut store = ChatStore::new();
        store.append_message(Message::user("hello"));

        store.update_message("no-such-id", MessageUpdate::content("changed"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.messages()[0].content, "hello");
    }

    #[test]
    fn test_update_replaces_content_in_place() {
        let mut store = ChatStore::new();
        let message = Message::assistant("partial");
        let id = message.id.clone();
        store.append_message(message);

        store.update_message(&id, MessageUpdate::content("partial and complete"));

        assert_eq!(store.messages()[0].content, "partial and complete");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_message() {
        let mut store = ChatStore::new();
        let message = Message::user("to remove");
        let id = message.id.clone();
        store.append_message(message);
        store.append_message(Message::user("to keep"));

        store.remove_message(&id);
        assert_eq!(store.len(), 1);
        assert_eq!(store.messages()[0].content, "to keep");

        // Removing an absent id changes nothing.
        store.remove_message(&id);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clear_messages() {
        let mut store = ChatStore::new();
        store.append_message(Message::user("one"));
        store.append_message(Message::user("two"));

        store.clear_messages();
        assert!(store.is_empty());
    }

    #[test]
    fn test_message_ids_are_unique() {
        let a = Message::user("same content");
        let b = Message::user("same content");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_session_bookkeeping_on_append() {
        let mut store = ChatStore::new();
        store.set_current_session(Some(Session::new("s-1", "New chat")));

        store.append_message(Message::user("hello"));
        store.append_message(Message::assistant("hi"));

        let session = store.current_session().unwrap();
        assert_eq!(session.message_count, 2);
        assert!(session.updated_at >= session.created_at);
    }

    #[test]
    fn test_user_message_count_ignores_assistant_messages() {
        let mut store = ChatStore::new();
        store.append_message(Message::assistant("welcome"));
        store.append_message(Message::user("question"));

        assert_eq!(store.user_message_count(), 1);
    }
}
