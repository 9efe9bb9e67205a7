//! Repo-scoped chat session: a plain send/receive loop kept entirely in
//! memory, outside the state store, and discarded when the user leaves the
//! repository view.

use crate::ai::ChatTurn;

/// How many trailing messages accompany each request as context.
pub const CONTEXT_WINDOW: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Default)]
pub struct ChatSession {
    pub open: bool,
    pub loading: bool,
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage {
            role: Role::User,
            content: content.into(),
        });
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage {
            role: Role::Assistant,
            content: content.into(),
        });
    }

    /// A failed call still produces an assistant turn, so the conversation
    /// never dangles on a missing reply.
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.push_assistant(format!("Sorry, something went wrong: {}", message.into()));
    }

    /// The trailing window sent as history, excluding the in-flight user
    /// message itself.
    pub fn context(&self) -> Vec<ChatTurn> {
        let end = self.messages.len().saturating_sub(1);
        let start = end.saturating_sub(CONTEXT_WINDOW);
        self.messages[start..end]
            .iter()
            .map(|m| ChatTurn {
                role: match m.role {
                    Role::User => "user".to_string(),
                    Role::Assistant => "assistant".to_string(),
                },
                content: m.content.clone(),
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.loading = false;
        self.open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_receive_loop() {
        let mut chat = ChatSession::new();
        chat.push_user("what does main.rs do?");
        chat.loading = true;
        chat.push_assistant("It wires up the CLI.");
        chat.loading = false;

        assert_eq!(chat.messages().len(), 2);
        assert_eq!(chat.messages()[0].role, Role::User);
        assert_eq!(chat.messages()[1].role, Role::Assistant);
    }

    #[test]
    fn test_error_stands_in_for_assistant_turn() {
        let mut chat = ChatSession::new();
        chat.push_user("hello?");
        chat.push_error("AI service unreachable");

        assert_eq!(chat.messages()[1].role, Role::Assistant);
        assert!(chat.messages()[1].content.contains("unreachable"));
    }

    #[test]
    fn test_context_excludes_pending_message_and_is_windowed() {
        let mut chat = ChatSession::new();
        for i in 0..10 {
            chat.push_user(format!("q{i}"));
            chat.push_assistant(format!("a{i}"));
        }
        chat.push_user("latest");

        let context = chat.context();
        assert_eq!(context.len(), CONTEXT_WINDOW);
        assert!(context.iter().all(|t| t.content != "latest"));
        assert_eq!(context.last().unwrap().content, "a9");
    }

    #[test]
    fn test_clear_discards_everything() {
        let mut chat = ChatSession::new();
        chat.open = true;
        chat.loading = true;
        chat.push_user("hi");
        chat.clear();

        assert!(chat.messages().is_empty());
        assert!(!chat.open);
        assert!(!chat.loading);
    }
}
