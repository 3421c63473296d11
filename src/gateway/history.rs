//! Conversation history
//!
//! Turns exchanged with the model in one chat session. Append-only apart from
//! growing the model turn that is currently streaming.

use serde::{Deserialize, Serialize};

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Model,
}

/// A single turn in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Model,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    messages: Vec<ChatMessage>,
    /// Leading turns that carry instructions and are never shown to the user.
    hidden_prefix: usize,
}

impl ConversationHistory {
    /// History opening with a hidden instruction turn and a visible greeting.
    pub fn seeded(instruction: String, greeting: String) -> Self {
        Self {
            messages: vec![ChatMessage::user(instruction), ChatMessage::model(greeting)],
            hidden_prefix: 1,
        }
    }

    pub fn add_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Extend the trailing model turn, starting one if the last turn is the user's.
    pub fn append_model_text(&mut self, fragment: &str) {
        match self.messages.last_mut() {
            Some(last) if last.role == MessageRole::Model => last.text.push_str(fragment),
            _ => self.messages.push(ChatMessage::model(fragment)),
        }
    }

    /// Remove the trailing turn if it is an unanswered user turn.
    pub fn drop_unanswered_user_turn(&mut self) -> Option<ChatMessage> {
        if self.messages.len() > self.hidden_prefix
            && self.messages.last().map(|m| m.role) == Some(MessageRole::User)
        {
            return self.messages.pop();
        }
        None
    }

    /// Every turn, including the hidden instruction, in send order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Turns the user sees.
    pub fn visible(&self) -> &[ChatMessage] {
        &self.messages[self.hidden_prefix.min(self.messages.len())..]
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_history_hides_instruction() {
        let history = ConversationHistory::seeded("instructions".into(), "Hello!".into());
        assert_eq!(history.message_count(), 2);
        assert_eq!(history.visible(), &[ChatMessage::model("Hello!")]);
    }

    #[test]
    fn test_append_model_text_grows_last_turn() {
        let mut history = ConversationHistory::seeded("i".into(), "g".into());
        history.add_message(ChatMessage::user("How much on food?"));
        history.append_model_text("You spent ");
        history.append_model_text("$42.");

        let last = history.messages().last().unwrap();
        assert_eq!(last, &ChatMessage::model("You spent $42."));
        assert_eq!(history.message_count(), 4);
    }

    #[test]
    fn test_drop_unanswered_user_turn() {
        let mut history = ConversationHistory::seeded("i".into(), "g".into());
        assert!(history.drop_unanswered_user_turn().is_none());
        history.add_message(ChatMessage::user("hi"));
        assert_eq!(history.drop_unanswered_user_turn(), Some(ChatMessage::user("hi")));
        assert_eq!(history.message_count(), 2);
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_string(&MessageRole::Model).unwrap(), "\"model\"");
    }
}
