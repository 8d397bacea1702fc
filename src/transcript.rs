use serde::{Deserialize, Serialize};

use crate::message::Message;

/// Append-only record of a single conversation.
///
/// Messages are never reordered or deleted; one transcript is owned by one
/// agent run at a time.
#[derive(Default, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn with_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Message> + '_ {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The transcript is in a state where the model may be consulted: the
    /// latest message is either the user's request or a tool result.
    pub fn awaiting_model(&self) -> bool {
        self.messages
            .last()
            .is_some_and(|m| m.is_user() || m.is_tool_result())
    }

    /// The original user request, if one has been seeded.
    pub fn user_request(&self) -> Option<&str> {
        self.messages.iter().find_map(|m| match m {
            Message::User { content } => Some(content.as_str()),
            _ => None,
        })
    }

    /// The closing assistant answer, if the conversation reached one.
    pub fn final_answer(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match m {
            Message::Assistant {
                content: Some(content),
                tool_calls,
            } if tool_calls.is_empty() => Some(content.as_str()),
            _ => None,
        })
    }
}
