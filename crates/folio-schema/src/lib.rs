pub mod profile;

pub use profile::*;

use serde::{Deserialize, Serialize};

/// One entry of a chat transcript. Never mutated after it is appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationMessage {
    pub id: u64,
    pub text: String,
    pub from_assistant: bool,
}

impl ConversationMessage {
    pub fn visitor(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            from_assistant: false,
        }
    }

    pub fn assistant(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            from_assistant: true,
        }
    }
}

/// Where an assistant answer came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    Generated,
    Fallback,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors_set_author() {
        let visitor = ConversationMessage::visitor(2, "hi");
        let assistant = ConversationMessage::assistant(3, "hello");
        assert!(!visitor.from_assistant);
        assert!(assistant.from_assistant);
        assert_eq!(visitor.id + 1, assistant.id);
    }

    #[test]
    fn message_serializes_snake_case() {
        let json = serde_json::to_value(ConversationMessage::assistant(1, "hey")).unwrap();
        assert_eq!(json["from_assistant"], true);
        assert_eq!(json["text"], "hey");
    }

    #[test]
    fn answer_source_serializes_lowercase() {
        let json = serde_json::to_string(&AnswerSource::Fallback).unwrap();
        assert_eq!(json, "\"fallback\"");
    }
}
