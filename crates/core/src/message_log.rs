//! Append-only session message history.
//! Consecutive identical messages collapse into one entry with a repeat count.

use serde::{Deserialize, Serialize};

use crate::types::Rgb;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub color: Rgb,
    pub count: u32,
}

impl Message {
    /// Text with a `(xN)` suffix once the message has stacked.
    pub fn full_text(&self) -> String {
        if self.count > 1 { format!("{} (x{})", self.text, self.count) } else { self.text.clone() }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn add(&mut self, text: impl Into<String>, color: Rgb) {
        let text = text.into();
        if let Some(last) = self.messages.last_mut()
            && last.text == text
        {
            last.count += 1;
            return;
        }
        self.messages.push(Message { text, color, count: 1 });
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

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The newest `count` entries, oldest first.
    pub fn recent(&self, count: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(count);
        &self.messages[start..]
    }
}
