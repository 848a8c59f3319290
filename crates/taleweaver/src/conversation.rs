use crate::models::message::{Message, Role};

/// The append-only transcript of a session.
///
/// Entries are never edited or removed and nothing here caps the length; a
/// long session grows without bound unless the owner decides otherwise.
/// One conversation expects a single writer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a transcript that was held by a client
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// An owned copy of the transcript, unaffected by later appends
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
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

    pub fn last_role(&self) -> Option<Role> {
        self.messages.last().map(|message| message.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let mut conversation = Conversation::new();
        conversation.append(Message::user("open the door"));
        conversation.append(Message::assistant("It is locked."));

        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.messages()[0], Message::user("open the door"));
        assert_eq!(conversation.last_role(), Some(Role::Assistant));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut conversation = Conversation::new();
        conversation.append(Message::user("hello"));

        let snapshot = conversation.snapshot();
        conversation.append(Message::assistant("hi"));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(conversation.len(), 2);
    }
}
