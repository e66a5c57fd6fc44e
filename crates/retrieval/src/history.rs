/// A single resolved prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversationEntry {
    pub prompt: String,
}

impl ConversationEntry {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

/// Ordered record of prompts already resolved in this conversation.
///
/// Only the most recent entry feeds context carry-over, but the full list
/// is kept so callers can render or bound it as they see fit.
#[derive(Clone, Debug, Default)]
pub struct ConversationHistory {
    entries: Vec<ConversationEntry>,
}

impl ConversationHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, prompt: impl Into<String>) {
        self.entries.push(ConversationEntry::new(prompt));
    }

    #[must_use]
    pub fn last(&self) -> Option<&ConversationEntry> {
        self.entries.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConversationEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn history_tracks_most_recent_prompt() {
        let mut history = ConversationHistory::new();
        assert!(history.is_empty());
        assert_eq!(history.last(), None);

        history.push("Check CPU usage");
        history.push("Show it again");

        assert_eq!(history.len(), 2);
        assert_eq!(history.last().unwrap().prompt, "Show it again");
    }
}
