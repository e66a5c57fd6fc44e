use crate::engine::{augment_with_context, has_context_marker, keyword_match};
use crate::error::Result;
use crate::history::ConversationHistory;
use deskpilot_registry::{ActionDescriptor, ActionRegistry};
use deskpilot_vector_index::{ActionIndex, Encoder};
use std::sync::Arc;

/// Registry and embedding index behind one seam.
///
/// Every mutation that changes the catalog rebuilds the index in the same
/// call, so the two can never drift apart between operations. The
/// generation counter ticks on each rebuild; observers can use it to tell
/// whether the catalog changed under them.
pub struct RetrievalService {
    registry: ActionRegistry,
    index: ActionIndex,
    generation: u64,
}

impl RetrievalService {
    /// Builds the service and indexes the given catalog.
    pub fn new(registry: ActionRegistry, encoder: Arc<dyn Encoder>) -> Result<Self> {
        let mut index = ActionIndex::new(encoder);
        index.rebuild(&index_pairs(&registry))?;
        Ok(Self {
            registry,
            index,
            generation: 1,
        })
    }

    /// Adds an action and re-indexes. A duplicate or empty name, or an
    /// encoder failure during the rebuild, leaves the service unchanged.
    pub fn register(&mut self, descriptor: ActionDescriptor) -> Result<()> {
        let mut next = self.registry.clone();
        next.register(descriptor)?;
        self.index.rebuild(&index_pairs(&next))?;
        self.registry = next;
        self.generation += 1;
        Ok(())
    }

    /// Resolves a prompt to a registered action name.
    ///
    /// Resolution is staged: the first prompt of a conversation goes
    /// straight to embedding search; later prompts try a literal keyword
    /// hit on the action names first, then embedding. Prompts that lean on
    /// the previous one ("it", "again") are retried with that prompt
    /// appended, and the retry's keyword hit or embedding result replaces
    /// the provisional answer.
    ///
    /// Never fails: encoder trouble is logged and reads as no match.
    pub fn resolve(&self, query: &str, history: &ConversationHistory) -> Option<String> {
        if self.registry.is_empty() {
            log::debug!("No actions registered, nothing to resolve");
            return None;
        }

        let Some(last_entry) = history.last() else {
            log::debug!("First prompt of the conversation, resolving by embedding alone");
            return self.search_or_none(query);
        };

        if let Some(name) = keyword_match(query, self.registry.names()) {
            log::debug!("Prompt matched '{name}' by keyword");
            return Some(name.to_string());
        }

        log::debug!("No keyword hit, trying embedding search");
        let provisional = self.search_or_none(query);

        if !has_context_marker(query) {
            return provisional;
        }

        let augmented = augment_with_context(query, &last_entry.prompt);
        log::debug!("Anaphoric prompt, retrying as '{augmented}'");

        if let Some(name) = keyword_match(&augmented, self.registry.names()) {
            log::debug!("Augmented prompt matched '{name}' by keyword");
            return Some(name.to_string());
        }

        self.search_or_none(&augmented)
    }

    fn search_or_none(&self, query: &str) -> Option<String> {
        match self.index.search(query) {
            Ok(hit) => hit,
            Err(e) => {
                log::warn!("Embedding search failed: {e}");
                None
            }
        }
    }

    #[must_use]
    pub fn descriptor(&self, name: &str) -> Option<&ActionDescriptor> {
        self.registry.get(name)
    }

    /// Descriptors in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ActionDescriptor> {
        self.registry.iter()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Number of index rebuilds since construction started. Increments on
    /// the initial build and on every successful registration.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

fn index_pairs(registry: &ActionRegistry) -> Vec<(String, String)> {
    registry
        .iter()
        .map(|descriptor| (descriptor.name.clone(), descriptor.description.clone()))
        .collect()
}
