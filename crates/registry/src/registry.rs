use crate::error::{RegistryError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A named automation action: unique name, free-text description, and an
/// optional ordered list of parameter names.
///
/// A descriptor with declared parameters must be supplied argument values
/// before its invocation can be rendered or executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<String>>,
}

impl ActionDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: None,
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: Vec<String>) -> Self {
        self.params = Some(params);
        self
    }

    /// Number of declared parameters.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.as_ref().map_or(0, Vec::len)
    }
}

/// Insertion-ordered collection of [`ActionDescriptor`]s.
///
/// Iteration follows registration order. Keyword matching downstream is
/// first-match-wins over this order, so the ordering is load-bearing, not
/// cosmetic.
#[derive(Debug, Default, Clone)]
pub struct ActionRegistry {
    order: Vec<String>,
    entries: HashMap<String, ActionDescriptor>,
}

impl ActionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from descriptors, preserving their order.
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = ActionDescriptor>,
    ) -> Result<Self> {
        let mut registry = Self::new();
        for descriptor in descriptors {
            registry.register(descriptor)?;
        }
        Ok(registry)
    }

    /// Adds a new action. Names are unique; re-registering an existing name
    /// is rejected rather than overwritten.
    pub fn register(&mut self, descriptor: ActionDescriptor) -> Result<()> {
        if descriptor.name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.entries.contains_key(&descriptor.name) {
            return Err(RegistryError::DuplicateName(descriptor.name.clone()));
        }
        self.order.push(descriptor.name.clone());
        self.entries.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ActionDescriptor> {
        self.entries.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ActionDescriptor> {
        self.order.iter().filter_map(|name| self.entries.get(name))
    }

    /// Action names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
