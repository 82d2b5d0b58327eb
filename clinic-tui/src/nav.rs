//! Navigation and view switching utilities.
//!
//! Views are the configured entities, in registry order.

use clinic_core::SchemaRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nav {
    entities: Vec<String>,
    active: usize,
}

impl Nav {
    /// `None` when there is nothing to navigate.
    pub fn new(entities: Vec<String>) -> Option<Self> {
        if entities.is_empty() {
            return None;
        }
        Some(Self {
            entities,
            active: 0,
        })
    }

    pub fn from_registry(registry: &SchemaRegistry) -> Option<Self> {
        Self::new(registry.names().map(str::to_string).collect())
    }

    pub fn all(&self) -> &[String] {
        &self.entities
    }

    pub fn index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> &str {
        &self.entities[self.active]
    }

    /// Tab title, e.g. `Owners`.
    pub fn title(&self, index: usize) -> Option<String> {
        self.entities.get(index).map(|name| format!("{}s", name))
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.entities
            .iter()
            .position(|e| e.eq_ignore_ascii_case(name))
    }

    pub fn set_active(&mut self, index: usize) -> bool {
        if index < self.entities.len() {
            self.active = index;
            true
        } else {
            false
        }
    }

    pub fn next_index(&self) -> usize {
        (self.active + 1) % self.entities.len()
    }

    pub fn previous_index(&self) -> usize {
        if self.active == 0 {
            self.entities.len() - 1
        } else {
            self.active - 1
        }
    }
}
