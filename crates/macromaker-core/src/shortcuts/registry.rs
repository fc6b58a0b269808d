use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::shortcuts::ShortcutBinding;

/// Name -> binding map that remembers first-insertion order.
///
/// `order` always holds exactly the keys of `bindings`, once each. Overwriting
/// an existing name keeps its position; only new names are appended.
#[derive(Debug, Clone, Default)]
pub struct ShortcutRegistry {
    bindings: HashMap<String, ShortcutBinding>,
    order: Vec<String>,
}

impl ShortcutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ShortcutBinding> {
        self.bindings.get(name)
    }

    pub fn get_by_index(&self, index: usize) -> Result<&ShortcutBinding> {
        let name = self.order.get(index).ok_or(Error::OutOfRange {
            index,
            len: self.order.len(),
        })?;
        self.bindings
            .get(name)
            .ok_or_else(|| Error::invalid_state(format!("registry order lists unbound '{}'", name)))
    }

    pub fn put(&mut self, name: impl Into<String>, binding: ShortcutBinding) {
        let name = name.into();
        if self.bindings.insert(name.clone(), binding).is_none() {
            self.order.push(name);
        }
    }

    /// Removing an unknown name is a no-op.
    pub fn remove(&mut self, name: &str) {
        if self.bindings.remove(name).is_some() {
            self.order.retain(|n| n != name);
        }
    }

    /// Replace the binding for an already registered name.
    pub fn rebind(&mut self, name: &str, spec: &str) -> Result<()> {
        let current = self.get(name).ok_or_else(|| Error::not_found(name))?;
        let rebound = current.rebound_to(spec)?;
        tracing::info!(name, from = %current, to = %rebound, "shortcut rebound");
        self.put(name, rebound);
        Ok(())
    }

    pub fn size(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.order.iter().position(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Entries in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ShortcutBinding)> {
        self.order
            .iter()
            .filter_map(|name| self.bindings.get(name).map(|b| (name.as_str(), b)))
    }
}
