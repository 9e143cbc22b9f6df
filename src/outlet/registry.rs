use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use blake3::Hash;

use crate::error::{Result, RouterError};

use super::{OutletContent, OutletHost, OutletId};

#[derive(Debug, Clone)]
struct OutletState {
    content: OutletContent,
    hash: Option<Hash>,
    is_dirty: bool,
}

impl OutletState {
    fn new() -> Self {
        Self {
            content: OutletContent::new(),
            hash: None,
            is_dirty: true,
        }
    }

    fn update_content(&mut self, content: OutletContent) {
        let new_hash = blake3::hash(content.as_bytes());
        if self.hash.map(|h| h != new_hash).unwrap_or(true) {
            self.content = content;
            self.hash = Some(new_hash);
            self.is_dirty = true;
        }
    }
}

/// In-memory [`OutletHost`] tracking which outlets changed since the last
/// drain.
///
/// Replacement is always accepted; the dirty set is a render hint for the
/// embedder, marked only when the stored bytes actually changed. Interior
/// mutability keeps the registry shareable as an `Rc<dyn OutletHost>` in the
/// crate's single-threaded model.
#[derive(Debug, Default)]
pub struct OutletRegistry {
    entries: RefCell<HashMap<OutletId, OutletState>>,
    dirty: RefCell<HashSet<OutletId>>,
}

impl OutletRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a container. Fresh containers start dirty so the embedder
    /// paints them at least once.
    pub fn register(&self, outlet: impl Into<OutletId>) {
        let outlet = outlet.into();
        self.entries
            .borrow_mut()
            .insert(outlet.clone(), OutletState::new());
        self.dirty.borrow_mut().insert(outlet);
    }

    pub fn remove(&self, outlet: &OutletId) {
        self.entries.borrow_mut().remove(outlet);
        self.dirty.borrow_mut().remove(outlet);
    }

    pub fn contains(&self, outlet: &OutletId) -> bool {
        self.entries.borrow().contains_key(outlet)
    }

    pub fn content_of(&self, outlet: &OutletId) -> Option<OutletContent> {
        self.entries
            .borrow()
            .get(outlet)
            .map(|state| state.content.clone())
    }

    /// Drains the outlets whose content changed, with their current payload.
    pub fn take_dirty(&self) -> Vec<(OutletId, OutletContent)> {
        let ids: Vec<_> = self.dirty.borrow_mut().drain().collect();
        let mut entries = self.entries.borrow_mut();
        ids.into_iter()
            .filter_map(|id| {
                entries.get_mut(&id).map(|state| {
                    state.is_dirty = false;
                    (id.clone(), state.content.clone())
                })
            })
            .collect()
    }

    pub fn has_dirty(&self) -> bool {
        !self.dirty.borrow().is_empty()
    }
}

impl OutletHost for OutletRegistry {
    fn ensure(&self, outlet: &OutletId) -> Result<()> {
        if self.contains(outlet) {
            Ok(())
        } else {
            Err(RouterError::OutletNotFound(outlet.clone()))
        }
    }

    fn replace(&self, outlet: &OutletId, content: OutletContent) -> Result<()> {
        let mut entries = self.entries.borrow_mut();
        let state = entries
            .get_mut(outlet)
            .ok_or_else(|| RouterError::OutletNotFound(outlet.clone()))?;
        state.update_content(content);
        if state.is_dirty {
            self.dirty.borrow_mut().insert(outlet.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_flags_the_outlet_dirty_once() {
        let registry = OutletRegistry::new();
        registry.register("main");

        let dirty = registry.take_dirty();
        assert_eq!(dirty.len(), 1);
        assert_eq!(dirty[0].0, "main");
        assert!(!registry.has_dirty());
    }

    #[test]
    fn replace_detects_changes() {
        let registry = OutletRegistry::new();
        registry.register("main");
        registry.take_dirty();

        registry
            .replace(&"main".to_string(), "hello".to_string())
            .unwrap();
        let dirty = registry.take_dirty();
        assert_eq!(dirty.len(), 1);
        assert_eq!(dirty[0].1, "hello");

        registry
            .replace(&"main".to_string(), "hello".to_string())
            .unwrap();
        assert!(registry.take_dirty().is_empty());
    }

    #[test]
    fn replace_on_a_missing_outlet_is_a_boundary_error() {
        let registry = OutletRegistry::new();
        let err = registry
            .replace(&"ghost".to_string(), "x".to_string())
            .unwrap_err();
        assert!(matches!(err, RouterError::OutletNotFound(id) if id == "ghost"));
        assert!(registry.ensure(&"ghost".to_string()).is_err());
    }

    #[test]
    fn remove_clears_both_entry_and_dirt() {
        let registry = OutletRegistry::new();
        registry.register("main");
        registry.remove(&"main".to_string());
        assert!(!registry.contains(&"main".to_string()));
        assert!(registry.take_dirty().is_empty());
    }
}
