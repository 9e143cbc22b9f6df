//! Navigation context boundary.
//!
//! The engine never touches a global address bar. It talks to a
//! [`NavigationContext`] injected at construction, which keeps dispatch
//! deterministic under test and lets embedders bridge to whatever address
//! mechanism they actually have. [`InMemoryNavigation`] is the crate's own
//! implementation for tests, demos and headless embedding.

use std::cell::RefCell;
use std::rc::Rc;

/// Everything the engine needs from the embedding address mechanism.
///
/// Fragments are stored without their `#`; that character is address-bar
/// syntax and is stripped at this edge.
pub trait NavigationContext {
    /// The current fragment, empty when unset.
    fn fragment(&self) -> String;

    /// Navigating assignment: stores the fragment, appends a history entry
    /// and fires the change listener. Assigning the value already live is a
    /// no-op, mirroring address-bar behaviour.
    fn assign_fragment(&self, fragment: &str);

    /// Non-navigating rewrite: stores the fragment and replaces the current
    /// history entry. Fires nothing; used for redirect canonicalization and
    /// suppressed query updates.
    fn rewrite_fragment(&self, fragment: &str);

    /// Installs the single change listener slot. The engine owns this slot;
    /// a later call replaces the earlier listener.
    fn set_change_listener(&self, listener: Rc<dyn Fn()>);
}

/// Portion of a fragment before its `?`, i.e. the routable path.
pub fn path_portion(fragment: &str) -> &str {
    match fragment.find('?') {
        Some(index) => &fragment[..index],
        None => fragment,
    }
}

/// Query suffix of a fragment including the `?`, or empty when absent.
pub fn query_portion(fragment: &str) -> &str {
    match fragment.find('?') {
        Some(index) => &fragment[index..],
        None => "",
    }
}

/// In-memory [`NavigationContext`] with an observable history, so tests can
/// assert that redirects and suppressed updates create no extra entries.
#[derive(Default)]
pub struct InMemoryNavigation {
    fragment: RefCell<String>,
    entries: RefCell<Vec<String>>,
    listener: RefCell<Option<Rc<dyn Fn()>>>,
}

impl InMemoryNavigation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with an initial fragment already assigned, without firing the
    /// (not yet installed) listener.
    pub fn with_fragment(fragment: &str) -> Self {
        let nav = Self::new();
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        *nav.fragment.borrow_mut() = fragment.to_string();
        nav.entries.borrow_mut().push(fragment.to_string());
        nav
    }

    /// History entries in assignment order, rewrites collapsed into their
    /// entry.
    pub fn history(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    fn notify(&self) {
        // Clone the listener out before invoking so reentrant fragment
        // operations from inside it do not hit a live borrow.
        let listener = self.listener.borrow().clone();
        if let Some(listener) = listener {
            listener();
        }
    }
}

impl NavigationContext for InMemoryNavigation {
    fn fragment(&self) -> String {
        self.fragment.borrow().clone()
    }

    fn assign_fragment(&self, fragment: &str) {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        if *self.fragment.borrow() == fragment {
            return;
        }
        *self.fragment.borrow_mut() = fragment.to_string();
        self.entries.borrow_mut().push(fragment.to_string());
        self.notify();
    }

    fn rewrite_fragment(&self, fragment: &str) {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        *self.fragment.borrow_mut() = fragment.to_string();
        let mut entries = self.entries.borrow_mut();
        match entries.last_mut() {
            Some(last) => *last = fragment.to_string(),
            None => entries.push(fragment.to_string()),
        }
    }

    fn set_change_listener(&self, listener: Rc<dyn Fn()>) {
        *self.listener.borrow_mut() = Some(listener);
    }
}
