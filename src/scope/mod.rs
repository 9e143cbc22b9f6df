//! Routing scopes: one level of the nested navigation tree.
//!
//! A scope owns an outlet, a not-found provider and a resolution strategy.
//! Live scopes are stored in a shared, ordered list evaluated parent-first
//! by the engine; a [`ScopeHandle`] detaches its scope from that list.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::outlet::OutletId;
use crate::route::{ContentProvider, Match, RouteTable};

/// Identity of a live scope within the engine's evaluation sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub(crate) u64);

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope-{}", self.0)
    }
}

/// How a scope resolves its residual path.
///
/// `Table` is the general case; `Fixed` always matches the empty path with
/// one destination, covering scopes whose content never depends on the
/// fragment (a shell or chrome region).
#[derive(Clone)]
pub enum RouteStrategy {
    Table(RouteTable),
    Fixed(ContentProvider),
}

impl RouteStrategy {
    pub fn longest_match(&self, candidate: &str) -> Result<Match> {
        match self {
            RouteStrategy::Table(table) => table.longest_match(candidate),
            RouteStrategy::Fixed(destination) => Ok(Match {
                path: String::new(),
                destination: Some(Rc::clone(destination)),
                redirected: false,
            }),
        }
    }
}

impl fmt::Debug for RouteStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteStrategy::Table(table) => f.debug_tuple("Table").field(table).finish(),
            RouteStrategy::Fixed(_) => f.write_str("Fixed(<provider>)"),
        }
    }
}

/// Declarative scope configuration handed to `Router::configure`.
pub struct ScopeDefinition {
    pub outlet: OutletId,
    pub not_found: ContentProvider,
    pub strategy: RouteStrategy,
    pub parent_prefix: String,
}

impl ScopeDefinition {
    /// A table-driven scope.
    pub fn routes(
        outlet: impl Into<OutletId>,
        not_found: ContentProvider,
        table: RouteTable,
    ) -> Self {
        Self {
            outlet: outlet.into(),
            not_found,
            strategy: RouteStrategy::Table(table),
            parent_prefix: String::new(),
        }
    }

    /// A scope with one fixed destination regardless of the fragment.
    pub fn fixed(
        outlet: impl Into<OutletId>,
        not_found: ContentProvider,
        destination: ContentProvider,
    ) -> Self {
        Self {
            outlet: outlet.into(),
            not_found,
            strategy: RouteStrategy::Fixed(destination),
            parent_prefix: String::new(),
        }
    }

    /// Prefix the fragment must carry, beyond what ancestors consumed,
    /// before this scope is evaluated.
    pub fn with_parent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.parent_prefix = prefix.into();
        self
    }
}

/// A configured scope as the engine drives it. `current_path` is owned
/// exclusively by the engine and is the idempotence guard: `None` until the
/// first evaluation, then the last committed match path.
pub struct RoutingScope {
    pub(crate) id: ScopeId,
    pub(crate) outlet: OutletId,
    pub(crate) not_found: ContentProvider,
    pub(crate) strategy: RouteStrategy,
    pub(crate) parent_prefix: String,
    pub(crate) current_path: Option<String>,
}

impl RoutingScope {
    pub(crate) fn new(id: ScopeId, definition: ScopeDefinition) -> Self {
        Self {
            id,
            outlet: definition.outlet,
            not_found: definition.not_found,
            strategy: definition.strategy,
            parent_prefix: definition.parent_prefix,
            current_path: None,
        }
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    pub fn outlet(&self) -> &OutletId {
        &self.outlet
    }

    pub fn current_path(&self) -> Option<&str> {
        self.current_path.as_deref()
    }
}

/// Ordered scope list shared between the engine and the handles it issues.
pub(crate) type SharedScopes = Rc<RefCell<Vec<RoutingScope>>>;

/// Detaches its scope from the engine's evaluation sequence.
///
/// After `close`, fragment changes no longer affect the scope's outlet.
/// Closing twice is a no-op.
pub struct ScopeHandle {
    id: ScopeId,
    scopes: SharedScopes,
    logger: Option<Logger>,
}

impl fmt::Debug for ScopeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeHandle").field("id", &self.id).finish()
    }
}

impl ScopeHandle {
    pub(crate) fn new(id: ScopeId, scopes: SharedScopes, logger: Option<Logger>) -> Self {
        Self { id, scopes, logger }
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    pub fn close(&self) {
        let mut scopes = self.scopes.borrow_mut();
        let before = scopes.len();
        scopes.retain(|scope| scope.id != self.id);
        if scopes.len() != before {
            if let Some(logger) = self.logger.as_ref() {
                let event = event_with_fields(
                    LogLevel::Info,
                    "signpost::engine",
                    "scope_closed",
                    [json_kv("scope", serde_json::json!(self.id.to_string()))],
                );
                let _ = logger.log_event(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::Content;

    fn page(content: &'static str) -> ContentProvider {
        Rc::new(move || Content::ready(content))
    }

    fn realized(matched: Match) -> String {
        match matched.destination.expect("destination")() {
            Content::Ready(content) => content,
            Content::Deferred(_) => panic!("expected ready content"),
        }
    }

    #[test]
    fn fixed_strategy_matches_everything_at_the_empty_path() {
        let strategy = RouteStrategy::Fixed(page("shell"));
        for candidate in ["", "/a", "/a/b/c?ignored"] {
            let matched = strategy.longest_match(candidate).unwrap();
            assert_eq!(matched.path, "");
            assert!(!matched.redirected);
        }
        assert_eq!(realized(strategy.longest_match("/x").unwrap()), "shell");
    }

    #[test]
    fn table_strategy_delegates_to_the_route_table() {
        let table = RouteTable::new().with_content("/a", page("page-a"));
        let strategy = RouteStrategy::Table(table);
        let matched = strategy.longest_match("/a/deeper").unwrap();
        assert_eq!(matched.path, "/a");
        assert_eq!(realized(matched), "page-a");
    }

    #[test]
    fn close_detaches_once_and_stays_idempotent() {
        let scopes: SharedScopes = Rc::new(RefCell::new(Vec::new()));
        let definition = ScopeDefinition::routes("main", page("nf"), RouteTable::new());
        scopes
            .borrow_mut()
            .push(RoutingScope::new(ScopeId(1), definition));

        let handle = ScopeHandle::new(ScopeId(1), Rc::clone(&scopes), None);
        assert_eq!(scopes.borrow().len(), 1);
        handle.close();
        assert!(scopes.borrow().is_empty());
        handle.close();
        assert!(scopes.borrow().is_empty());
    }

    #[test]
    fn handle_debug_output_names_its_scope() {
        let scopes: SharedScopes = Rc::new(RefCell::new(Vec::new()));
        let handle = ScopeHandle::new(ScopeId(7), scopes, None);
        assert_eq!(format!("{handle:?}"), "ScopeHandle { id: ScopeId(7) }");
    }

    #[test]
    fn definition_builder_carries_the_parent_prefix() {
        let definition = ScopeDefinition::routes("main", page("nf"), RouteTable::new())
            .with_parent_prefix("/admin");
        assert_eq!(definition.parent_prefix, "/admin");
        assert_eq!(definition.outlet, "main");
    }
}
