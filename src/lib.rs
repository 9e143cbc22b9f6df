//! Fragment-driven navigation engine for nested single-page content regions.
//!
//! A fragment (the part of the address after `#`) is the sole persisted
//! routing state. The [`Router`] maps it onto an ordered sequence of routing
//! scopes, each owning an exact-string route table, a not-found provider and
//! a named outlet; redirects are followed and canonicalized back onto the
//! fragment with a non-navigating rewrite. Route keys are exact strings:
//! longest-prefix matching comes from truncating the candidate at `/`
//! boundaries, never from patterns or wildcards.
//!
//! The address mechanism and the content containers are injected
//! ([`NavigationContext`], [`OutletHost`]), so the engine runs the same way
//! under a browser bridge, in tests and in headless embeddings.

pub mod engine;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod nav;
pub mod outlet;
pub mod query;
pub mod route;
pub mod scope;

pub use engine::{PathChangeCallback, PathChangeToken, Router, RouterConfig};
pub use error::{Result, RouterError};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink,
};
pub use metrics::{MetricSnapshot, RouterMetrics};
pub use nav::{InMemoryNavigation, NavigationContext};
pub use outlet::{OutletContent, OutletHost, OutletId, OutletRegistry};
pub use query::QueryParams;
pub use route::{Content, ContentProvider, Match, RouteEntry, RouteTable};
pub use scope::{RouteStrategy, RoutingScope, ScopeDefinition, ScopeHandle, ScopeId};
