//! Outlet boundary and flushing.
//!
//! An outlet is a named content region owned by the embedding application.
//! The engine only knows the [`OutletHost`] contract; [`OutletRegistry`] is
//! the crate's in-memory host for tests, demos and headless embedders.

use std::rc::Rc;

use futures::task::{LocalSpawn, LocalSpawnExt};
use serde_json::json;

use crate::error::Result;
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::route::Content;

mod registry;

pub use registry::OutletRegistry;

pub type OutletId = String;

/// Rendered payload stored in an outlet.
pub type OutletContent = String;

/// Contract between the engine and the embedding application's content
/// containers. A missing container is a fatal boundary error, never papered
/// over.
pub trait OutletHost {
    /// Fails with `OutletNotFound` when no container exists for the id.
    fn ensure(&self, outlet: &OutletId) -> Result<()>;

    /// Unconditionally replaces the container's contents. Prior content is
    /// discarded, never diffed or reused.
    fn replace(&self, outlet: &OutletId, content: OutletContent) -> Result<()>;
}

/// Flushes resolved content into an outlet.
///
/// Ready content is replaced synchronously. Deferred content is checked
/// against the host now (a missing container still fails the caller), then
/// awaited on a detached local task; a late replacement failure inside that
/// task has no caller left, so it is logged and dropped.
pub fn flush_to_outlet(
    host: &Rc<dyn OutletHost>,
    spawner: &Rc<dyn LocalSpawn>,
    outlet: &OutletId,
    content: Content,
    logger: Option<&Logger>,
) -> Result<()> {
    match content {
        Content::Ready(value) => host.replace(outlet, value),
        Content::Deferred(pending) => {
            host.ensure(outlet)?;
            let host = Rc::clone(host);
            let outlet = outlet.clone();
            let logger = logger.cloned();
            spawner.spawn_local(async move {
                let value = pending.await;
                if let Err(err) = host.replace(&outlet, value) {
                    if let Some(logger) = logger.as_ref() {
                        let event = event_with_fields(
                            LogLevel::Warn,
                            "signpost::outlet",
                            "flush_failed",
                            [
                                json_kv("outlet", json!(outlet)),
                                json_kv("error", json!(err.to_string())),
                            ],
                        );
                        let _ = logger.log_event(event);
                    }
                }
            })?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RouterError;
    use crate::logging::MemorySink;
    use futures::executor::LocalPool;
    use std::sync::Arc;

    fn hosted(ids: &[&str]) -> Rc<dyn OutletHost> {
        let registry = OutletRegistry::new();
        for id in ids {
            registry.register(*id);
        }
        Rc::new(registry)
    }

    #[test]
    fn ready_content_is_replaced_synchronously() {
        let registry = Rc::new(OutletRegistry::new());
        registry.register("main");
        let host: Rc<dyn OutletHost> = Rc::clone(&registry) as Rc<dyn OutletHost>;
        let pool = LocalPool::new();
        let spawner: Rc<dyn LocalSpawn> = Rc::new(pool.spawner());

        flush_to_outlet(
            &host,
            &spawner,
            &"main".to_string(),
            Content::ready("hello"),
            None,
        )
        .unwrap();
        assert_eq!(registry.content_of(&"main".to_string()).as_deref(), Some("hello"));
    }

    #[test]
    fn missing_outlet_fails_the_caller_for_both_flavours() {
        let host = hosted(&[]);
        let pool = LocalPool::new();
        let spawner: Rc<dyn LocalSpawn> = Rc::new(pool.spawner());

        let err = flush_to_outlet(
            &host,
            &spawner,
            &"ghost".to_string(),
            Content::ready("x"),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, RouterError::OutletNotFound(id) if id == "ghost"));

        let err = flush_to_outlet(
            &host,
            &spawner,
            &"ghost".to_string(),
            Content::deferred(async { "x".to_string() }),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, RouterError::OutletNotFound(id) if id == "ghost"));
    }

    #[test]
    fn deferred_content_lands_once_the_future_settles() {
        let registry = Rc::new(OutletRegistry::new());
        registry.register("main");
        let host: Rc<dyn OutletHost> = Rc::clone(&registry) as Rc<dyn OutletHost>;
        let mut pool = LocalPool::new();
        let spawner: Rc<dyn LocalSpawn> = Rc::new(pool.spawner());

        flush_to_outlet(
            &host,
            &spawner,
            &"main".to_string(),
            Content::deferred(async { "later".to_string() }),
            None,
        )
        .unwrap();
        assert_eq!(registry.content_of(&"main".to_string()).as_deref(), Some(""));

        pool.run_until_stalled();
        assert_eq!(registry.content_of(&"main".to_string()).as_deref(), Some("later"));
    }

    #[test]
    fn late_failure_is_logged_not_raised() {
        let registry = Rc::new(OutletRegistry::new());
        registry.register("main");
        let host: Rc<dyn OutletHost> = Rc::clone(&registry) as Rc<dyn OutletHost>;
        let mut pool = LocalPool::new();
        let spawner: Rc<dyn LocalSpawn> = Rc::new(pool.spawner());
        let sink = Arc::new(MemorySink::new());
        let logger = Logger::from_shared(sink.clone());

        flush_to_outlet(
            &host,
            &spawner,
            &"main".to_string(),
            Content::deferred(async { "late".to_string() }),
            Some(&logger),
        )
        .unwrap();

        // The container disappears while the value is still pending.
        registry.remove(&"main".to_string());
        pool.run_until_stalled();

        assert!(sink.messages().contains(&"flush_failed".to_string()));
        assert!(registry.content_of(&"main".to_string()).is_none());
    }
}
