//! Navigation engine.
//!
//! The [`Router`] owns the ordered scope sequence and drives one dispatch
//! pass per fragment-change signal: strip the query suffix, walk the scopes
//! parent-first, resolve each scope's residual path, canonicalize redirects
//! with a non-navigating rewrite, and flush content for every scope whose
//! matched path actually changed.
//!
//! The engine is single-threaded and cooperative. It talks to the address
//! mechanism through an injected [`NavigationContext`], to content
//! containers through an injected [`OutletHost`], and runs deferred flushes
//! on an injected local spawner. Fragment-change signals queue on an
//! unbounded channel; [`Router::pump`] drains them synchronously and
//! [`Router::run`] awaits them.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use futures::StreamExt;
use futures::channel::mpsc::{self, UnboundedReceiver};
use futures::task::LocalSpawn;
use serde_json::json;

use crate::error::{Result, RouterError};
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::metrics::{MetricSnapshot, RouterMetrics};
use crate::nav::{self, NavigationContext};
use crate::outlet::{OutletHost, flush_to_outlet};
use crate::query::QueryParams;
use crate::scope::{RoutingScope, ScopeDefinition, ScopeHandle, ScopeId, SharedScopes};

const LOG_TARGET: &str = "signpost::engine";

/// Configuration knobs for the engine.
#[derive(Clone)]
pub struct RouterConfig {
    /// Optional structured logger used by the engine.
    pub logger: Option<Logger>,
    /// Metrics accumulator; snapshots are emitted on demand via
    /// [`Router::log_metrics`].
    pub metrics: Option<Rc<RefCell<RouterMetrics>>>,
    /// Target field used when emitting metrics snapshots.
    pub metrics_target: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            logger: None,
            metrics: None,
            metrics_target: "signpost::engine.metrics".to_string(),
        }
    }
}

impl RouterConfig {
    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Rc::new(RefCell::new(RouterMetrics::new())));
        }
    }

    /// Access the shared metrics handle if metrics are enabled.
    pub fn metrics_handle(&self) -> Option<Rc<RefCell<RouterMetrics>>> {
        self.metrics.as_ref().map(Rc::clone)
    }
}

/// Callback invoked with `(old_full_path, new_full_path)` whenever a
/// scope's matched path changes.
pub type PathChangeCallback = Rc<dyn Fn(Option<&str>, &str)>;

/// Opaque removal token for a registered path-change subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathChangeToken(u64);

pub struct Router {
    nav: Rc<dyn NavigationContext>,
    host: Rc<dyn OutletHost>,
    spawner: Rc<dyn LocalSpawn>,
    scopes: SharedScopes,
    subscribers: Vec<(PathChangeToken, PathChangeCallback)>,
    current_full_path: Option<String>,
    signals: UnboundedReceiver<()>,
    next_scope_id: u64,
    next_token: u64,
    config: RouterConfig,
    started: Instant,
}

impl Router {
    pub fn new(
        nav: Rc<dyn NavigationContext>,
        host: Rc<dyn OutletHost>,
        spawner: Rc<dyn LocalSpawn>,
    ) -> Self {
        Self::with_config(nav, host, spawner, RouterConfig::default())
    }

    pub fn with_config(
        nav: Rc<dyn NavigationContext>,
        host: Rc<dyn OutletHost>,
        spawner: Rc<dyn LocalSpawn>,
        config: RouterConfig,
    ) -> Self {
        let (sender, signals) = mpsc::unbounded();
        nav.set_change_listener(Rc::new(move || {
            let _ = sender.unbounded_send(());
        }));

        Self {
            nav,
            host,
            spawner,
            scopes: Rc::new(RefCell::new(Vec::new())),
            subscribers: Vec::new(),
            current_full_path: None,
            signals,
            next_scope_id: 0,
            next_token: 0,
            config,
            started: Instant::now(),
        }
    }

    /// Appends a scope to the evaluation sequence and forces a full
    /// evaluation pass so the new scope renders immediately.
    ///
    /// Scopes are evaluated in configuration order; configure parents before
    /// their children.
    pub fn configure(&mut self, definition: ScopeDefinition) -> Result<ScopeHandle> {
        let id = ScopeId(self.next_scope_id);
        self.next_scope_id += 1;

        let outlet = definition.outlet.clone();
        self.scopes
            .borrow_mut()
            .push(RoutingScope::new(id, definition));
        self.log_event(
            LogLevel::Info,
            "scope_configured",
            [
                json_kv("scope", json!(id.to_string())),
                json_kv("outlet", json!(outlet)),
            ],
        );

        // A failed evaluation must not leave the dead scope in the
        // sequence: the caller gets no handle to close it with, and every
        // later pass would trip over it.
        if let Err(err) = self.dispatch() {
            self.scopes.borrow_mut().retain(|scope| scope.id != id);
            return Err(err);
        }
        Ok(ScopeHandle::new(
            id,
            Rc::clone(&self.scopes),
            self.config.logger.clone(),
        ))
    }

    /// One evaluation pass over every scope against the live fragment.
    ///
    /// Runs synchronously to completion; only deferred outlet flushes
    /// outlive the pass, as detached tasks on the spawner.
    pub fn dispatch(&mut self) -> Result<()> {
        let fragment = self.nav.fragment();
        let full_path = nav::path_portion(&fragment).to_string();
        let ids: Vec<ScopeId> = self.scopes.borrow().iter().map(RoutingScope::id).collect();

        let mut consumed = String::new();
        let mut evaluated = 0usize;

        for id in ids {
            // Subscribers may close handles reentrantly; a scope can be gone
            // by the time its turn comes.
            let prepared = {
                let scopes = self.scopes.borrow();
                scopes.iter().find(|scope| scope.id == id).map(|scope| {
                    (
                        format!("{consumed}{}", scope.parent_prefix),
                        scope.outlet.clone(),
                        Rc::clone(&scope.not_found),
                        scope.strategy.clone(),
                        scope.current_path.clone(),
                    )
                })
            };
            let Some((expected, outlet, not_found, strategy, previous)) = prepared else {
                continue;
            };

            if !full_path.starts_with(expected.as_str()) {
                // The scope and everything nested below it are inconsistent
                // with this fragment; skip them for the pass.
                self.log_event(
                    LogLevel::Debug,
                    "scope_skipped",
                    [
                        json_kv("scope", json!(id.to_string())),
                        json_kv("expected_prefix", json!(expected)),
                        json_kv("full_path", json!(full_path)),
                    ],
                );
                break;
            }

            let local = &full_path[expected.len()..];
            let matched = strategy.longest_match(local)?;
            evaluated += 1;

            if matched.redirected {
                self.record_redirect_metric();
                if !matched.path.is_empty() {
                    self.canonicalize_fragment(&expected, &matched.path);
                }
            }

            if previous.as_deref() != Some(matched.path.as_str()) {
                self.commit_and_notify(id, &matched.path);
                let provider = match matched.destination {
                    Some(destination) => destination,
                    None => not_found,
                };
                flush_to_outlet(
                    &self.host,
                    &self.spawner,
                    &outlet,
                    provider(),
                    self.config.logger.as_ref(),
                )?;
                self.record_flush_metric();
            }

            consumed = format!("{expected}{}", matched.path);
        }

        self.record_dispatch_metric(evaluated);
        self.log_event(
            LogLevel::Debug,
            "dispatch_completed",
            [
                json_kv("full_path", json!(full_path)),
                json_kv("scopes_evaluated", json!(evaluated)),
            ],
        );
        Ok(())
    }

    /// Drains queued fragment-change signals, one dispatch per signal.
    /// Returns how many dispatches ran.
    pub fn pump(&mut self) -> Result<usize> {
        let mut drained = 0;
        while let Ok(Some(())) = self.signals.try_next() {
            self.dispatch()?;
            drained += 1;
        }
        Ok(drained)
    }

    /// Awaits fragment-change signals until the navigation context drops its
    /// sender side.
    pub async fn run(&mut self) -> Result<()> {
        while let Some(()) = self.signals.next().await {
            self.dispatch()?;
        }
        Ok(())
    }

    /// Navigating fragment assignment.
    ///
    /// `#`-prefixed input is used as-is, `/`-prefixed input gets the `#`
    /// restored, anything else is treated as relative to the root.
    pub fn go_to(&mut self, path: &str) {
        let normalized = if path.starts_with('#') {
            path.to_string()
        } else if path.starts_with('/') {
            format!("#{path}")
        } else {
            format!("#/{path}")
        };
        self.nav.assign_fragment(&normalized);
    }

    /// Clears every scope's recorded path and forces re-evaluation without
    /// changing the fragment.
    pub fn reload(&mut self) -> Result<()> {
        for scope in self.scopes.borrow_mut().iter_mut() {
            scope.current_path = None;
        }
        self.log_event(
            LogLevel::Info,
            "reload_forced",
            [json_kv("scope", json!("all"))],
        );
        self.dispatch()
    }

    /// [`Router::reload`] for a single scope. Fails with `ScopeNotFound`
    /// when the handle was already closed.
    pub fn reload_scope(&mut self, handle: &ScopeHandle) -> Result<()> {
        {
            let mut scopes = self.scopes.borrow_mut();
            let scope = scopes
                .iter_mut()
                .find(|scope| scope.id == handle.id())
                .ok_or(RouterError::ScopeNotFound(handle.id()))?;
            scope.current_path = None;
        }
        self.log_event(
            LogLevel::Info,
            "reload_forced",
            [json_kv("scope", json!(handle.id().to_string()))],
        );
        self.dispatch()
    }

    /// Prefix membership test against the raw live fragment, query included.
    /// A leading `#` on the candidate is ignored.
    pub fn is_current_full_path(&self, candidate: &str) -> bool {
        let candidate = candidate.strip_prefix('#').unwrap_or(candidate);
        self.nav.fragment().starts_with(candidate)
    }

    /// The last full matched path committed by a dispatch pass.
    pub fn current_full_path(&self) -> Option<String> {
        self.current_full_path.clone()
    }

    /// Key/value view over the live fragment's query suffix.
    pub fn query_params(&self) -> QueryParams {
        QueryParams::parse(nav::query_portion(&self.nav.fragment()))
    }

    /// Merges `changes` into the live query view and writes it back,
    /// preserving the path portion. `Some(value)` sets a key, `None` deletes
    /// it. With `suppress_reevaluation` the write is a non-navigating
    /// rewrite (no signal, no history entry); otherwise it is a normal
    /// assignment and queues a dispatch.
    pub fn set_query_params<'a, I>(&mut self, changes: I, suppress_reevaluation: bool)
    where
        I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
    {
        let fragment = self.nav.fragment();
        let mut params = QueryParams::parse(nav::query_portion(&fragment));
        for (key, value) in changes {
            match value {
                Some(value) => params.set(key, value),
                None => params.remove(key),
            }
        }

        let rewritten = format!("{}{}", nav::path_portion(&fragment), params.to_suffix());
        if suppress_reevaluation {
            self.nav.rewrite_fragment(&rewritten);
        } else {
            self.nav.assign_fragment(&rewritten);
        }
    }

    /// Registers a path-change subscriber, invoked synchronously once per
    /// scope whose matched path changed, strictly before that scope's flush.
    pub fn add_on_path_change(
        &mut self,
        callback: impl Fn(Option<&str>, &str) + 'static,
    ) -> PathChangeToken {
        let token = PathChangeToken(self.next_token);
        self.next_token += 1;
        self.subscribers.push((token, Rc::new(callback)));
        token
    }

    /// Unregisters a subscriber. Unknown tokens are ignored.
    pub fn remove_on_path_change(&mut self, token: PathChangeToken) {
        if let Some(position) = self
            .subscribers
            .iter()
            .position(|(registered, _)| *registered == token)
        {
            self.subscribers.swap_remove(position);
        }
    }

    pub fn metrics_snapshot(&self) -> Option<MetricSnapshot> {
        self.config
            .metrics
            .as_ref()
            .map(|metrics| metrics.borrow().snapshot(self.started.elapsed()))
    }

    /// Emits a metrics snapshot through the configured logger, if both are
    /// present.
    pub fn log_metrics(&self) {
        if let (Some(logger), Some(snapshot)) =
            (self.config.logger.as_ref(), self.metrics_snapshot())
        {
            let _ = logger.log_event(snapshot.to_log_event(&self.config.metrics_target));
        }
    }

    /// Rewrites the fragment to the redirect's resolved path, keeping the
    /// ancestor prefix and any query suffix. Non-navigating: no history
    /// entry, no change signal.
    fn canonicalize_fragment(&mut self, expected: &str, target_path: &str) {
        let live = self.nav.fragment();
        let query = nav::query_portion(&live);
        let target = format!("{expected}{target_path}{query}");
        if live != target {
            self.nav.rewrite_fragment(&target);
            self.log_event(
                LogLevel::Info,
                "fragment_rewritten",
                [json_kv("from", json!(live)), json_kv("to", json!(target))],
            );
        }
    }

    /// Commits a scope's new path, snapshots the full matched path from the
    /// live (possibly just rewritten) fragment and notifies subscribers.
    fn commit_and_notify(&mut self, id: ScopeId, path: &str) {
        {
            let mut scopes = self.scopes.borrow_mut();
            if let Some(scope) = scopes.iter_mut().find(|scope| scope.id == id) {
                scope.current_path = Some(path.to_string());
            }
        }

        let new_full = nav::path_portion(&self.nav.fragment()).to_string();
        let old_full = self.current_full_path.replace(new_full.clone());

        // Snapshot the callbacks so subscribers observe a stable list even
        // if the registry changes between passes.
        let callbacks: Vec<PathChangeCallback> = self
            .subscribers
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        for callback in &callbacks {
            callback(old_full.as_deref(), &new_full);
        }
        self.record_notifications_metric(callbacks.len());
    }

    fn log_event<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.config.logger.as_ref() {
            let event = event_with_fields(level, LOG_TARGET, message, fields);
            let _ = logger.log_event(event);
        }
    }

    fn record_dispatch_metric(&self, evaluated: usize) {
        if let Some(metrics) = self.config.metrics.as_ref() {
            metrics.borrow_mut().record_dispatch(evaluated);
        }
    }

    fn record_flush_metric(&self) {
        if let Some(metrics) = self.config.metrics.as_ref() {
            metrics.borrow_mut().record_flush();
        }
    }

    fn record_redirect_metric(&self) {
        if let Some(metrics) = self.config.metrics.as_ref() {
            metrics.borrow_mut().record_redirect();
        }
    }

    fn record_notifications_metric(&self, count: usize) {
        if let Some(metrics) = self.config.metrics.as_ref() {
            metrics.borrow_mut().record_notifications(count);
        }
    }
}
