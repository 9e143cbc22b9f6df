use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};

use crate::error::{Result, RouterError};
use crate::outlet::OutletContent;

/// Content handed to an outlet once a route resolves.
///
/// `Deferred` values settle later; the outlet flusher suspends the replacement
/// until they do.
pub enum Content {
    Ready(OutletContent),
    Deferred(LocalBoxFuture<'static, OutletContent>),
}

impl Content {
    pub fn ready(content: impl Into<OutletContent>) -> Self {
        Content::Ready(content.into())
    }

    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = OutletContent> + 'static,
    {
        Content::Deferred(future.boxed_local())
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Content::Ready(content) => f.debug_tuple("Ready").field(content).finish(),
            Content::Deferred(_) => f.write_str("Deferred(<pending>)"),
        }
    }
}

/// Capability invoked with no arguments each time its route is flushed.
pub type ContentProvider = Rc<dyn Fn() -> Content>;

/// One route table value: content to flush, or a redirect to another key in
/// the same table.
#[derive(Clone)]
pub enum RouteEntry {
    Content(ContentProvider),
    Redirect(String),
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteEntry::Content(_) => f.write_str("Content(<provider>)"),
            RouteEntry::Redirect(target) => f.debug_tuple("Redirect").field(target).finish(),
        }
    }
}

/// Result of resolving a candidate path against a route table.
///
/// `path` is the table key that matched (possibly empty). A missing
/// `destination` means no entry matched at any truncation depth; `redirected`
/// reports whether at least one redirect hop was taken on the way.
#[derive(Clone)]
pub struct Match {
    pub path: String,
    pub destination: Option<ContentProvider>,
    pub redirected: bool,
}

impl Match {
    /// The match signalling "use the not-found provider".
    pub fn empty() -> Self {
        Self {
            path: String::new(),
            destination: None,
            redirected: false,
        }
    }
}

impl fmt::Debug for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Match")
            .field("path", &self.path)
            .field("destination", &self.destination.as_ref().map(|_| "<provider>"))
            .field("redirected", &self.redirected)
            .finish()
    }
}

/// Immutable (per configuration) mapping from exact path strings to entries.
///
/// Keys are exact strings; there is no pattern or wildcard matching. Longest
/// prefix resolution comes purely from [`RouteTable::longest_match`]
/// truncating the candidate at `/` boundaries.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: HashMap<String, RouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(mut self, path: impl Into<String>, provider: ContentProvider) -> Self {
        self.insert_content(path, provider);
        self
    }

    pub fn with_redirect(mut self, path: impl Into<String>, target: impl Into<String>) -> Self {
        self.insert_redirect(path, target);
        self
    }

    pub fn insert_content(&mut self, path: impl Into<String>, provider: ContentProvider) {
        self.entries
            .insert(path.into(), RouteEntry::Content(provider));
    }

    pub fn insert_redirect(&mut self, path: impl Into<String>, target: impl Into<String>) {
        self.entries
            .insert(path.into(), RouteEntry::Redirect(target.into()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Single-level lookup that follows redirect chains.
    ///
    /// A chain ending in a missing key reports the miss with the accumulated
    /// `redirected` flag and the dead target as `path`. A previously visited
    /// path reappearing in the chain fails fast with
    /// [`RouterError::RedirectCycle`] instead of looping.
    pub fn resolve(&self, path: &str) -> Result<Match> {
        let mut current = path.to_string();
        let mut redirected = false;
        let mut visited: Vec<String> = Vec::new();

        loop {
            match self.entries.get(current.as_str()) {
                Some(RouteEntry::Content(provider)) => {
                    return Ok(Match {
                        path: current,
                        destination: Some(Rc::clone(provider)),
                        redirected,
                    });
                }
                Some(RouteEntry::Redirect(target)) => {
                    if visited.contains(&current) {
                        return Err(RouterError::RedirectCycle(current));
                    }
                    redirected = true;
                    let next = target.clone();
                    visited.push(current);
                    current = next;
                }
                None => {
                    return Ok(Match {
                        path: current,
                        destination: None,
                        redirected,
                    });
                }
            }
        }
    }

    /// Longest-prefix resolution by progressive truncation.
    ///
    /// The full candidate is resolved first, so the first hit is already the
    /// longest match; on a miss the candidate is cut at its last `/` and
    /// retried. An empty truncation result ends the search with the empty
    /// match. Note the asymmetry around the empty key: the *initial* candidate
    /// is resolved even when empty, so a `""` table entry routes the blank
    /// fragment, but truncation never reaches `""`.
    pub fn longest_match(&self, candidate: &str) -> Result<Match> {
        let mut candidate = candidate;
        loop {
            let resolved = self.resolve(candidate)?;
            if resolved.destination.is_some() {
                return Ok(resolved);
            }
            candidate = match candidate.rfind('/') {
                Some(separator) => &candidate[..separator],
                None => "",
            };
            if candidate.is_empty() {
                return Ok(Match::empty());
            }
        }
    }
}
