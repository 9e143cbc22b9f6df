//! Route table and resolver.
//!
//! Downstream code imports routing types from here while the matching and
//! redirect-following implementation lives in the private `core` module.

mod core;

pub use core::{Content, ContentProvider, Match, RouteEntry, RouteTable};
