//! In-memory document model that counter behaviours bind to.
//!
//! Markup is parsed once with `scraper`; selector queries run against that
//! tree, while the mutable parts of the page (text content, checked state,
//! attachment, change listeners) live in a per-element side table.

#![allow(clippy::all)]

pub mod document;
pub mod events;

pub use document::{Document, DocumentId, ElementId};
pub use events::{ChangeEvent, ListenerId};
