//! In-memory document model
//!
//! The orchestration layer only needs a small slice of the browser DOM:
//! attribute lookup, ancestor walks, subtree scans, one listener table at the
//! document root, and notification when nodes leave the document. This module
//! provides exactly that over an arena of nodes.
//!
//! ## Node identity
//!
//! Nodes are addressed by [`NodeId`], an arena index paired with a generation.
//! Removing a subtree frees its slots and bumps their generation, so an id held
//! by a cache or a closure can never resolve to a node created later in the
//! same slot.
//!
//! ## Mutation delivery
//!
//! Insertions and removals queue [`MutationRecord`]s. Records are delivered to
//! observers at a checkpoint: after every [`Document::dispatch_event`] and
//! whenever [`Document::flush_mutations`] is called. This mirrors how a
//! browser delivers `MutationObserver` batches at the microtask checkpoint
//! rather than synchronously inside the mutating call.
//!
//! ```
//! use touchline_pages::dom::{Document, EventType};
//!
//! let doc = Document::new();
//! let button = doc.create_element("button").attr("data-action", "save");
//! doc.body().append_child(&button).unwrap();
//!
//! assert!(button.is_connected());
//! assert_eq!(button.get_attribute("data-action").as_deref(), Some("save"));
//!
//! let event = doc.dispatch_event(&button, EventType::Click);
//! assert!(!event.default_prevented());
//! ```

mod document;
mod element;
mod event;
mod mutation;

pub use document::{Document, Listener, MutationObserverFn, NodeId};
pub use element::Element;
pub use event::{Event, EventType};
pub use mutation::MutationRecord;
