//! In-memory document for pagetrace.
//!
//! [`MemoryDocument`] implements [`DomHost`](pagetrace_protocols::DomHost) over
//! an arena of element nodes. It stands in for a live browser page in tests and
//! in the `pagetrace record` driver: pages are loaded from a JSON
//! [`PageFixture`], and user activity is simulated with
//! [`MemoryDocument::click`] and [`MemoryDocument::type_text`], which dispatch
//! to whatever listeners the engine attached.
//!
//! Only the body subtree is modelled as elements; the head is kept as markup.

mod document;
mod error;
mod fixture;
mod markup;

pub use document::MemoryDocument;
pub use error::FixtureError;
pub use fixture::{ElementFixture, PageFixture, ScrollOffset};

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
