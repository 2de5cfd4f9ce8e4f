//! Service layer modules for external collaborators.

pub mod documents;

pub use documents::{DocumentError, DocumentStore, UrlDocumentStore};
