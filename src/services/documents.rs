//! Document store collaborator.
//!
//! Uploads are handled elsewhere; the procurement core only needs a
//! retrievable URL for each file name it is given.

use thiserror::Error;
use url::Url;

use crate::domain::DocumentRef;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Invalid document file name '{0}'")]
    InvalidName(String),

    #[error("Invalid document URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Document URL must use http or https, got '{0}'")]
    UnsupportedScheme(String),
}

/// Resolves uploaded file names to retrievable references
pub trait DocumentStore: Send + Sync {
    fn resolve(&self, file_name: &str) -> Result<DocumentRef, DocumentError>;

    /// Accept a URL the client already holds for a document.
    ///
    /// Only absolute `http`/`https` URLs pass; the value is kept as sent.
    fn accept_external(
        &self,
        file_name: &str,
        file_url: &str,
    ) -> Result<DocumentRef, DocumentError> {
        let raw = file_url.trim();
        let url = Url::parse(raw)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DocumentError::UnsupportedScheme(url.scheme().to_string()));
        }

        Ok(DocumentRef {
            file_name: file_name.trim().to_string(),
            file_url: raw.to_string(),
        })
    }
}

/// Document store serving files from a fixed base URL
#[derive(Debug, Clone)]
pub struct UrlDocumentStore {
    base: Url,
}

impl UrlDocumentStore {
    pub fn new(base_url: &str) -> Result<Self, DocumentError> {
        Ok(Self {
            base: Url::parse(base_url)?,
        })
    }
}

impl DocumentStore for UrlDocumentStore {
    fn resolve(&self, file_name: &str) -> Result<DocumentRef, DocumentError> {
        let name = file_name.trim();
        if matches!(name, "" | "." | "..") || name.contains(['/', '\\']) {
            return Err(DocumentError::InvalidName(file_name.to_string()));
        }

        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| DocumentError::InvalidName(file_name.to_string()))?
            .pop_if_empty()
            .push(name);

        Ok(DocumentRef {
            file_name: name.to_string(),
            file_url: url.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_under_base_path() {
        let store = UrlDocumentStore::new("https://files.example.com/uploads").unwrap();
        let doc = store.resolve("site plan.pdf").unwrap();
        assert_eq!(doc.file_name, "site plan.pdf");
        assert_eq!(
            doc.file_url,
            "https://files.example.com/uploads/site%20plan.pdf"
        );
    }

    #[test]
    fn rejects_path_traversal() {
        let store = UrlDocumentStore::new("https://files.example.com/uploads/").unwrap();
        assert!(store.resolve("../secrets.txt").is_err());
        assert!(store.resolve("..").is_err());
        assert!(store.resolve("  ").is_err());
    }

    #[test]
    fn external_urls_must_be_absolute_http() {
        let store = UrlDocumentStore::new("https://files.example.com/uploads/").unwrap();

        let doc = store
            .accept_external("bq.xlsx", " https://cdn.example.org/bq.xlsx ")
            .unwrap();
        assert_eq!(doc.file_url, "https://cdn.example.org/bq.xlsx");

        assert!(matches!(
            store.accept_external("x", "javascript:alert(1)"),
            Err(DocumentError::UnsupportedScheme(scheme)) if scheme == "javascript"
        ));
        assert!(matches!(
            store.accept_external("x", "/uploads/x.pdf"),
            Err(DocumentError::InvalidUrl(_))
        ));
    }
}
