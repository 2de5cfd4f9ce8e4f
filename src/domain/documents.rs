use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Document attached to a tender or a bid, as stored and echoed back
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentRef {
    pub file_name: String,
    pub file_url: String,
}

/// Document reference as submitted by a client.
///
/// When `file_url` is absent the document store resolves it from the file name.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentUpload {
    pub file_name: String,
    #[serde(default)]
    pub file_url: Option<String>,
}

pub(crate) fn validate_uploads(documents: &[DocumentUpload]) -> Result<(), ValidationError> {
    if documents.iter().any(|d| d.file_name.trim().is_empty()) {
        return Err(ValidationError::new("Document file name must not be empty"));
    }
    Ok(())
}
