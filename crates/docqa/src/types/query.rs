//! Chat request types

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Session used when the caller does not name one
pub const DEFAULT_SESSION_ID: &str = "default";

/// A question for the RAG pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatQuery {
    /// The question to answer
    pub question: String,

    /// Conversation the question belongs to
    #[serde(default = "default_session_id")]
    pub session_id: String,

    /// Number of chunks to retrieve (configured default when absent)
    #[serde(default)]
    pub k: Option<usize>,

    /// Restrict retrieval to these document names
    #[serde(default)]
    pub documents: Option<Vec<String>>,
}

fn default_session_id() -> String {
    DEFAULT_SESSION_ID.to_string()
}

impl ChatQuery {
    /// Create a new query in the default session
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            session_id: default_session_id(),
            k: None,
            documents: None,
        }
    }

    /// Set the session
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Set the number of chunks to retrieve
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = Some(k);
        self
    }

    /// Restrict retrieval to a comma-separated list of document names
    pub fn with_documents(mut self, documents: &str) -> Self {
        self.documents = parse_document_filter(documents);
        self
    }
}

/// Parse a comma-separated document list: entries trimmed, empty entries dropped.
/// Returns `None` when nothing remains (unrestricted search).
pub fn parse_document_filter(raw: &str) -> Option<Vec<String>> {
    let docs: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect();

    if docs.is_empty() {
        None
    } else {
        Some(docs)
    }
}

/// Form fields as delivered by the chat transport
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub k: Option<String>,
    #[serde(default)]
    pub documents: Option<String>,
}

impl TryFrom<ChatForm> for ChatQuery {
    type Error = Error;

    fn try_from(form: ChatForm) -> Result<Self> {
        let session_id = form
            .session_id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(default_session_id);

        // 0 and blank both mean "use the configured default"
        let k = match form.k.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let k: usize = raw.parse().map_err(|_| {
                    Error::InvalidRequest(format!("k must be a positive integer, got '{}'", raw))
                })?;
                (k > 0).then_some(k)
            }
        };

        Ok(Self {
            question: form.question,
            session_id,
            k,
            documents: form.documents.as_deref().and_then(parse_document_filter),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document_filter() {
        assert_eq!(
            parse_document_filter(" a.pdf, ,b.txt ,"),
            Some(vec!["a.pdf".to_string(), "b.txt".to_string()])
        );
        assert_eq!(parse_document_filter(""), None);
        assert_eq!(parse_document_filter(" , ,"), None);
    }

    #[test]
    fn test_form_defaults() {
        let query = ChatQuery::try_from(ChatForm {
            question: "What?".into(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(query.session_id, DEFAULT_SESSION_ID);
        assert_eq!(query.k, None);
        assert_eq!(query.documents, None);
    }

    #[test]
    fn test_form_k_handling() {
        let form = |k: &str| ChatForm {
            question: "q".into(),
            k: Some(k.into()),
            ..Default::default()
        };

        assert_eq!(ChatQuery::try_from(form("4")).unwrap().k, Some(4));
        assert_eq!(ChatQuery::try_from(form("0")).unwrap().k, None);
        assert_eq!(ChatQuery::try_from(form(" ")).unwrap().k, None);
        assert!(matches!(
            ChatQuery::try_from(form("-1")),
            Err(Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_builder() {
        let query = ChatQuery::new("Q")
            .with_session("s1")
            .with_k(3)
            .with_documents("report.pdf");
        assert_eq!(query.session_id, "s1");
        assert_eq!(query.k, Some(3));
        assert_eq!(query.documents, Some(vec!["report.pdf".to_string()]));
    }
}
