//! Document analysis backends.
//!
//! Analysis is a long-running operation: a document is submitted under a
//! model id, the backend hands back an operation handle, and the handle is
//! polled until the backend reports a result. The [`DocumentAnalyzer`]
//! trait captures exactly those two calls so the extractor can drive the
//! poll loop against Azure or an in-memory backend alike.

pub mod azure;
pub mod mock;

pub use azure::AzureDocumentAnalyzer;
pub use mock::MockDocumentAnalyzer;

use async_trait::async_trait;
use axum::body::Bytes;
use futures::Stream;
use serde::Deserialize;
use std::pin::Pin;
use thiserror::Error;

/// Raw document bytes streamed to the backend.
pub type DocumentStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send + Sync>>;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("{0}")]
    Request(String),

    #[error("{0}")]
    Api(String),

    #[error("{0}")]
    InvalidResponse(String),

    #[error("{0}")]
    OperationFailed(String),

    #[error("Analysis did not complete within {0} seconds.")]
    TimedOut(u64),

    #[error("No content found in the file.")]
    NoContent,
}

/// Opaque reference to a submitted analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationHandle(String);

impl OperationHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Result of a single poll.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationStatus {
    Running,
    Succeeded(AnalysisDocument),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AnalysisDocument {
    #[serde(default)]
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub lines: Vec<Line>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Line {
    pub content: String,
}

impl AnalysisDocument {
    /// Build a document from plain page/line text, mostly for tests and mocks.
    pub fn from_lines<P, L>(pages: P) -> Self
    where
        P: IntoIterator<Item = L>,
        L: IntoIterator,
        L::Item: Into<String>,
    {
        Self {
            pages: pages
                .into_iter()
                .enumerate()
                .map(|(index, lines)| Page {
                    page_number: index as u32 + 1,
                    lines: lines
                        .into_iter()
                        .map(|content| Line {
                            content: content.into(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Lines joined by `\n` within a page, pages joined by a blank line.
    ///
    /// A document without pages has no content and is an error.
    pub fn to_text(&self) -> Result<String, AnalysisError> {
        if self.pages.is_empty() {
            return Err(AnalysisError::NoContent);
        }

        Ok(self
            .pages
            .iter()
            .map(|page| {
                page.lines
                    .iter()
                    .map(|line| line.content.as_str())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}

#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    /// Start analysing `document` with the given model.
    async fn submit(
        &self,
        model_id: &str,
        document: DocumentStream,
    ) -> Result<OperationHandle, AnalysisError>;

    /// Check on a previously submitted analysis.
    async fn poll(&self, handle: &OperationHandle) -> Result<OperationStatus, AnalysisError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_and_lines_keep_their_order() {
        let document = AnalysisDocument::from_lines([vec!["A", "B"], vec!["C"]]);
        assert_eq!(document.to_text().unwrap(), "A\nB\n\nC");
    }

    #[test]
    fn empty_page_contributes_an_empty_block() {
        let document = AnalysisDocument::from_lines([vec!["A"], vec![], vec!["C"]]);
        assert_eq!(document.to_text().unwrap(), "A\n\n\n\nC");
    }

    #[test]
    fn zero_pages_is_no_content() {
        let err = AnalysisDocument::default().to_text().unwrap_err();
        assert!(matches!(err, AnalysisError::NoContent));
        assert_eq!(err.to_string(), "No content found in the file.");
    }

    #[test]
    fn deserializes_backend_shape() {
        let document: AnalysisDocument = serde_json::from_value(serde_json::json!({
            "apiVersion": "2023-07-31",
            "modelId": "prebuilt-read",
            "content": "Invoice\nTotal",
            "pages": [
                {
                    "pageNumber": 1,
                    "width": 8.5,
                    "lines": [
                        { "content": "Invoice", "polygon": [0.1, 0.2] },
                        { "content": "Total", "polygon": [0.3, 0.4] }
                    ]
                },
                { "pageNumber": 2 }
            ]
        }))
        .unwrap();

        assert_eq!(document.pages.len(), 2);
        assert_eq!(document.pages[0].page_number, 1);
        assert!(document.pages[1].lines.is_empty());
        assert_eq!(document.to_text().unwrap(), "Invoice\nTotal\n\n");
    }
}
