//! In-memory analyzer for tests and local development.

use super::{
    AnalysisDocument, AnalysisError, DocumentAnalyzer, DocumentStream, OperationHandle,
    OperationStatus,
};
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Returns a fixed document after a configurable number of `Running` polls.
pub struct MockDocumentAnalyzer {
    document: AnalysisDocument,
    pending_polls: usize,
    failure: Option<String>,
    polls: AtomicUsize,
    submitted_bytes: AtomicUsize,
}

impl Default for MockDocumentAnalyzer {
    fn default() -> Self {
        Self::new(AnalysisDocument::from_lines([[
            "Mock text extracted by the local analyzer.",
        ]]))
    }
}

impl MockDocumentAnalyzer {
    pub fn new(document: AnalysisDocument) -> Self {
        Self {
            document,
            pending_polls: 0,
            failure: None,
            polls: AtomicUsize::new(0),
            submitted_bytes: AtomicUsize::new(0),
        }
    }

    /// Every submission fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new(AnalysisDocument::default())
        }
    }

    /// Report `Running` this many times before succeeding.
    pub fn with_pending_polls(mut self, pending_polls: usize) -> Self {
        self.pending_polls = pending_polls;
        self
    }

    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn submitted_bytes(&self) -> usize {
        self.submitted_bytes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentAnalyzer for MockDocumentAnalyzer {
    async fn submit(
        &self,
        model_id: &str,
        mut document: DocumentStream,
    ) -> Result<OperationHandle, AnalysisError> {
        if let Some(message) = &self.failure {
            return Err(AnalysisError::Api(message.clone()));
        }

        let mut total = 0;
        while let Some(chunk) = document.next().await {
            total += chunk.map_err(|e| AnalysisError::Request(e.to_string()))?.len();
        }
        self.submitted_bytes.fetch_add(total, Ordering::SeqCst);

        Ok(OperationHandle::new(format!("mock/{}/{}", model_id, total)))
    }

    async fn poll(&self, _handle: &OperationHandle) -> Result<OperationStatus, AnalysisError> {
        let previous = self.polls.fetch_add(1, Ordering::SeqCst);
        if previous < self.pending_polls {
            Ok(OperationStatus::Running)
        } else {
            Ok(OperationStatus::Succeeded(self.document.clone()))
        }
    }
}
