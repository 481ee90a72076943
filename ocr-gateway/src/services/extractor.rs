use crate::config::ExtractionConfig;
use crate::dtos::ExtractRequest;
use crate::error::FailureCause;
use crate::services::analysis::{
    AnalysisDocument, AnalysisError, DocumentAnalyzer, DocumentStream, OperationHandle,
    OperationStatus,
};
use backoff::future::retry;
use backoff::ExponentialBackoff;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::io::ReaderStream;

/// Why a poll did not produce a document.
enum PollOutcome {
    Pending,
    Failed(AnalysisError),
}

/// Submits local files to the analysis backend and flattens the result to text.
#[derive(Clone)]
pub struct TextExtractor {
    analyzer: Arc<dyn DocumentAnalyzer>,
    config: ExtractionConfig,
}

impl TextExtractor {
    pub fn new(analyzer: Arc<dyn DocumentAnalyzer>, config: ExtractionConfig) -> Self {
        Self { analyzer, config }
    }

    pub async fn extract(&self, request: &ExtractRequest) -> Result<String, FailureCause> {
        let start = Instant::now();

        match self.analyze(request).await {
            Ok(text) => {
                metrics::counter!("extractions_total", "outcome" => "success").increment(1);
                metrics::histogram!("extraction_duration_seconds")
                    .record(start.elapsed().as_secs_f64());
                tracing::info!(
                    file_path = %request.file_path.display(),
                    text_length = text.len(),
                    duration_ms = start.elapsed().as_millis(),
                    "Text extracted"
                );
                tracing::debug!(content = %text, "Extracted content");
                Ok(text)
            }
            Err(e) => {
                metrics::counter!("extractions_total", "outcome" => "failure").increment(1);
                tracing::error!(
                    file_path = %request.file_path.display(),
                    error = %e,
                    "Error during document analysis"
                );
                Err(e.into())
            }
        }
    }

    async fn analyze(&self, request: &ExtractRequest) -> Result<String, AnalysisError> {
        let file = tokio::fs::File::open(&request.file_path)
            .await
            .map_err(|e| AnalysisError::Request(e.to_string()))?;
        let document: DocumentStream = Box::pin(ReaderStream::new(file));

        tracing::debug!(file_path = %request.file_path.display(), "File stream created");

        let handle = self.analyzer.submit(&self.config.model_id, document).await?;
        let result = self.wait_for_completion(&handle).await?;

        result.to_text()
    }

    /// Poll with exponential backoff until the operation finishes or the
    /// configured maximum wait elapses. Backend errors end the loop at once.
    async fn wait_for_completion(
        &self,
        handle: &OperationHandle,
    ) -> Result<AnalysisDocument, AnalysisError> {
        let backoff = ExponentialBackoff {
            initial_interval: self.config.poll_interval(),
            current_interval: self.config.poll_interval(),
            max_interval: self.config.max_poll_interval(),
            max_elapsed_time: Some(self.config.max_wait()),
            ..Default::default()
        };

        let result = retry(backoff, || async {
            match self.analyzer.poll(handle).await {
                Ok(OperationStatus::Succeeded(document)) => Ok(document),
                Ok(OperationStatus::Running) => {
                    tracing::trace!(operation = %handle.as_str(), "Analysis still running");
                    Err(backoff::Error::transient(PollOutcome::Pending))
                }
                Err(e) => Err(backoff::Error::permanent(PollOutcome::Failed(e))),
            }
        })
        .await;

        result.map_err(|outcome| match outcome {
            PollOutcome::Pending => AnalysisError::TimedOut(self.config.max_wait_secs),
            PollOutcome::Failed(e) => e,
        })
    }
}
