pub mod analysis;
pub mod downloader;
pub mod executor;
pub mod extractor;
pub mod metrics;

pub use analysis::{AzureDocumentAnalyzer, DocumentAnalyzer, MockDocumentAnalyzer};
pub use downloader::Downloader;
pub use executor::CommandExecutor;
pub use extractor::TextExtractor;
pub use metrics::{get_metrics, init_metrics};
