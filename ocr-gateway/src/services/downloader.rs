//! Fetches remote files through an external downloader process.
//!
//! The downloader is invoked as
//! `<program> --no-check-certificate <url> -O <destination>`, so any
//! protocol the utility understands is available without an in-process
//! HTTP client. Concurrent downloads to the same name are not coordinated;
//! the last process to finish writing wins.

use crate::config::DownloadConfig;
use crate::dtos::DownloadRequest;
use crate::error::FailureCause;
use crate::services::executor::CommandExecutor;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct Downloader {
    program: String,
    base_dir: PathBuf,
    executor: CommandExecutor,
}

impl Downloader {
    pub fn new(config: &DownloadConfig) -> Self {
        Self {
            program: config.program.clone(),
            base_dir: config.base_dir.clone(),
            executor: CommandExecutor::new(config.timeout()),
        }
    }

    /// Where a file with the given (already validated) name will be written.
    pub fn destination_for(&self, file_name: &str) -> PathBuf {
        self.base_dir.join(file_name)
    }

    pub async fn download(&self, request: &DownloadRequest) -> Result<PathBuf, FailureCause> {
        let destination = self.destination_for(&request.file_name);
        let args = command_args(&request.file_url, &destination);
        let start = Instant::now();

        tracing::info!(
            file_url = %request.file_url,
            destination = %destination.display(),
            "Starting download"
        );

        match self.executor.execute(&self.program, &args).await {
            Ok(_) => {
                metrics::counter!("downloads_total", "outcome" => "success").increment(1);
                tracing::info!(
                    destination = %destination.display(),
                    duration_ms = start.elapsed().as_millis(),
                    "File downloaded successfully"
                );
                Ok(destination)
            }
            Err(e) => {
                metrics::counter!("downloads_total", "outcome" => "failure").increment(1);
                tracing::error!(
                    file_url = %request.file_url,
                    error = %e,
                    "Error downloading file"
                );
                Err(FailureCause::ProcessExecution(e.to_string()))
            }
        }
    }
}

fn command_args(url: &str, destination: &Path) -> Vec<OsString> {
    vec![
        OsString::from("--no-check-certificate"),
        OsString::from(url),
        OsString::from("-O"),
        destination.as_os_str().to_os_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn downloader(program: &str) -> Downloader {
        Downloader::new(&DownloadConfig {
            base_dir: PathBuf::from("/srv/downloads"),
            program: program.to_string(),
            timeout_secs: 10,
        })
    }

    fn request() -> DownloadRequest {
        DownloadRequest {
            file_url: "https://example.com/files/report.pdf?sig=a&b=c".to_string(),
            file_name: "report.pdf".to_string(),
        }
    }

    #[test]
    fn destination_is_base_dir_plus_name() {
        assert_eq!(
            downloader("wget").destination_for("report.pdf"),
            PathBuf::from("/srv/downloads/report.pdf")
        );
    }

    #[test]
    fn arguments_follow_downloader_contract() {
        let args = command_args(
            "https://example.com/a b.pdf",
            Path::new("/srv/downloads/a.pdf"),
        );
        assert_eq!(
            args,
            vec![
                OsString::from("--no-check-certificate"),
                OsString::from("https://example.com/a b.pdf"),
                OsString::from("-O"),
                OsString::from("/srv/downloads/a.pdf"),
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn zero_exit_yields_destination() {
        let path = downloader("true").download(&request()).await.unwrap();
        assert_eq!(path, PathBuf::from("/srv/downloads/report.pdf"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_a_process_failure() {
        let err = downloader("false").download(&request()).await.unwrap_err();
        assert!(matches!(err, FailureCause::ProcessExecution(_)));
    }

    #[tokio::test]
    async fn unspawnable_program_is_a_process_failure() {
        let err = downloader("no-such-downloader-binary")
            .download(&request())
            .await
            .unwrap_err();
        match err {
            FailureCause::ProcessExecution(message) => {
                assert!(message.contains("no-such-downloader-binary"))
            }
            other => panic!("unexpected cause: {:?}", other),
        }
    }
}
