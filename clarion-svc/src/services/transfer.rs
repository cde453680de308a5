//! Remote enhancement API client
//!
//! Speaks the three-operation wire protocol of the enhancement service:
//! multipart submit, poll, streamed download. Retry and timeout policy
//! live in the per-file worker, not here; every call is a single attempt.

use crate::models::JobConfig;
use futures::StreamExt;
use reqwest::multipart;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Transfer client errors
#[derive(Debug, Error)]
pub enum TransferError {
    /// Network or TLS failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Local file I/O failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Remote rejected the upload (any non-201 submit response)
    #[error("Submission rejected ({status}): {body}")]
    Submission { status: u16, body: String },

    /// Remote answered with a body the protocol does not allow
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Result of one poll attempt against a submitted media
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Processing still in progress, retry later
    NotReady,
    /// Enhanced media fully written to the output path
    Ready,
    /// Terminal remote failure for this file
    Failed { status: u16, reason: String },
}

/// Seam between the orchestrator and the wire protocol.
///
/// The per-file worker and batch scheduler are generic over this trait so
/// tests can substitute a mock for the network.
pub trait Transfer: Send + Sync + 'static {
    /// Submit a local file for enhancement, returning the remote `uid`
    fn submit(
        &self,
        input: &Path,
        config: &JobConfig,
        file_name: &str,
    ) -> impl Future<Output = Result<String, TransferError>> + Send;

    /// Poll a submitted media; on success the enhanced media is streamed
    /// to `output` before `PollOutcome::Ready` is returned.
    fn poll_and_download(
        &self,
        uid: &str,
        output: &Path,
    ) -> impl Future<Output = Result<PollOutcome, TransferError>> + Send;
}

/// JSON parameter object sent as the `media_enhancement` multipart field
#[derive(Debug, Serialize)]
struct MediaEnhancementParams<'a> {
    loudness_target_level: i32,
    true_peak: i32,
    enhancement_level: u8,
    enhancement_model: &'a str,
    file_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    uid: String,
}

/// reqwest-backed client for the remote enhancement API
pub struct ApiTransferClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ApiTransferClient {
    /// Create a client for `base_url`, authenticating with `api_key`.
    ///
    /// Only a connect timeout is applied; downloads of large media must
    /// not be cut off by a total-request timeout.
    pub fn new(base_url: &str, api_key: String) -> Result<Self, TransferError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| TransferError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

impl Transfer for ApiTransferClient {
    async fn submit(
        &self,
        input: &Path,
        config: &JobConfig,
        file_name: &str,
    ) -> Result<String, TransferError> {
        let params = MediaEnhancementParams {
            loudness_target_level: config.loudness_target_level,
            true_peak: config.true_peak,
            enhancement_level: config.enhancement_level,
            enhancement_model: config.model.wire_name(),
            file_name,
        };
        let params_json = serde_json::to_string(&params)
            .map_err(|e| TransferError::Protocol(e.to_string()))?;

        // Stream the file body instead of buffering it in memory
        let file = tokio::fs::File::open(input).await?;
        let file_part = multipart::Part::stream(reqwest::Body::wrap_stream(ReaderStream::new(
            file,
        )))
        .file_name(file_name.to_string())
        .mime_str("application/octet-stream")
        .map_err(|e| TransferError::Protocol(e.to_string()))?;

        let form = multipart::Form::new()
            .text("media_enhancement", params_json)
            .part("file", file_part);

        tracing::debug!(input = %input.display(), "Submitting media for enhancement");

        let response = self
            .http
            .post(format!("{}/medias", self.base_url))
            .header("X-API-Key", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransferError::Transport(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Err(TransferError::Submission {
                status: status.as_u16(),
                body,
            });
        }

        let submit: SubmitResponse = response
            .json()
            .await
            .map_err(|e| TransferError::Protocol(e.to_string()))?;

        tracing::debug!(input = %input.display(), uid = %submit.uid, "Media accepted");
        Ok(submit.uid)
    }

    async fn poll_and_download(
        &self,
        uid: &str,
        output: &Path,
    ) -> Result<PollOutcome, TransferError> {
        let response = self
            .http
            .get(format!("{}/medias/{}/file", self.base_url, uid))
            .header("X-API-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| TransferError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::PRECONDITION_FAILED => Ok(PollOutcome::NotReady),
            StatusCode::OK => {
                if let Some(parent) = output.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }

                // Stream into a temporary sibling and rename into place only
                // after the whole body is flushed. A connection dropped
                // mid-stream must not leave a truncated file at the output
                // path, where a later run would mistake it for a cached
                // result.
                let tmp = partial_download_path(output);
                let mut file = tokio::fs::File::create(&tmp).await?;
                let mut stream = response.bytes_stream();
                let mut written: u64 = 0;
                let streamed: Result<(), TransferError> = async {
                    while let Some(chunk) = stream.next().await {
                        let chunk =
                            chunk.map_err(|e| TransferError::Transport(e.to_string()))?;
                        file.write_all(&chunk).await?;
                        written += chunk.len() as u64;
                    }
                    file.flush().await?;
                    Ok(())
                }
                .await;

                drop(file);
                if let Err(e) = streamed {
                    let _ = tokio::fs::remove_file(&tmp).await;
                    return Err(e);
                }
                tokio::fs::rename(&tmp, output).await?;

                tracing::debug!(uid = %uid, output = %output.display(), bytes = written, "Enhanced media downloaded");
                Ok(PollOutcome::Ready)
            }
            status => {
                let reason = response.text().await.unwrap_or_default();
                Ok(PollOutcome::Failed {
                    status: status.as_u16(),
                    reason,
                })
            }
        }
    }
}

/// In-progress download path: a `.part`-suffixed sibling of `output`
fn partial_download_path(output: &Path) -> std::path::PathBuf {
    let file_name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string());
    output.with_file_name(format!("{}.part", file_name))
}
