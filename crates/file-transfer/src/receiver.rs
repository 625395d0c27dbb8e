use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use quasi_http::handler::Application;
use quasi_http::io::copy_to;
use quasi_http::protocol::constants::{STATUS_CODE_OK, STATUS_CODE_SERVER_ERROR};
use quasi_http::protocol::{QuasiHttpError, Request, Response};
use tokio::fs;
use tracing::{debug, error, info};

use crate::{HEADER_ECHO_BODY, HEADER_FILE_NAME};

/// Stores uploaded files under a directory named after the sending peer.
///
/// Answers 200 once a file is stored, echoing the `echo-body` header value
/// when the request carries one, and 500 with the error message otherwise.
#[derive(Debug)]
pub struct FileReceiver {
    remote_endpoint: String,
    download_dir: PathBuf,
    responses: AtomicUsize,
}

impl FileReceiver {
    pub fn new<E: Into<String>, P: Into<PathBuf>>(remote_endpoint: E, download_dir: P) -> Self {
        Self { remote_endpoint: remote_endpoint.into(), download_dir: download_dir.into(), responses: AtomicUsize::new(0) }
    }

    /// Directory receiving files from this receiver's peer.
    pub fn peer_dir(&self) -> PathBuf {
        let sanitized: String =
            self.remote_endpoint.chars().map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' }).collect();
        self.download_dir.join(sanitized)
    }

    async fn receive_file(&self, request: &mut Request) -> anyhow::Result<String> {
        let encoded = request.headers.first(HEADER_FILE_NAME).ok_or_else(|| anyhow!("missing file name header"))?;
        let decoded = String::from_utf8(hex::decode(encoded).context("file name is not hex encoded")?)
            .context("file name is not valid UTF-8")?;
        let file_name = Path::new(&decoded)
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_owned)
            .ok_or_else(|| anyhow!("invalid file name: {decoded}"))?;

        let directory = self.peer_dir();
        fs::create_dir_all(&directory)
            .await
            .with_context(|| format!("could not create directory at {}", directory.display()))?;
        let path = directory.join(&file_name);
        let mut file = fs::File::create(&path).await.with_context(|| format!("could not create {}", path.display()))?;

        debug!(file_name = %file_name, remote_endpoint = %self.remote_endpoint, "starting receipt of file");
        if let Some(body) = request.body.as_mut() {
            copy_to(body, &mut file).await.with_context(|| format!("could not receive {file_name}"))?;
        }
        Ok(file_name)
    }

    fn respond(&self, status_code: i32, body: Option<String>) -> Response {
        let mut response = Response::new().with_status_code(status_code);
        if let Some(body) = body.filter(|b| !b.is_empty()) {
            // alternate between known and unknown content lengths
            let content_length = if self.responses.fetch_add(1, Ordering::Relaxed) % 2 == 0 {
                i64::try_from(body.len()).unwrap_or(-1)
            } else {
                -1
            };
            response = response.with_content_length(content_length).with_body(body);
        }
        response
    }
}

#[async_trait]
impl Application for FileReceiver {
    type Error = QuasiHttpError;

    async fn process_request(&self, mut request: Request) -> Result<Option<Response>, QuasiHttpError> {
        let response = match self.receive_file(&mut request).await {
            Ok(file_name) => {
                info!(file_name = %file_name, "file received successfully");
                let echo = request.headers.first(HEADER_ECHO_BODY).map(str::to_owned);
                self.respond(STATUS_CODE_OK, echo)
            }
            Err(e) => {
                error!(cause = %format!("{e:#}"), "file received with error");
                self.respond(STATUS_CODE_SERVER_ERROR, Some(format!("{e:#}")))
            }
        };
        Ok(Some(response))
    }
}
