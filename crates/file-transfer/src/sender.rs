use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use quasi_http::StandardClient;
use quasi_http::connection::ClientTransport;
use quasi_http::protocol::constants::STATUS_CODE_OK;
use quasi_http::protocol::{Attributes, Body, Headers, ProcessingOptions, Request, Response};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::{HEADER_ECHO_BODY, HEADER_FILE_NAME};

/// Totals of one [`start_transferring_files`] run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferSummary {
    pub files: usize,
    pub bytes: u64,
    pub elapsed: Duration,
}

impl TransferSummary {
    pub fn megabytes(&self) -> f64 {
        #[expect(clippy::cast_precision_loss, reason = "display only")]
        let bytes = self.bytes as f64;
        bytes / (1024.0 * 1024.0)
    }

    pub fn megabytes_per_second(&self) -> f64 {
        let seconds = self.elapsed.as_secs_f64();
        if seconds > 0.0 { self.megabytes() / seconds } else { 0.0 }
    }
}

/// How one upload exercises the client; the file index picks a different
/// combination for each of eight consecutive files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Variant {
    echo_body: bool,
    known_length: bool,
    deferred_request: bool,
    unlimited_response: bool,
}

impl Variant {
    fn for_index(index: usize) -> Self {
        Self {
            echo_body: index % 2 == 0,
            known_length: (index / 2) % 2 == 0,
            deferred_request: (index / 4) % 2 == 1,
            unlimited_response: index % 3 == 0,
        }
    }
}

/// Uploads every regular file directly inside `upload_dir`, one request per
/// file, in file name order.
pub async fn start_transferring_files<T>(
    client: &StandardClient<T>,
    endpoint: &T::Endpoint,
    upload_dir: &Path,
) -> anyhow::Result<TransferSummary>
where
    T: ClientTransport + 'static,
{
    let directory =
        fs::canonicalize(upload_dir).await.with_context(|| format!("invalid upload directory {}", upload_dir.display()))?;
    let mut files = Vec::new();
    let mut entries = fs::read_dir(&directory).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();

    let start = Instant::now();
    let mut bytes = 0;
    for (index, path) in files.iter().enumerate() {
        debug!(path = %path.display(), "transferring");
        bytes += transfer_file(client, endpoint, path, Variant::for_index(index)).await?;
        info!(path = %path.display(), "successfully transferred");
    }
    let summary = TransferSummary { files: files.len(), bytes, elapsed: start.elapsed() };
    info!(
        "successfully transferred {} bytes ({:.2} MB) worth of data in {} files in {:.2} seconds = {:.2} MB/s",
        summary.bytes,
        summary.megabytes(),
        summary.files,
        summary.elapsed.as_secs_f64(),
        summary.megabytes_per_second()
    );
    Ok(summary)
}

async fn transfer_file<T>(
    client: &StandardClient<T>,
    endpoint: &T::Endpoint,
    path: &Path,
    variant: Variant,
) -> anyhow::Result<u64>
where
    T: ClientTransport + 'static,
{
    let result = try_transfer_file(client, endpoint, path, variant).await;
    if let Err(e) = &result {
        warn!(path = %path.display(), cause = %format!("{e:#}"), "file sent with error");
    }
    result
}

async fn try_transfer_file<T>(
    client: &StandardClient<T>,
    endpoint: &T::Endpoint,
    path: &Path,
    variant: Variant,
) -> anyhow::Result<u64>
where
    T: ClientTransport + 'static,
{
    let file_name = path.file_name().and_then(|n| n.to_str()).with_context(|| format!("bad file name {}", path.display()))?;
    let full_path = path.to_string_lossy().into_owned();

    let mut headers = Headers::new().with(HEADER_FILE_NAME, [hex::encode(file_name)]);
    if variant.echo_body {
        headers.insert(HEADER_ECHO_BODY, [hex::encode(&full_path)]);
    }
    let file = fs::File::open(path).await?;
    let size = file.metadata().await?.len();
    let content_length = if variant.known_length { i64::try_from(size)? } else { -1 };
    let request = Request::new()
        .with_method("POST")
        .with_target("/upload")
        .with_content_length(content_length)
        .with_headers(headers)
        .with_body(Body::from_async_read(file));

    let options = variant.unlimited_response.then(|| ProcessingOptions::new().with_max_response_body_size(-1));
    let mut response = if variant.deferred_request {
        client.send2(endpoint, move |_: &Attributes| Some(request), options.as_ref()).await?
    } else {
        client.send(endpoint, request, options.as_ref()).await?
    };

    let outcome = check_response(&mut response, &full_path, variant.echo_body).await;
    response.release().await?;
    outcome.map(|()| size)
}

async fn check_response(
    response: &mut Response,
    full_path: &str,
    echo_body: bool,
) -> anyhow::Result<()> {
    let body = match response.body.as_mut() {
        Some(body) => String::from_utf8_lossy(&body.read_to_end().await?).into_owned(),
        None => String::new(),
    };
    if response.status_code != STATUS_CODE_OK {
        bail!("status code indicates error: {}\n{body}", response.status_code);
    }
    if echo_body {
        let echoed = String::from_utf8(hex::decode(body.trim())?)?;
        if echoed != full_path {
            bail!("expected echo body to be {full_path} but got {echoed}");
        }
    }
    Ok(())
}
