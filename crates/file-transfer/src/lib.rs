//! File upload demo over quasi http.
//!
//! [`start_transferring_files`] uploads every file of a directory, one
//! request per file, and a [`FileReceiver`] stores them on the other side. The binaries wire both ends to TCP or Unix domain socket
//! transports and are configured through [`DemoConfig`].

pub mod config;
pub mod receiver;
pub mod sender;

pub use config::DemoConfig;
pub use receiver::FileReceiver;
pub use sender::{TransferSummary, start_transferring_files};

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Header carrying the hex encoded name of the uploaded file.
pub const HEADER_FILE_NAME: &str = "f";
/// Header asking the receiver to echo its value back as the response body.
pub const HEADER_ECHO_BODY: &str = "echo-body";

/// Installs the global subscriber, filtered by `RUST_LOG` and defaulting to
/// `info`.
pub fn init_logging() -> anyhow::Result<()> {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let subscriber = FmtSubscriber::builder().with_env_filter(env_filter(directives.as_deref())).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn env_filter(directives: Option<&str>) -> EnvFilter {
    directives.and_then(|d| EnvFilter::try_new(d).ok()).unwrap_or_else(|| EnvFilter::new("info"))
}
