use std::sync::Arc;

use quasi_http::StandardClient;
use quasi_http_file_transfer::{DemoConfig, init_logging, start_transferring_files};
use quasi_http_transport::UnixClientTransport;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;
    let config = DemoConfig::from_env()?;

    let transport = UnixClientTransport::new().with_default_send_options(config.processing_options());
    let client = StandardClient::new(Arc::new(transport));

    info!(path = %config.ipc_path.display(), "connecting ipc file client");
    if let Err(e) = start_transferring_files(&client, &config.ipc_path, &config.upload_dir).await {
        error!(cause = %format!("{e:#}"), "fatal error encountered");
        return Err(e);
    }
    Ok(())
}
