use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use quasi_http::StandardClient;
use quasi_http_file_transfer::{DemoConfig, init_logging, start_transferring_files};
use quasi_http_transport::TcpClientTransport;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;
    let config = DemoConfig::from_env()?;

    let transport = TcpClientTransport::new().with_default_send_options(config.processing_options());
    let client = StandardClient::new(Arc::new(transport));
    let endpoint = SocketAddr::from((Ipv4Addr::LOCALHOST, config.tcp_port));

    info!(%endpoint, "connecting tcp file client");
    if let Err(e) = start_transferring_files(&client, &endpoint, &config.upload_dir).await {
        error!(cause = %format!("{e:#}"), "fatal error encountered");
        return Err(e);
    }
    Ok(())
}
