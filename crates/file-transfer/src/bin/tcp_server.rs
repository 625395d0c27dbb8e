use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use quasi_http::StandardServer;
use quasi_http_file_transfer::{DemoConfig, FileReceiver, init_logging};
use quasi_http_transport::{SocketServerTransport, serve_tcp};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;
    let config = DemoConfig::from_env()?;

    let application = FileReceiver::new(config.tcp_port.to_string(), &config.save_dir);
    let transport = SocketServerTransport::new().with_default_processing_options(config.processing_options());
    let server = Arc::new(StandardServer::new(Arc::new(transport), Arc::new(application)));

    let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, config.tcp_port))).await?;
    info!(port = config.tcp_port, "started tcp file server, press ctrl-c to exit");
    tokio::select! {
        () = serve_tcp(listener, server) => {}
        signal = tokio::signal::ctrl_c() => signal?,
    }
    info!("stopping tcp file server");
    Ok(())
}
