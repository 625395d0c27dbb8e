use std::sync::Arc;

use quasi_http::StandardServer;
use quasi_http_file_transfer::{DemoConfig, FileReceiver, init_logging};
use quasi_http_transport::{SocketServerTransport, bind_unix, serve_unix};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;
    let config = DemoConfig::from_env()?;

    let application = FileReceiver::new(config.ipc_path.to_string_lossy(), &config.save_dir);
    let transport = SocketServerTransport::new().with_default_processing_options(config.processing_options());
    let server = Arc::new(StandardServer::new(Arc::new(transport), Arc::new(application)));

    let listener = bind_unix(&config.ipc_path)?;
    info!(path = %config.ipc_path.display(), "started ipc file server, press ctrl-c to exit");
    tokio::select! {
        () = serve_unix(listener, server) => {}
        signal = tokio::signal::ctrl_c() => signal?,
    }
    info!("stopping ipc file server");
    std::fs::remove_file(&config.ipc_path)?;
    Ok(())
}
