use std::path::PathBuf;

use anyhow::Context;
use quasi_http::protocol::ProcessingOptions;

pub const DEFAULT_TCP_PORT: u16 = 5001;
pub const DEFAULT_IPC_PATH: &str = "/tmp/quasi-http-demo.sock";
pub const DEFAULT_SAVE_DIR: &str = "logs/server";
pub const DEFAULT_UPLOAD_DIR: &str = "logs/client";
pub const DEFAULT_TIMEOUT_MILLIS: i64 = 5_000;

/// Settings shared by the demo binaries, read from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    /// `TCP_PORT`
    pub tcp_port: u16,
    /// `IPC_PATH`
    pub ipc_path: PathBuf,
    /// `SAVE_DIR`, where the servers store received files.
    pub save_dir: PathBuf,
    /// `UPLOAD_DIR`, whose files the clients send.
    pub upload_dir: PathBuf,
    /// `TIMEOUT_MILLIS`
    pub timeout_millis: i64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            tcp_port: DEFAULT_TCP_PORT,
            ipc_path: PathBuf::from(DEFAULT_IPC_PATH),
            save_dir: PathBuf::from(DEFAULT_SAVE_DIR),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            timeout_millis: DEFAULT_TIMEOUT_MILLIS,
        }
    }
}

impl DemoConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from `lookup`, falling back to defaults for unset
    /// keys.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let tcp_port = match lookup("TCP_PORT") {
            Some(port) => port.trim().parse().with_context(|| format!("invalid TCP_PORT: {port}"))?,
            None => defaults.tcp_port,
        };
        let timeout_millis = match lookup("TIMEOUT_MILLIS") {
            Some(millis) => millis.trim().parse().with_context(|| format!("invalid TIMEOUT_MILLIS: {millis}"))?,
            None => defaults.timeout_millis,
        };
        Ok(Self {
            tcp_port,
            ipc_path: lookup("IPC_PATH").map_or(defaults.ipc_path, PathBuf::from),
            save_dir: lookup("SAVE_DIR").map_or(defaults.save_dir, PathBuf::from),
            upload_dir: lookup("UPLOAD_DIR").map_or(defaults.upload_dir, PathBuf::from),
            timeout_millis,
        })
    }

    /// Default options for both the client and the server transports.
    pub fn processing_options(&self) -> ProcessingOptions {
        ProcessingOptions::new().with_timeout_millis(self.timeout_millis)
    }
}
