use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;

/// Command-line flags. Any flag given here wins over the config file and
/// the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "beacon")]
#[command(about = "Minimal HTTP/1.1 server")]
#[command(version)]
pub struct Cli {
    /// YAML configuration file
    #[arg(long, env = "BEACON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory served under /files
    #[arg(long)]
    pub directory: Option<PathBuf>,

    /// Host/IP to listen on
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl Cli {
    pub fn into_config(self) -> anyhow::Result<Config> {
        let mut cfg = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::load()?,
        };

        if let Some(dir) = self.directory {
            cfg.files.directory = Some(dir);
        }
        if let Some(host) = self.host {
            cfg.server.host = host;
        }
        if let Some(port) = self.port {
            cfg.server.port = port;
        }

        Ok(cfg)
    }
}
