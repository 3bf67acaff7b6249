//! Serve command - run the HTTP API.

use std::path::{Path, PathBuf};

use clap::Args;
use console::style;

use super::load_config;

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Listen address
    #[arg(long)]
    host: Option<String>,

    /// Listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory for uploaded files
    #[arg(long)]
    upload_dir: Option<PathBuf>,

    /// Return canned results instead of calling the model
    #[arg(long)]
    mock: bool,
}

pub async fn run(args: ServeArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;

    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(upload_dir) = args.upload_dir {
        config.storage.upload_dir = upload_dir;
    }
    if args.mock {
        config.vision.mock = true;
    }

    println!(
        "{} Listening on http://{}:{}{}",
        style("ℹ").blue(),
        config.server.host,
        config.server.port,
        if config.vision.mock { " (mock mode)" } else { "" }
    );

    invx_server::serve(&config).await?;
    Ok(())
}
