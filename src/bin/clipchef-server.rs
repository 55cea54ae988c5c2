// ABOUTME: Clipchef API server binary
// ABOUTME: Loads environment configuration, applies CLI overrides, and runs the HTTP server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

//! # Clipchef Server Binary
//!
//! Configuration comes from the environment (and `.env`); flags override
//! the port and data directory.

use anyhow::Result;
use clap::Parser;
use clipchef_server::{config::ServerConfig, logging, server};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "clipchef-server")]
#[command(about = "Clipchef API - cooking videos to recipes with macros and goal variants")]
#[command(version)]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override data directory (jobs, uploads, work files)
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(data_dir) = args.data_dir {
        config.storage.data_dir = data_dir;
    }

    logging::init_from_env()?;

    info!("Starting Clipchef API");
    info!("{}", config.summary());

    if let Err(e) = server::run_server(config).await {
        error!("Server error: {e:#}");
        return Err(e);
    }
    Ok(())
}
