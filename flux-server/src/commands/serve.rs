//! Serve command - run the HTTP API

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use flux_core::adapters::memory::MemoryStore;
use flux_core::config::Config;
use flux_core::FluxContext;

use super::get_context;
use crate::{api, output};

pub struct ServeOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub static_dir: Option<PathBuf>,
    pub memory: bool,
}

pub fn run(data_dir: &Path, options: ServeOptions) -> Result<()> {
    let ctx = if options.memory {
        output::warning("Using in-memory storage; data is discarded on exit");
        let config = Config::load(data_dir)?;
        FluxContext::with_store(config, Arc::new(MemoryStore::with_schema()))
    } else {
        get_context(data_dir)?
    };

    let host = options.host.unwrap_or_else(|| ctx.config.host.clone());
    let port = options.port.unwrap_or(ctx.config.port);
    let static_dir = options
        .static_dir
        .unwrap_or_else(|| ctx.config.static_dir.clone());

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

    if !static_dir.join("index.html").exists() {
        output::warning(&format!(
            "No index.html in {}; only the API will be useful",
            static_dir.display()
        ));
    }
    output::info(&format!(
        "Storage: {} | Listening on http://{}",
        ctx.repository.backend(),
        addr
    ));

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(api::serve(ctx, addr, &static_dir))
}
