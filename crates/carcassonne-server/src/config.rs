//! Server configuration read from the environment.
//!
//! - `SERVER_ADDR`: listen address (default `0.0.0.0:8080`)
//! - `RUST_LOG`: tracing filter (default `info`)
//! - `TILE_CATALOG`: path to a JSON tile catalog (default: the standard tiles)

use anyhow::Context;
use carcassonne_core::TileCatalog;
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub log_filter: String,
    pub catalog_path: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let addr = lookup("SERVER_ADDR").unwrap_or_else(|| DEFAULT_ADDR.into());
        let addr = addr
            .parse()
            .with_context(|| format!("invalid SERVER_ADDR {addr:?}"))?;

        Ok(Self {
            addr,
            log_filter: lookup("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.into()),
            catalog_path: lookup("TILE_CATALOG").map(PathBuf::from),
        })
    }

    /// The configured catalog, or the standard one
    pub fn load_catalog(&self) -> anyhow::Result<TileCatalog> {
        let Some(path) = &self.catalog_path else {
            return Ok(TileCatalog::standard());
        };
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading tile catalog {}", path.display()))?;
        TileCatalog::from_json(&json)
            .with_context(|| format!("loading tile catalog {}", path.display()))
    }
}
