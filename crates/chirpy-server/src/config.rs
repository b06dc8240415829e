use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use chirpy_api::session::PLACEHOLDER_SECRETS;

/// Command-line flags. Everything else comes from the environment.
#[derive(Debug, Parser)]
#[command(name = "chirpy", about = "Chirpy social post server")]
pub struct Args {
    /// Delete the database file before starting
    #[arg(long)]
    pub debug: bool,
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub assets_dir: PathBuf,
    pub addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = lookup("CHIRPY_JWT_SECRET").unwrap_or_default();
        if jwt_secret.trim().is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("CHIRPY_JWT_SECRET is unset or still a placeholder");
        }

        let db_path = lookup("CHIRPY_DB_PATH").unwrap_or_else(|| "database.json".into());
        let assets_dir = lookup("CHIRPY_ASSETS_DIR").unwrap_or_else(|| "html".into());
        let host = lookup("CHIRPY_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = lookup("CHIRPY_PORT")
            .unwrap_or_else(|| "8080".into())
            .parse()
            .context("CHIRPY_PORT is not a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .context("CHIRPY_HOST is not an IP address")?;

        Ok(Self {
            jwt_secret,
            db_path: db_path.into(),
            assets_dir: assets_dir.into(),
            addr,
        })
    }
}
