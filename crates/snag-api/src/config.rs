//! Server configuration from the environment.

use std::net::SocketAddr;

/// Runtime configuration for `snagd`. Every value has a development
/// default; the environment overrides, and command-line flags override
/// the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds.
    pub bind: SocketAddr,
    /// PostgreSQL connection string. The in-memory store is used when
    /// absent.
    pub database_url: Option<String>,
    /// Directory for attachment blobs.
    pub upload_dir: String,
    /// Accept the X-User-Id / X-Roles development identity headers.
    pub dev_auth: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port: u16 = match std::env::var("SNAG_PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid SNAG_PORT: {raw:?}"))?,
            Err(_) => 4000,
        };
        let dev_auth = match std::env::var("SNAG_DEV_AUTH") {
            Ok(raw) => raw != "false" && raw != "0",
            Err(_) => true,
        };
        Ok(Self {
            bind: SocketAddr::from(([0, 0, 0, 0], port)),
            database_url: std::env::var("SNAG_DATABASE_URL").ok().filter(|s| !s.is_empty()),
            upload_dir: std::env::var("SNAG_UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            dev_auth,
        })
    }
}
