use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Every flag can also come from the environment (or a `.env` file).
#[derive(Debug, Clone, Parser)]
#[command(
    name = "torneo",
    version,
    about = "Tournament backend: venues, teams, fixtures, results and standings"
)]
pub struct ServerConfig {
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    #[arg(long, env = "TORNEO_BIND", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,

    #[arg(long, env = "TORNEO_DB", default_value = "torneo.db")]
    pub db: PathBuf,

    #[arg(long, env = "TORNEO_UPLOADS_DIR", default_value = "uploads")]
    pub uploads_dir: PathBuf,

    /// Directory holding the browser client; `index.html` is the fallback page.
    #[arg(long, env = "TORNEO_STATIC_DIR", default_value = ".")]
    pub static_dir: PathBuf,

    #[arg(long, env = "TORNEO_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    #[arg(long, env = "TORNEO_LOG_JSON", default_value_t = false)]
    pub log_json: bool,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_upload_bytes == 0 {
            return Err(anyhow!("max upload size must be greater than zero"));
        }
        if self.db.as_os_str().is_empty() {
            return Err(anyhow!("database path must not be empty"));
        }
        if self.uploads_dir.as_os_str().is_empty() {
            return Err(anyhow!("uploads directory must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_legacy_server() {
        let config = ServerConfig::try_parse_from(["torneo"]).expect("defaults parse");
        assert_eq!(config.db, PathBuf::from("torneo.db"));
        assert_eq!(config.uploads_dir, PathBuf::from("uploads"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_upload_limit_is_rejected() {
        let config = ServerConfig::try_parse_from(["torneo", "--max-upload-bytes", "0", "--port", "8080"])
            .expect("flags parse");
        assert_eq!(config.socket_addr().port(), 8080);
        assert!(config.validate().is_err());
    }
}
