use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://books.db";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

/// Server settings read from the environment at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub cors_origin: String,
}

impl Config {
    /// Loads `.env` when present, then reads the process environment.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup("PORT") {
            Some(p) => p.trim().parse::<u16>().with_context(|| format!("PORT must be a port number, got {p:?}"))?,
            None => DEFAULT_PORT,
        };
        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            host: host.trim().parse::<IpAddr>().with_context(|| format!("HOST must be an IP address, got {host:?}"))?,
            port,
            cors_origin: lookup("CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
        })
    }

    pub fn addr(&self) -> SocketAddr { SocketAddr::new(self.host, self.port) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let c = config(&[]).unwrap();
        assert_eq!(c.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(c.addr().to_string(), "127.0.0.1:3001");
        assert_eq!(c.cors_origin, DEFAULT_CORS_ORIGIN);
    }

    #[test]
    fn reads_overrides() {
        let c = config(&[("PORT", "8080"), ("HOST", "0.0.0.0"), ("DATABASE_URL", "sqlite::memory:")]).unwrap();
        assert_eq!(c.addr().to_string(), "0.0.0.0:8080");
        assert_eq!(c.database_url, "sqlite::memory:");
    }

    #[test]
    fn rejects_bad_port() {
        assert!(config(&[("PORT", "eighty")]).is_err());
        assert!(config(&[("PORT", "70000")]).is_err());
    }
}
