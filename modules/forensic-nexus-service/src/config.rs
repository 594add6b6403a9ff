use std::env;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 9103;
pub const DEFAULT_DB_PATH: &str = "./forensic_nexus.db";
pub const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub db_path: String,
    /// Page size for `GET /api/memory` when the caller gives none
    pub page_size: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            db_path: DEFAULT_DB_PATH.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unparsable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("FORENSIC_NEXUS_HOST").unwrap_or(defaults.host),
            port: lookup("FORENSIC_NEXUS_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            db_path: lookup("FORENSIC_NEXUS_DB_PATH").unwrap_or(defaults.db_path),
            page_size: lookup("FORENSIC_NEXUS_PAGE_SIZE")
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.page_size),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
