mod consul;

pub use consul::ConsulClient;

use std::fmt;
use thiserror::Error;

use crate::error::{Error, Result};

/// A single key and its raw value as returned by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvEntry {
    pub key: String,
    pub value: Vec<u8>,
}

impl KvEntry {
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP {code} from {url}")]
    Status { code: u16, url: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    Decode(String),
}

/// Read access to a hierarchical key-value store
pub trait KvStore {
    /// All keys and values under `prefix`, recursively
    fn list(&self, prefix: &str) -> std::result::Result<Vec<KvEntry>, StoreError>;

    /// Key names one level below `prefix`, bounded by `separator`
    fn keys(&self, prefix: &str, separator: &str)
        -> std::result::Result<Vec<String>, StoreError>;
}

/// HTTP basic auth credentials
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl BasicAuth {
    /// Parse a `user:pass` string
    pub fn parse(auth: &str) -> Result<Self> {
        let parts: Vec<&str> = auth.split(':').collect();
        if parts.len() != 2 {
            return Err(Error::Configuration(String::from(
                "Invalid AUTH string specified.",
            )));
        }

        Ok(Self {
            username: parts[0].to_string(),
            password: parts[1].to_string(),
        })
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

pub struct Config {
    pub address: String,
    pub token: Option<String>,
    pub auth: Option<BasicAuth>,
    pub ssl: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("address", &self.address)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("auth", &self.auth)
            .field("ssl", &self.ssl)
            .finish()
    }
}

impl Config {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            token: None,
            auth: None,
            ssl: false,
        }
    }

    pub fn scheme(&self) -> &'static str {
        if self.ssl {
            "https"
        } else {
            "http"
        }
    }

    /// Base URL of the HTTP API, without a trailing slash
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme(), self.address.trim_end_matches('/'))
    }
}
