use thiserror::Error;

use crate::store::StoreError;

/// Exit status for malformed configuration such as a bad `--auth` value
pub const EXIT_CONFIGURATION: i32 = 132;

/// Exit status for any failed query against the KV store
pub const EXIT_STORE_QUERY: i32 = 133;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Query for '{prefix}' failed: {source}")]
    StoreQuery {
        prefix: String,
        #[source]
        source: StoreError,
    },

    #[error("Error creating JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Process exit status for this kind of failure
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Configuration(_) => EXIT_CONFIGURATION,
            Error::StoreQuery { .. } => EXIT_STORE_QUERY,
            // output::emit reports JSON failures on stderr and keeps going,
            // so Serialization never ends the process in practice
            Error::Serialization(_) | Error::Io(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_per_kind() {
        let config = Error::Configuration(String::from("bad auth"));
        let query = Error::StoreQuery {
            prefix: String::from("svc"),
            source: StoreError::Transport(String::from("connection refused")),
        };

        assert_eq!(config.exit_code(), 132);
        assert_eq!(query.exit_code(), 133);
    }

    #[test]
    fn test_store_query_message_names_prefix() {
        let err = Error::StoreQuery {
            prefix: String::from("app/web"),
            source: StoreError::Transport(String::from("timed out")),
        };

        let message = err.to_string();
        assert!(message.contains("app/web"));
        assert!(message.contains("timed out"));
    }

    #[test]
    fn test_non_fatal_kinds_use_generic_exit_code() {
        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");

        assert_eq!(Error::from(json).exit_code(), 1);
        assert_eq!(Error::from(io).exit_code(), 1);
    }
}
