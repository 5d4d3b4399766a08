//! Error types for the reconciliation engine
//!
//! Every failure is local to one domain and record type. Errors carry a
//! human-readable message that ends up in the pass outcome and the log line.

use thiserror::Error;

/// Result type alias for reconciliation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the reconciliation engine
#[derive(Error, Debug)]
pub enum Error {
    /// Network, connect or timeout failure talking to a provider
    #[error("Transport error ({provider}): {message}")]
    Transport {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Response body does not match the expected envelope
    #[error("Decode error ({provider}): {message}")]
    Decode {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Response decoded but carries an explicit provider error
    #[error("Vendor error ({provider}): [{code}] {message}")]
    Vendor {
        /// Provider name
        provider: String,
        /// Provider error code, verbatim
        code: String,
        /// Provider error message, verbatim
        message: String,
    },

    /// No hosting zone exists for the root domain
    #[error("Zone not found for root domain: {0}")]
    ZoneNotFound(String),

    /// Request signing failed
    #[error("Signing error: {0}")]
    Signing(String),

    /// IP source-related errors
    #[error("IP source error: {0}")]
    IpSource(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors (config files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors outside provider envelopes
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a transport error
    pub fn transport(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a vendor error
    pub fn vendor(
        provider: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Vendor {
            provider: provider.into(),
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a signing error
    pub fn signing(msg: impl Into<String>) -> Self {
        Self::Signing(msg.into())
    }

    /// Create an IP source error
    pub fn ip_source(msg: impl Into<String>) -> Self {
        Self::IpSource(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Map a reqwest failure onto the transport/decode split
    pub fn from_reqwest(provider: &str, err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::decode(provider, err.to_string())
        } else if err.is_timeout() {
            Self::transport(provider, format!("request timed out: {err}"))
        } else {
            Self::transport(provider, err.to_string())
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_error_keeps_code_and_message_verbatim() {
        let err = Error::vendor("trafficroute", "InvalidParameter.Host", "主机记录不合法");
        assert_eq!(
            err.to_string(),
            "Vendor error (trafficroute): [InvalidParameter.Host] 主机记录不合法"
        );
    }

    #[test]
    fn zone_not_found_names_root_domain() {
        let err = Error::ZoneNotFound("example.org".to_string());
        assert!(err.to_string().contains("example.org"));
    }

    #[test]
    fn anyhow_converts_to_other() {
        let err: Error = anyhow::anyhow!("boom").into();
        assert!(matches!(err, Error::Other(ref m) if m == "boom"));
    }
}
