//! Error types for the gateway host.
//!
//! Frame decoding never produces errors: malformed input degrades to an
//! `Unrecognized` outcome and the stream resynchronises on the next marker.
//! The errors here cover what sits around the core: transports, the
//! coordinating task, configuration and hex-text input.
//!
//! ## Error Categories
//!
//! - **Transport Errors**: A byte source failed to bind or receive
//! - **Closed**: The gateway task is gone and can no longer accept bytes
//! - **Queue Full**: A non-blocking submission found the submission queue full
//! - **Config Errors**: Invalid gateway configuration
//! - **Parse Errors**: Input that is not even well-formed transport text
//! - **I/O Errors**: Underlying operating system failures
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use reelgate::GatewayError;
//!
//! let error = GatewayError::transport_failed("udp recv failed");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use thiserror::Error;

/// Result type alias for gateway operations.
pub type Result<T, E = GatewayError> = std::result::Result<T, E>;

/// Main error type for gateway operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GatewayError {
    #[error("Transport failure: {reason}")]
    Transport {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Gateway is closed")]
    Closed,

    #[error("Submission queue is full ({capacity} chunks)")]
    QueueFull { capacity: usize },

    #[error("Invalid configuration: {field}: {reason}")]
    Config { field: String, reason: String },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Transport { .. } => true,
            GatewayError::Io(_) => true,
            GatewayError::Closed => false,
            GatewayError::QueueFull { .. } => true,
            GatewayError::Config { .. } => false,
            GatewayError::Parse { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            GatewayError::Transport { .. } => vec![
                "Check the reel is powered and cabled",
                "Verify the listen address or device path",
                "Check no other process holds the port",
            ],
            GatewayError::Closed => vec![
                "Keep the Gateway alive while submitting bytes",
                "Create a new Gateway after shutdown",
            ],
            GatewayError::QueueFull { .. } => vec![
                "Use the awaiting submit_bytes to wait for capacity",
                "Raise submission_capacity in the gateway configuration",
            ],
            GatewayError::Config { .. } => vec![
                "Check the configuration file against the documented fields",
                "Use non-zero intervals and capacities",
            ],
            GatewayError::Parse { .. } => vec![
                "Check the transport delivers hexadecimal text",
                "Submit raw bytes instead of text when possible",
            ],
            GatewayError::Io(_) => vec![
                "Check operating system permissions",
                "Verify system resources availability",
            ],
        }
    }

    /// Helper constructor for transport failures.
    pub fn transport_failed(reason: impl Into<String>) -> Self {
        GatewayError::Transport { reason: reason.into(), source: None }
    }

    /// Helper constructor for transport failures with source.
    pub fn transport_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        GatewayError::Transport { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for configuration errors.
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        GatewayError::Config { field: field.into(), reason: reason.into() }
    }

    /// Helper constructor for parse errors.
    pub fn parse_error(context: impl Into<String>, details: impl Into<String>) -> Self {
        GatewayError::Parse { context: context.into(), details: details.into() }
    }
}

impl From<hex::FromHexError> for GatewayError {
    fn from(err: hex::FromHexError) -> Self {
        GatewayError::Parse { context: "hex transport text".to_string(), details: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn error_messages_carry_their_context(
            reason in ".*",
            field in "\\w+",
            details in ".*"
        ) {
            let transport = GatewayError::transport_failed(reason.clone());
            prop_assert!(transport.to_string().contains(&reason));

            let config = GatewayError::invalid_config(field.clone(), reason.clone());
            let config_msg = config.to_string();
            prop_assert!(config_msg.contains(&field));
            prop_assert!(config_msg.contains(&reason));

            let parse = GatewayError::parse_error("hex", details.clone());
            prop_assert!(parse.to_string().contains(&details));
        }

        #[test]
        fn source_chain_preserves_base_message(base_message in ".+") {
            let base: Box<dyn std::error::Error + Send + Sync> =
                Box::new(std::io::Error::other(base_message.clone()));
            let top = GatewayError::transport_failed_with_source("bind failed", base);

            let source = std::error::Error::source(&top);
            prop_assert!(source.is_some());
            prop_assert!(source.map(|s| s.to_string().contains(&base_message)).unwrap_or(false));
        }
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<GatewayError>();

        let error = GatewayError::Closed;
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn recovery_methods_work() {
        let transport = GatewayError::transport_failed("recv");
        let closed = GatewayError::Closed;
        let config = GatewayError::invalid_config("sweep_interval_ms", "must be non-zero");
        let full = GatewayError::QueueFull { capacity: 8 };

        assert!(transport.is_retryable());
        assert!(!closed.is_retryable());
        assert!(!config.is_retryable());
        assert!(full.is_retryable());
        assert!(full.to_string().contains('8'));

        for error in [&transport, &closed, &config, &full] {
            let suggestions = error.recovery_suggestions();
            assert!(!suggestions.is_empty());
            assert!(suggestions.iter().all(|s| s.len() > 5));
        }
    }

    #[test]
    fn from_conversions_work() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        let err: GatewayError = io_err.into();
        assert!(matches!(err, GatewayError::Io(_)));
        assert!(err.to_string().contains("port taken"));

        let hex_err = hex::decode("zz").unwrap_err();
        let err: GatewayError = hex_err.into();
        assert!(matches!(err, GatewayError::Parse { .. }));
    }
}
