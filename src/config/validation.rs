//! Configuration validation.
//!
//! Serde handles syntactic checks; this module covers semantic ones.
//! Validation is a pure function over the parsed config and returns all
//! errors found, not just the first.

use std::net::SocketAddr;

use crate::config::schema::AppConfig;

/// One semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Listener bind address is not a valid socket address.
    BindAddress(String),
    /// A host entry is unusable.
    Host { index: usize, problem: String },
    /// A streaming setting is out of range.
    Stream(String),
    /// A shutdown setting is out of range.
    Shutdown(String),
    /// A credential entry is unusable.
    BasicAuth { index: usize, problem: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::BindAddress(addr) => {
                write!(f, "invalid bind address {:?}", addr)
            }
            ValidationError::Host { index, problem } => {
                write!(f, "hosts[{}]: {}", index, problem)
            }
            ValidationError::Stream(problem) => write!(f, "stream: {}", problem),
            ValidationError::Shutdown(problem) => write!(f, "shutdown: {}", problem),
            ValidationError::BasicAuth { index, problem } => {
                write!(f, "basic_auth[{}]: {}", index, problem)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    for (index, host) in config.hosts.iter().enumerate() {
        if host.name.is_empty() {
            errors.push(ValidationError::Host {
                index,
                problem: "name must not be empty".to_string(),
            });
        }
        if host.addr.is_empty() {
            errors.push(ValidationError::Host {
                index,
                problem: "addr must not be empty".to_string(),
            });
        }
    }

    if config.stream.keepalive_secs == 0 {
        errors.push(ValidationError::Stream(
            "keepalive_secs must be greater than zero".to_string(),
        ));
    }

    if config.shutdown.grace_secs == 0 {
        errors.push(ValidationError::Shutdown(
            "grace_secs must be greater than zero".to_string(),
        ));
    }

    for (index, credentials) in config.basic_auth.iter().enumerate() {
        if credentials.username.is_empty() {
            errors.push(ValidationError::BasicAuth {
                index,
                problem: "username must not be empty".to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
