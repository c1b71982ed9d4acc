//! Shared HTTP client factory.
//!
//! Provides consistent HTTP client configuration for the catalog and chat calls.

use crate::error::FreeChatError;
use reqwest::Client;
use std::time::Duration;

/// Timeout for the model catalog call (15 seconds).
pub const CATALOG_TIMEOUT: Duration = Duration::from_secs(15);

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("freechat/", env!("CARGO_PKG_VERSION"));

/// Create a new HTTP client with a custom timeout.
pub fn create_client_with_timeout(timeout: Duration) -> Result<Client, FreeChatError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| FreeChatError::UpstreamError(format!("failed to create HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_client_with_timeout_accepts_custom_timeout() {
        assert!(create_client_with_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn user_agent_carries_version() {
        assert!(USER_AGENT.starts_with("freechat/"));
    }
}
