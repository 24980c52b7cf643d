//! Structured logging setup for hosts embedding the transform service.
//!
//! # Telemetry invariants
//!
//! - **No plaintext, ciphertext, or key material** appears in any event emitted
//!   by this crate. Events carry the field key and the decision taken.
//! - `RUST_LOG` overrides the configured level.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Initialise a global JSON tracing subscriber at `log_level`.
///
/// Hosts that already install their own subscriber should skip this; events
/// from this crate flow into whichever subscriber is active.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been set.
pub fn init(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise tracing subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_fails() {
        // Nothing else in this test binary installs a global subscriber.
        assert!(init("debug").is_ok());
        assert!(init("debug").is_err());
    }
}
