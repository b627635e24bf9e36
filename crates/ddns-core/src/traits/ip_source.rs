// # IP Source Trait
//
// Defines the interface for discovering the host's current public IP address.
//
// ## Implementations
//
// - HTTP lookup services with ordered fallback: `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     // Resolve once per cycle; never cache across cycles
//     let current_ip = source.current().await?;
//     println!("public IP: {}", current_ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for IP source implementations
///
/// # Trust Level: Semi-Trusted
///
/// ## Allowed Capabilities
/// - ✅ Perform outbound requests to lookup services
/// - ✅ Fall back across several services within one call
///
/// ## Forbidden Capabilities
/// - ❌ Perform DNS updates (use `DnsProvider`)
/// - ❌ Cache the address between calls (each cycle resolves afresh)
/// - ❌ Retry the same service (the next service is the retry)
/// - ❌ Make decisions about when to update DNS
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public IP address
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The current IP address
    /// - `Err(Error::NotFound)`: If every lookup failed; callers skip the cycle
    async fn current(&self) -> Result<IpAddr, crate::Error>;
}
