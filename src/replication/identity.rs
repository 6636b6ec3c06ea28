//! Host identity for replication
//!
//! Both sides need a stable, distinct `server_id`; the slave also reports
//! an address so the master's slave listing can show it.

use std::net::{IpAddr, ToSocketAddrs};

use sha2::{Digest, Sha256};

/// Upper bound (exclusive) for `server_id`
const SERVER_ID_MODULUS: u64 = 4_294_967_295;

/// Name and address this container is known by
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIdentity {
    /// Host name
    pub hostname: String,
    /// Address other hosts reach us by
    pub address: String,
}

impl HostIdentity {
    /// Identity with explicit values
    pub fn new(hostname: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            address: address.into(),
        }
    }

    /// Identity of the running host
    ///
    /// The address is the first non-loopback address the host name
    /// resolves to, or the host name itself.
    pub fn detect() -> Self {
        let hostname = nix::unistd::gethostname()
            .ok()
            .and_then(|name| name.into_string().ok())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "localhost".to_string());

        let address = (hostname.as_str(), 0)
            .to_socket_addrs()
            .ok()
            .and_then(|addrs| {
                addrs
                    .map(|addr| addr.ip())
                    .find(|ip| !ip.is_loopback() && matches!(ip, IpAddr::V4(_)))
            })
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| hostname.clone());

        Self { hostname, address }
    }

    /// Deterministic non-zero server id derived from the host name
    pub fn server_id(&self) -> u64 {
        let digest = Sha256::digest(self.hostname.as_bytes());
        let mut prefix = [0u8; 8];
        prefix[1..].copy_from_slice(&digest[..7]);
        let id = u64::from_be_bytes(prefix) % SERVER_ID_MODULUS;
        if id == 0 {
            1
        } else {
            id
        }
    }
}
