//! UPnP gateway discovery and port forwarding

use igd_next::{
    AddPortError, Gateway, GetExternalIpError, PortMappingProtocol, SearchError, SearchOptions,
};
use std::fmt;
use std::io;
use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::time::Duration;
use thiserror::Error;

use super::selector::{ExternalAddress, ExternalDiscovery};
use crate::logger;

const MAPPING_DESCRIPTION: &str = "Pretty small HTTP server";

/// Lease duration in seconds, 0 means until removed
const LEASE_DURATION: u32 = 0;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("gateway search failed: {0}")]
    Search(#[from] SearchError),
    #[error("unable to determine the LAN address facing the gateway: {0}")]
    LocalAddress(#[from] io::Error),
    #[error("the LAN address {0} cannot be forwarded to")]
    UnsupportedLocalAddress(IpAddr),
    #[error("port mapping failed: {0}")]
    AddPort(#[from] AddPortError),
    #[error("unable to get the external address: {0}")]
    ExternalIp(#[from] GetExternalIpError),
}

/// Searches the LAN for an Internet Gateway Device
pub struct UpnpDiscovery {
    pub timeout: Duration,
}

impl UpnpDiscovery {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn search(&self) -> Result<Gateway, DiscoveryError> {
        let options = SearchOptions {
            timeout: Some(self.timeout),
            ..Default::default()
        };
        Ok(igd_next::search_gateway(options)?)
    }
}

impl ExternalDiscovery for UpnpDiscovery {
    fn discover(&self, port: u16) -> Result<ExternalAddress, DiscoveryError> {
        let gateway = self.search()?;
        let local_ip = local_address_towards(gateway.addr)?;
        if !local_ip.is_ipv4() {
            return Err(DiscoveryError::UnsupportedLocalAddress(local_ip));
        }

        gateway.add_port(
            PortMappingProtocol::TCP,
            port,
            SocketAddr::new(local_ip, port),
            LEASE_DURATION,
            MAPPING_DESCRIPTION,
        )?;
        let mapping = PortMapping { gateway, port };

        // The mapping guard removes the forward if the address query fails
        let ip = mapping.gateway.get_external_ip()?;
        logger::log_info(&format!("UPnP: forwarded port {port} to {local_ip}"));

        Ok(ExternalAddress {
            ip,
            mapping: Some(mapping),
        })
    }
}

/// Local address the kernel would use to reach `remote`
fn local_address_towards(remote: SocketAddr) -> io::Result<IpAddr> {
    let bind: SocketAddr = if remote.is_ipv4() {
        (std::net::Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
    };
    let socket = UdpSocket::bind(bind)?;
    socket.connect(remote)?;
    Ok(socket.local_addr()?.ip())
}

/// Active TCP port forward, removed from the gateway on drop
pub struct PortMapping {
    gateway: Gateway,
    port: u16,
}

impl fmt::Debug for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortMapping")
            .field("gateway", &self.gateway.addr)
            .field("port", &self.port)
            .finish()
    }
}

impl Drop for PortMapping {
    fn drop(&mut self) {
        match self.gateway.remove_port(PortMappingProtocol::TCP, self.port) {
            Ok(()) => logger::log_info(&format!("UPnP: removed port mapping {}", self.port)),
            Err(e) => logger::log_warning(&format!(
                "UPnP: unable to remove port mapping {}: {e}",
                self.port
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_address_towards_loopback() {
        let ip = local_address_towards("127.0.0.1:1900".parse().unwrap()).unwrap();
        assert!(ip.is_loopback());
    }

    #[test]
    fn test_unsupported_local_address_message() {
        let err = DiscoveryError::UnsupportedLocalAddress("fe80::1".parse().unwrap());
        assert_eq!(err.to_string(), "the LAN address fe80::1 cannot be forwarded to");
    }
}
