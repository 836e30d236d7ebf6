//! Network discovery module
//!
//! Works out which address to show the operator so that other machines can
//! reach the server.

pub mod interfaces;
pub mod selector;
pub mod upnp;

pub use interfaces::SystemInterfaces;
pub use selector::{AddressSelector, Advertised, ExternalDiscovery, FamilyPreference};
pub use upnp::UpnpDiscovery;

use crate::config::Config;
use std::net::IpAddr;
use std::time::Duration;

/// Run address selection with the system interface list and, when
/// enabled, a UPnP gateway
pub fn discover_address(config: &Config, bind: IpAddr) -> Advertised {
    let upnp = UpnpDiscovery::new(Duration::from_millis(config.network.discovery_timeout_ms));
    AddressSelector {
        bind,
        port: config.server.port,
        upnp: config
            .network
            .upnp
            .then_some(&upnp as &dyn ExternalDiscovery),
        interfaces: &SystemInterfaces,
        family: FamilyPreference::from_prefer_ipv6(config.network.prefer_ipv6),
    }
    .select()
}
