//! Local interface enumeration

use if_addrs::Interface;
use std::io;
use std::net::IpAddr;

use super::selector::{scope, CandidateAddress, InterfaceSource};

/// Reads interface addresses from the operating system
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemInterfaces;

impl InterfaceSource for SystemInterfaces {
    fn addresses(&self) -> io::Result<Vec<CandidateAddress>> {
        Ok(if_addrs::get_if_addrs()?
            .iter()
            .map(candidate)
            .collect())
    }
}

fn candidate(iface: &Interface) -> CandidateAddress {
    let ip = iface.ip();
    CandidateAddress::new(ip, address_scope(ip, iface.is_loopback()))
}

/// Scope the kernel assigns to an address of this kind
fn address_scope(ip: IpAddr, loopback_interface: bool) -> u8 {
    match ip {
        _ if loopback_interface || ip.is_loopback() => scope::HOST,
        IpAddr::V6(v6) if v6.segments()[0] & 0xffc0 == 0xfe80 => scope::LINK,
        IpAddr::V6(v6) if v6.segments()[0] & 0xffc0 == 0xfec0 => scope::SITE,
        _ => scope::UNIVERSE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_scope() {
        let ip = |s: &str| s.parse::<IpAddr>().unwrap();
        assert_eq!(address_scope(ip("127.0.0.1"), true), scope::HOST);
        assert_eq!(address_scope(ip("::1"), false), scope::HOST);
        assert_eq!(address_scope(ip("fe80::1"), false), scope::LINK);
        assert_eq!(address_scope(ip("fec0::1"), false), scope::SITE);
        assert_eq!(address_scope(ip("192.168.1.5"), false), scope::UNIVERSE);
        assert_eq!(address_scope(ip("2001:db8::1"), false), scope::UNIVERSE);
    }

    #[test]
    fn test_system_interfaces_enumerate() {
        // Every test host has at least a loopback interface
        if let Ok(addresses) = SystemInterfaces.addresses() {
            assert!(addresses.iter().all(|c| c.scope <= scope::HOST));
        }
    }
}
