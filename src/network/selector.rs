//! Reachable address selection
//!
//! Picks the single address most likely to be reachable by other machines:
//! a UPnP external address when a gateway cooperates, the explicit bind
//! address, or the most global looking local interface address.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use super::upnp::{DiscoveryError, PortMapping};
use crate::http::encode_uri_component;
use crate::logger;

/// How local an address is, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Locality {
    Global,
    /// 10/8, 172.16/12, 192.168/16, fc00::/7, fec0::/10
    Private,
    /// 169.254/16, fe80::/10
    AutoAssigned,
    /// 127/8, ::1
    Loopback,
}

impl Locality {
    pub fn classify(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(v4) => classify_v4(v4),
            IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
                Some(v4) => classify_v4(v4),
                None => classify_v6(v6),
            },
        }
    }
}

fn classify_v4(ip: Ipv4Addr) -> Locality {
    if ip.is_loopback() {
        Locality::Loopback
    } else if ip.is_link_local() {
        Locality::AutoAssigned
    } else if ip.is_private() {
        Locality::Private
    } else {
        Locality::Global
    }
}

fn classify_v6(ip: Ipv6Addr) -> Locality {
    let first = ip.segments()[0];
    if ip.is_loopback() {
        Locality::Loopback
    } else if first & 0xffc0 == 0xfe80 {
        Locality::AutoAssigned
    } else if first & 0xfe00 == 0xfc00 || first & 0xffc0 == 0xfec0 {
        Locality::Private
    } else {
        Locality::Global
    }
}

/// Interface scope ordinals, lower is more global
pub mod scope {
    pub const UNIVERSE: u8 = 0;
    pub const SITE: u8 = 200;
    pub const LINK: u8 = 253;
    pub const HOST: u8 = 254;
}

/// One local interface address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateAddress {
    pub ip: IpAddr,
    pub scope: u8,
}

impl CandidateAddress {
    pub fn new(ip: IpAddr, scope: u8) -> Self {
        Self { ip, scope }
    }

    pub fn locality(&self) -> Locality {
        Locality::classify(self.ip)
    }
}

/// Address family winning a locality and scope tie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FamilyPreference {
    #[default]
    Ipv6,
    Ipv4,
}

impl FamilyPreference {
    pub const fn from_prefer_ipv6(prefer_ipv6: bool) -> Self {
        if prefer_ipv6 {
            Self::Ipv6
        } else {
            Self::Ipv4
        }
    }

    fn rank(self, ip: IpAddr) -> u8 {
        match (self, ip) {
            (Self::Ipv6, IpAddr::V6(_)) | (Self::Ipv4, IpAddr::V4(_)) => 0,
            _ => 1,
        }
    }
}

/// Supplies the raw list of local interface addresses
pub trait InterfaceSource {
    fn addresses(&self) -> io::Result<Vec<CandidateAddress>>;
}

/// External address discovered through the gateway
#[derive(Debug)]
pub struct ExternalAddress {
    pub ip: IpAddr,
    /// Removed from the gateway when dropped
    pub mapping: Option<PortMapping>,
}

/// Asks the network gateway for an external address and a port mapping
pub trait ExternalDiscovery {
    fn discover(&self, port: u16) -> Result<ExternalAddress, DiscoveryError>;
}

/// Result of address selection
///
/// Keeps the UPnP port mapping alive; dropping it removes the mapping.
#[derive(Debug, Default)]
pub struct Advertised {
    pub address: Option<IpAddr>,
    mapping: Option<PortMapping>,
}

impl Advertised {
    pub const fn none() -> Self {
        Self {
            address: None,
            mapping: None,
        }
    }

    pub fn has_mapping(&self) -> bool {
        self.mapping.is_some()
    }

    /// `http[s]://address:port/[prefix/][single file]`
    pub fn url(&self, port: u16, tls: bool, prefix: Option<&str>, single: Option<&str>) -> Option<String> {
        self.address
            .map(|ip| advertised_url(ip, port, tls, prefix, single))
    }
}

pub fn advertised_url(
    ip: IpAddr,
    port: u16,
    tls: bool,
    prefix: Option<&str>,
    single: Option<&str>,
) -> String {
    let mut url = format!(
        "{}://{}/",
        if tls { "https" } else { "http" },
        SocketAddr::new(ip, port)
    );
    if let Some(prefix) = prefix {
        url.push_str(&encode_uri_component(prefix));
        url.push('/');
    }
    if let Some(name) = single {
        url.push_str(&encode_uri_component(name));
    }
    url
}

/// Startup address selection
pub struct AddressSelector<'a> {
    pub bind: IpAddr,
    pub port: u16,
    pub upnp: Option<&'a dyn ExternalDiscovery>,
    pub interfaces: &'a dyn InterfaceSource,
    pub family: FamilyPreference,
}

impl AddressSelector<'_> {
    /// UPnP first, then the explicit bind address, then the best interface
    ///
    /// Discovery failures are logged and fall through to the next tier.
    pub fn select(&self) -> Advertised {
        if let Some(upnp) = self.upnp {
            match upnp.discover(self.port) {
                Ok(external) => {
                    return Advertised {
                        address: Some(external.ip),
                        mapping: external.mapping,
                    }
                }
                Err(e) => logger::log_warning(&format!("UPnP: {e}")),
            }
        }

        if !self.bind.is_unspecified() {
            return Advertised {
                address: Some(self.bind),
                mapping: None,
            };
        }

        match self.interfaces.addresses() {
            Ok(candidates) => Advertised {
                address: best_candidate(&candidates, self.bind, self.family),
                mapping: None,
            },
            Err(e) => {
                logger::log_warning(&format!("Unable to enumerate network interfaces: {e}"));
                Advertised::none()
            }
        }
    }
}

/// Lowest (locality, scope, family rank); the first of equals wins
///
/// An IPv4 wildcard bind only considers IPv4 candidates, `::` considers both.
pub fn best_candidate(
    candidates: &[CandidateAddress],
    bind: IpAddr,
    family: FamilyPreference,
) -> Option<IpAddr> {
    candidates
        .iter()
        .filter(|c| bind.is_ipv6() || c.ip.is_ipv4())
        .min_by_key(|c| (c.locality(), c.scope, family.rank(c.ip)))
        .map(|c| c.ip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FakeInterfaces(io::Result<Vec<CandidateAddress>>);

    impl InterfaceSource for FakeInterfaces {
        fn addresses(&self) -> io::Result<Vec<CandidateAddress>> {
            match &self.0 {
                Ok(list) => Ok(list.clone()),
                Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
            }
        }
    }

    struct FakeGateway {
        external: Option<IpAddr>,
        calls: Cell<u32>,
    }

    impl ExternalDiscovery for FakeGateway {
        fn discover(&self, _port: u16) -> Result<ExternalAddress, DiscoveryError> {
            self.calls.set(self.calls.get() + 1);
            match self.external {
                Some(ip) => Ok(ExternalAddress { ip, mapping: None }),
                None => Err(DiscoveryError::LocalAddress(io::Error::other("no route"))),
            }
        }
    }

    fn universe(addrs: &[&str]) -> Vec<CandidateAddress> {
        addrs
            .iter()
            .map(|a| CandidateAddress::new(a.parse().unwrap(), scope::UNIVERSE))
            .collect()
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn select(bind: &str, upnp: Option<&dyn ExternalDiscovery>, interfaces: &FakeInterfaces) -> Option<IpAddr> {
        AddressSelector {
            bind: ip(bind),
            port: 8080,
            upnp,
            interfaces,
            family: FamilyPreference::Ipv6,
        }
        .select()
        .address
    }

    #[test]
    fn test_classify() {
        assert_eq!(Locality::classify(ip("127.0.0.1")), Locality::Loopback);
        assert_eq!(Locality::classify(ip("::1")), Locality::Loopback);
        assert_eq!(Locality::classify(ip("169.254.1.1")), Locality::AutoAssigned);
        assert_eq!(Locality::classify(ip("fe80::1")), Locality::AutoAssigned);
        assert_eq!(Locality::classify(ip("10.1.2.3")), Locality::Private);
        assert_eq!(Locality::classify(ip("172.16.0.1")), Locality::Private);
        assert_eq!(Locality::classify(ip("172.31.255.1")), Locality::Private);
        assert_eq!(Locality::classify(ip("192.168.1.5")), Locality::Private);
        assert_eq!(Locality::classify(ip("fd00::5")), Locality::Private);
        assert_eq!(Locality::classify(ip("::ffff:192.168.0.1")), Locality::Private);
        assert_eq!(Locality::classify(ip("172.32.0.1")), Locality::Global);
        assert_eq!(Locality::classify(ip("8.8.8.8")), Locality::Global);
        assert_eq!(Locality::classify(ip("2001:db8::1")), Locality::Global);
    }

    #[test]
    fn test_global_beats_private_and_loopback() {
        let interfaces = FakeInterfaces(Ok(universe(&["127.0.0.1", "192.168.1.5", "8.8.8.8"])));
        assert_eq!(select("0.0.0.0", None, &interfaces), Some(ip("8.8.8.8")));
    }

    #[test]
    fn test_auto_assigned_beats_loopback() {
        let interfaces = FakeInterfaces(Ok(universe(&["127.0.0.1", "169.254.1.1"])));
        assert_eq!(select("0.0.0.0", None, &interfaces), Some(ip("169.254.1.1")));
    }

    #[test]
    fn test_scope_breaks_locality_tie() {
        let candidates = vec![
            CandidateAddress::new(ip("10.0.0.1"), scope::LINK),
            CandidateAddress::new(ip("10.0.0.2"), scope::UNIVERSE),
        ];
        assert_eq!(
            best_candidate(&candidates, ip("0.0.0.0"), FamilyPreference::Ipv6),
            Some(ip("10.0.0.2"))
        );
    }

    #[test]
    fn test_family_breaks_full_tie() {
        let candidates = universe(&["8.8.8.8", "2001:db8::1"]);
        assert_eq!(
            best_candidate(&candidates, ip("::"), FamilyPreference::Ipv6),
            Some(ip("2001:db8::1"))
        );
        assert_eq!(
            best_candidate(&candidates, ip("::"), FamilyPreference::Ipv4),
            Some(ip("8.8.8.8"))
        );
    }

    #[test]
    fn test_ipv4_wildcard_ignores_ipv6() {
        let candidates = universe(&["127.0.0.1", "2001:db8::1"]);
        assert_eq!(
            best_candidate(&candidates, ip("0.0.0.0"), FamilyPreference::Ipv6),
            Some(ip("127.0.0.1"))
        );
        assert_eq!(best_candidate(&universe(&["::1"]), ip("0.0.0.0"), FamilyPreference::Ipv6), None);
    }

    #[test]
    fn test_explicit_bind_is_the_answer() {
        let interfaces = FakeInterfaces(Ok(universe(&["8.8.8.8"])));
        assert_eq!(select("192.168.1.5", None, &interfaces), Some(ip("192.168.1.5")));
    }

    #[test]
    fn test_upnp_wins_when_available() {
        let gateway = FakeGateway {
            external: Some(ip("203.0.113.7")),
            calls: Cell::new(0),
        };
        let interfaces = FakeInterfaces(Ok(universe(&["8.8.8.8"])));
        assert_eq!(select("0.0.0.0", Some(&gateway as &dyn ExternalDiscovery), &interfaces), Some(ip("203.0.113.7")));
        assert_eq!(gateway.calls.get(), 1);
    }

    #[test]
    fn test_failures_fall_through() {
        let gateway = FakeGateway {
            external: None,
            calls: Cell::new(0),
        };
        let interfaces = FakeInterfaces(Ok(universe(&["192.168.1.5"])));
        assert_eq!(select("0.0.0.0", Some(&gateway as &dyn ExternalDiscovery), &interfaces), Some(ip("192.168.1.5")));

        let broken = FakeInterfaces(Err(io::Error::new(io::ErrorKind::Other, "netlink")));
        assert_eq!(select("0.0.0.0", Some(&gateway as &dyn ExternalDiscovery), &broken), None);
        assert_eq!(select("0.0.0.0", None, &FakeInterfaces(Ok(Vec::new()))), None);
    }

    #[test]
    fn test_advertised_url() {
        assert_eq!(
            advertised_url(ip("192.168.1.5"), 8080, false, None, None),
            "http://192.168.1.5:8080/"
        );
        assert_eq!(
            advertised_url(ip("2001:db8::1"), 443, true, Some("share"), Some("a b.txt")),
            "https://[2001:db8::1]:443/share/a%20b.txt"
        );
        assert_eq!(
            advertised_url(ip("10.0.0.2"), 8080, false, Some("my share"), None),
            "http://10.0.0.2:8080/my%20share/"
        );
        assert_eq!(Advertised::none().url(80, false, None, None), None);
    }
}
