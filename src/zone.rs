use crate::dns_parser::{Message, Name, QueryClass, RRData};
use std::fmt;
use std::net::Ipv4Addr;
use std::slice;

/// IANA root hints
const ROOT_HINTS: [(&str, [u8; 4]); 13] = [
    ("a.root-servers.net", [198, 41, 0, 4]),
    ("b.root-servers.net", [170, 247, 170, 2]),
    ("c.root-servers.net", [192, 33, 4, 12]),
    ("d.root-servers.net", [199, 7, 91, 13]),
    ("e.root-servers.net", [192, 203, 230, 10]),
    ("f.root-servers.net", [192, 5, 5, 241]),
    ("g.root-servers.net", [192, 112, 36, 4]),
    ("h.root-servers.net", [198, 97, 190, 53]),
    ("i.root-servers.net", [192, 36, 148, 17]),
    ("j.root-servers.net", [192, 58, 128, 30]),
    ("k.root-servers.net", [193, 0, 14, 129]),
    ("l.root-servers.net", [199, 7, 83, 42]),
    ("m.root-servers.net", [202, 12, 27, 33]),
];

/// A delegation target
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Nameserver {
    pub hostname: Name,
    pub addr: Ipv4Addr,
}

impl Nameserver {
    pub fn new(hostname: Name, addr: Ipv4Addr) -> Nameserver {
        Nameserver { hostname, addr }
    }
}

impl fmt::Display for Nameserver {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}({})", self.hostname, self.addr)
    }
}

/// The nameservers currently believed to serve a query
///
/// Insertion order is kept and duplicates are dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Zone {
    nameservers: Vec<Nameserver>,
}

impl Zone {
    pub fn new() -> Zone {
        Zone::default()
    }

    /// The 13 root servers
    pub fn root() -> Zone {
        ROOT_HINTS
            .iter()
            .map(|&(hostname, addr)| {
                let hostname = hostname.parse().expect("root hint is a valid name");
                Nameserver::new(hostname, Ipv4Addr::from(addr))
            })
            .collect()
    }

    /// Builds the zone a referral points at
    ///
    /// Every IN class NS record of the authority section is paired with the
    /// IN class A records of the additional section named after its target.
    /// NS records without such glue are skipped.
    pub fn from_referral(message: &Message) -> Zone {
        let mut zone = Zone::new();
        let targets = message
            .nameservers
            .iter()
            .filter(|rr| rr.cls == QueryClass::IN)
            .filter_map(|rr| match rr.data {
                RRData::NS(ref target) => Some(target),
                _ => None,
            });

        for target in targets {
            for glue in message.additional.iter() {
                match glue.data {
                    RRData::A(addr) if glue.cls == QueryClass::IN && glue.name == *target => {
                        zone.insert(Nameserver::new(target.clone(), addr));
                    }
                    _ => (),
                }
            }
        }

        zone
    }

    /// Adds `nameserver` unless it's already present
    pub fn insert(&mut self, nameserver: Nameserver) -> bool {
        if self.nameservers.contains(&nameserver) {
            return false;
        }
        self.nameservers.push(nameserver);
        true
    }

    pub fn len(&self) -> usize {
        self.nameservers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nameservers.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<Nameserver> {
        self.nameservers.iter()
    }
}

impl std::iter::FromIterator<Nameserver> for Zone {
    fn from_iter<I: IntoIterator<Item = Nameserver>>(iter: I) -> Zone {
        let mut zone = Zone::new();
        for nameserver in iter {
            zone.insert(nameserver);
        }
        zone
    }
}

impl<'a> IntoIterator for &'a Zone {
    type Item = &'a Nameserver;
    type IntoIter = slice::Iter<'a, Nameserver>;

    fn into_iter(self) -> Self::IntoIter {
        self.nameservers.iter()
    }
}
