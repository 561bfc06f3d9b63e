//! Target resolution for the command-line tools.

use std::io;
use std::net::IpAddr;

use crate::args::IpFamily;

/// Resolves `address` to an IP of the requested family. A literal containing
/// a colon counts as IPv6, mirroring the classic `-a` parsing; anything that
/// is not a literal goes through the system resolver.
pub fn resolve_target(address: &str, family: Option<IpFamily>) -> io::Result<IpAddr> {
    let family = family.or_else(|| address.contains(':').then_some(IpFamily::V6));

    if let Ok(ip) = address.parse::<IpAddr>() {
        return match family {
            Some(IpFamily::V4) if !ip.is_ipv4() => Err(family_mismatch(address)),
            Some(IpFamily::V6) if !ip.is_ipv6() => Err(family_mismatch(address)),
            _ => Ok(ip),
        };
    }

    let addresses = dns_lookup::lookup_host(address)?;
    addresses
        .into_iter()
        .find(|ip| match family {
            Some(IpFamily::V4) => ip.is_ipv4(),
            Some(IpFamily::V6) => ip.is_ipv6(),
            None => true,
        })
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no usable address for {}", address),
            )
        })
}

fn family_mismatch(address: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("{} does not match the requested family", address),
    )
}
