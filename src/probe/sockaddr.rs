//! Conversion between `IpAddr` and the C socket address union.

#![cfg(unix)]

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

pub union SockAddr {
    sa: libc::sockaddr,
    sin: libc::sockaddr_in,
    sin6: libc::sockaddr_in6,
}

impl Default for SockAddr {
    fn default() -> Self {
        SockAddr {
            sa: unsafe { std::mem::zeroed() },
        }
    }
}

impl SockAddr {
    pub fn family(&self) -> libc::sa_family_t {
        unsafe { self.sa.sa_family }
    }

    /// The carried address, if the family is one we speak.
    pub fn ip(&self) -> Option<IpAddr> {
        match libc::c_int::from(self.family()) {
            libc::AF_INET => {
                let sin = unsafe { &self.sin };
                Some(IpAddr::V4(Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr))))
            }
            libc::AF_INET6 => {
                let sin6 = unsafe { &self.sin6 };
                Some(IpAddr::V6(Ipv6Addr::from(sin6.sin6_addr.s6_addr)))
            }
            _ => None,
        }
    }
}

impl AsRef<libc::sockaddr> for SockAddr {
    fn as_ref(&self) -> &libc::sockaddr {
        unsafe { &self.sa }
    }
}

impl AsMut<libc::sockaddr> for SockAddr {
    fn as_mut(&mut self) -> &mut libc::sockaddr {
        unsafe { &mut self.sa }
    }
}

impl From<IpAddr> for SockAddr {
    fn from(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(v4) => {
                let sin = unsafe {
                    libc::sockaddr_in {
                        sin_family: libc::AF_INET as libc::sa_family_t,
                        sin_port: 0,
                        sin_addr: libc::in_addr {
                            s_addr: u32::from(v4).to_be(),
                        },
                        ..std::mem::zeroed()
                    }
                };
                SockAddr { sin }
            }
            IpAddr::V6(v6) => {
                let sin6 = unsafe {
                    libc::sockaddr_in6 {
                        sin6_family: libc::AF_INET6 as libc::sa_family_t,
                        sin6_port: 0,
                        sin6_addr: libc::in6_addr {
                            s6_addr: v6.octets(),
                        },
                        ..std::mem::zeroed()
                    }
                };
                SockAddr { sin6 }
            }
        }
    }
}
