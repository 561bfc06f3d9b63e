//! Raw-socket transport for Unix.
//!
//! One `SOCK_RAW` ICMP(v6) socket per session, exclusively owned by the
//! session controller. Syscalls go through libc; every failing call maps to
//! `io::Error::last_os_error()`.

use std::io;
use std::mem;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use super::sockaddr::SockAddr;
use super::{EchoProbe, EchoReply, ProbeOutcome, ProbeTransport};
use crate::packet;

const RECV_BUFFER_SIZE: usize = 2048;

/// Raw ICMP socket bound to one destination for the session's lifetime.
pub struct IcmpSocket {
    fd: libc::c_int,
    dest: IpAddr,
    pattern: Vec<u8>,
}

impl IcmpSocket {
    /// Opens a raw socket for the destination's address family. Needs
    /// CAP_NET_RAW (or root); failure here is fatal to the program.
    pub fn open(dest: IpAddr) -> io::Result<Self> {
        let (family, protocol) = match dest {
            IpAddr::V4(_) => (libc::AF_INET, libc::IPPROTO_ICMP),
            IpAddr::V6(_) => (libc::AF_INET6, libc::IPPROTO_ICMPV6),
        };
        let fd = unsafe { libc::socket(family, libc::SOCK_RAW, protocol) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Self {
            fd,
            dest,
            pattern: Vec::new(),
        })
    }

    pub fn destination(&self) -> IpAddr {
        self.dest
    }

    /// Repeating payload fill for outgoing requests; empty keeps the zero
    /// fill.
    pub fn set_payload_pattern(&mut self, pattern: Vec<u8>) {
        self.pattern = pattern;
    }

    fn setsockopt<T: Sized>(&mut self, level: libc::c_int, name: libc::c_int, value: &T) -> io::Result<()> {
        let result = unsafe {
            libc::setsockopt(
                self.fd,
                level,
                name,
                value as *const T as *const libc::c_void,
                mem::size_of::<T>() as libc::socklen_t,
            )
        };
        if result < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// One bounded readiness check. No retry on EINTR; the caller decides
    /// what an interrupted wait means.
    fn wait_readable(&self, timeout: Duration) -> io::Result<bool> {
        let mut pollfd = libc::pollfd {
            fd: self.fd,
            events: libc::POLLIN,
            revents: 0,
        };
        let millis = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;
        let ready = unsafe { libc::poll(&mut pollfd, 1, millis) };
        if ready < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(ready > 0)
    }
}

impl ProbeTransport for IcmpSocket {
    fn set_ttl(&mut self, ttl: u8) -> io::Result<()> {
        let ttl = libc::c_int::from(ttl);
        match self.dest {
            IpAddr::V4(_) => self.setsockopt(libc::IPPROTO_IP, libc::IP_TTL, &ttl),
            IpAddr::V6(_) => self.setsockopt(libc::IPPROTO_IPV6, libc::IPV6_UNICAST_HOPS, &ttl),
        }
    }

    fn send(&mut self, probe: &EchoProbe) -> io::Result<()> {
        let request =
            packet::build_echo_request(self.dest.is_ipv6(), probe.ident, probe.sequence, &self.pattern);
        let dest = SockAddr::from(self.dest);
        let sent = unsafe {
            libc::sendto(
                self.fd,
                request.as_ptr() as *const libc::c_void,
                request.len(),
                0,
                dest.as_ref(),
                mem::size_of::<SockAddr>() as libc::socklen_t,
            )
        };
        if sent < 0 {
            return Err(io::Error::last_os_error());
        }
        if (sent as usize) < request.len() {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "short ICMP send"));
        }
        Ok(())
    }

    fn recv(&mut self, timeout: Duration) -> io::Result<ProbeOutcome> {
        if !self.wait_readable(timeout)? {
            return Ok(ProbeOutcome::Timeout);
        }

        let mut buffer = [0u8; RECV_BUFFER_SIZE];
        let mut addr = SockAddr::default();
        let mut addr_len = mem::size_of::<SockAddr>() as libc::socklen_t;
        let received = unsafe {
            libc::recvfrom(
                self.fd,
                buffer.as_mut_ptr() as *mut libc::c_void,
                buffer.len(),
                0,
                addr.as_mut(),
                &mut addr_len,
            )
        };
        let received_at = Instant::now();
        if received < 0 {
            return Err(io::Error::last_os_error());
        }
        let datagram = &buffer[..received as usize];

        let (hop_limit, message) = match self.dest {
            IpAddr::V4(_) => match packet::strip_ipv4_header(datagram) {
                Some((ttl, icmp)) => (Some(ttl), packet::parse_icmp_v4(icmp)),
                None => return Ok(ProbeOutcome::Ignored),
            },
            IpAddr::V6(_) => (None, packet::parse_icmp_v6(datagram)),
        };

        let (message, source) = match (message, addr.ip()) {
            (Some(message), Some(source)) => (message, source),
            _ => return Ok(ProbeOutcome::Ignored),
        };

        Ok(ProbeOutcome::Reply(EchoReply {
            source,
            kind: message.kind,
            ident: message.ident,
            sequence: message.sequence,
            hop_limit,
            received_at,
        }))
    }
}

impl Drop for IcmpSocket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}
