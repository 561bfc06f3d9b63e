//! Event sinks through which sessions report progress.
//!
//! The controllers never print. Binaries install console sinks; tests install
//! recording ones.

use std::io;
use std::net::IpAddr;
use std::time::Duration;

use crate::probe::EchoReply;

/// Per-probe events of a ping session.
pub trait PingEventHandler {
    fn on_sent(&mut self, sequence: u16);

    /// A matching reply arrived. `rtt` is already derived from the probe's
    /// send timestamp.
    fn on_reply(&mut self, reply: &EchoReply, rtt: Duration);

    fn on_timeout(&mut self, sequence: u16);

    /// Send or wait failed; the probe is abandoned and the session goes on.
    fn on_error(&mut self, sequence: u16, error: &io::Error);
}

/// Per-hop events of a TTL sweep.
pub trait TraceEventHandler {
    fn on_hop_start(&mut self, ttl: u8);

    /// First reply seen at this hop; later replies only contribute timing.
    fn on_hop_address(&mut self, ttl: u8, address: IpAddr);

    fn on_probe_rtt(&mut self, ttl: u8, rtt: Duration);

    /// Timeout, send failure, or wait failure: the attempt yields a marker.
    fn on_probe_lost(&mut self, ttl: u8);

    fn on_hop_end(&mut self, ttl: u8);

    fn on_destination_reached(&mut self, address: IpAddr);

    fn on_unreachable(&mut self);
}
