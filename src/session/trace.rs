//! TTL sweep: three probes per hop, early exit at the destination.

use std::io;
use std::net::IpAddr;
use std::time::Duration;

use crate::event::TraceEventHandler;
use crate::probe::{EchoProbe, ProbeTransport};

pub const MAX_HOPS: u8 = 30;
pub const PROBES_PER_HOP: u16 = 3;

/// Per-probe reply budget during the sweep.
pub const HOP_TIMEOUT: Duration = Duration::from_secs(1);

/// One TTL's worth of probing: up to three timed replies and the first
/// responding address seen at that distance.
#[derive(Clone, Debug)]
pub struct Hop {
    pub ttl: u8,
    pub address: Option<IpAddr>,
    pub samples: Vec<Duration>,
}

impl Hop {
    fn new(ttl: u8) -> Self {
        Self {
            ttl,
            address: None,
            samples: Vec::with_capacity(PROBES_PER_HOP as usize),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceOutcome {
    /// The destination answered the final probe of this hop.
    Reached { ttl: u8 },
    /// The whole TTL range was swept without the destination answering.
    Unreachable,
}

#[derive(Clone, Debug)]
pub struct TraceReport {
    pub hops: Vec<Hop>,
    pub outcome: TraceOutcome,
}

pub struct TraceSession<T: ProbeTransport> {
    transport: T,
    destination: IpAddr,
    ident: u16,
}

impl<T: ProbeTransport> TraceSession<T> {
    pub fn new(transport: T, destination: IpAddr) -> Self {
        Self {
            transport,
            destination,
            ident: std::process::id() as u16,
        }
    }

    pub fn run(&mut self, events: &mut dyn TraceEventHandler) -> io::Result<TraceReport> {
        let mut hops = Vec::new();

        for ttl in 1..=MAX_HOPS {
            events.on_hop_start(ttl);

            if let Err(error) = self.transport.set_ttl(ttl) {
                log::warn!("setting TTL {} failed: {}", ttl, error);
                for _ in 0..PROBES_PER_HOP {
                    events.on_probe_lost(ttl);
                }
                events.on_hop_end(ttl);
                hops.push(Hop::new(ttl));
                continue;
            }

            let mut hop = Hop::new(ttl);
            let mut final_attempt_source = None;

            for attempt in 0..PROBES_PER_HOP {
                let sequence = u16::from(ttl) * PROBES_PER_HOP + attempt;
                let probe = EchoProbe::new(self.ident, sequence, ttl);

                if let Err(error) = self.transport.send(&probe) {
                    log::warn!("send at ttl={} failed: {}", ttl, error);
                    events.on_probe_lost(ttl);
                    continue;
                }

                match super::await_reply(&mut self.transport, &probe, HOP_TIMEOUT) {
                    Ok(Some(reply)) => {
                        let rtt = reply.elapsed(&probe);
                        hop.samples.push(rtt);
                        if hop.address.is_none() {
                            hop.address = Some(reply.source);
                            events.on_hop_address(ttl, reply.source);
                        }
                        events.on_probe_rtt(ttl, rtt);
                        if attempt + 1 == PROBES_PER_HOP {
                            final_attempt_source = Some(reply.source);
                        }
                    }
                    Ok(None) => events.on_probe_lost(ttl),
                    Err(error) => {
                        log::warn!("wait at ttl={} failed: {}", ttl, error);
                        events.on_probe_lost(ttl);
                    }
                }
            }

            events.on_hop_end(ttl);
            hops.push(hop);

            // The sweep only ends when the *last* probe of a hop came back
            // from the destination itself.
            if final_attempt_source == Some(self.destination) {
                events.on_destination_reached(self.destination);
                return Ok(TraceReport {
                    hops,
                    outcome: TraceOutcome::Reached { ttl },
                });
            }
        }

        events.on_unreachable();
        Ok(TraceReport {
            hops,
            outcome: TraceOutcome::Unreachable,
        })
    }
}
