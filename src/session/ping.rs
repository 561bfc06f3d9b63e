//! Fixed-count echo probing with running statistics.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::event::PingEventHandler;
use crate::probe::{EchoProbe, ProbeTransport};
use crate::stats::{SessionStats, Summary};

/// Bound on each reply wait, and on the whole session: a deadline armed at
/// session start is checked at the top of every iteration.
pub const PING_TIMEOUT: Duration = Duration::from_secs(10);

const PROBE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone, Debug)]
pub struct PingConfig {
    /// Number of echo requests to send.
    pub count: u32,
    /// TTL carried by every request.
    pub ttl: u8,
    /// Flood mode skips the inter-probe delay.
    pub flood: bool,
}

impl Default for PingConfig {
    fn default() -> Self {
        Self {
            count: 4,
            ttl: 64,
            flood: false,
        }
    }
}

/// Why the loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    Completed,
    /// The session deadline expired with probes remaining.
    DeadlineExceeded,
    /// The interrupt flag was set (Ctrl-C wiring lives in the binary).
    Interrupted,
}

#[derive(Clone, Debug)]
pub struct PingReport {
    pub summary: Summary,
    pub end: SessionEnd,
}

pub struct PingSession<T: ProbeTransport> {
    transport: T,
    config: PingConfig,
    ident: u16,
    interrupt: Arc<AtomicBool>,
}

impl<T: ProbeTransport> PingSession<T> {
    pub fn new(transport: T, config: PingConfig) -> Self {
        Self {
            transport,
            config,
            ident: std::process::id() as u16,
            interrupt: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cooperative stop flag, checked at the top of each iteration. Clone it
    /// into a signal handler to stop the loop early; an interrupted session
    /// still reports its statistics.
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        self.interrupt.clone()
    }

    pub fn run(&mut self, events: &mut dyn PingEventHandler) -> io::Result<PingReport> {
        let deadline = Instant::now() + PING_TIMEOUT;
        let mut stats = SessionStats::new();
        self.transport.set_ttl(self.config.ttl)?;

        let mut end = SessionEnd::Completed;
        for i in 0..self.config.count {
            if self.interrupt.load(Ordering::Relaxed) {
                end = SessionEnd::Interrupted;
                break;
            }
            if Instant::now() >= deadline {
                end = SessionEnd::DeadlineExceeded;
                break;
            }

            let sequence = i as u16;
            let probe = EchoProbe::new(self.ident, sequence, self.config.ttl);
            stats.record_sent();
            events.on_sent(sequence);

            match self.transport.send(&probe) {
                Ok(()) => match super::await_reply(&mut self.transport, &probe, PING_TIMEOUT) {
                    Ok(Some(reply)) => {
                        let rtt = reply.elapsed(&probe);
                        stats.record_received(rtt);
                        events.on_reply(&reply, rtt);
                    }
                    Ok(None) => events.on_timeout(sequence),
                    Err(error) => {
                        log::warn!("wait for icmp_seq={} failed: {}", sequence, error);
                        events.on_error(sequence, &error);
                    }
                },
                Err(error) => {
                    log::warn!("send of icmp_seq={} failed: {}", sequence, error);
                    events.on_error(sequence, &error);
                }
            }

            if !self.config.flood && i + 1 < self.config.count {
                std::thread::sleep(PROBE_INTERVAL);
            }
        }

        Ok(PingReport {
            summary: stats.summary(),
            end,
        })
    }
}
