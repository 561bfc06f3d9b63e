//! Session controllers: the fixed-count ping loop and the TTL sweep.
//!
//! Both are generic over [`ProbeTransport`] and strictly sequential: one
//! probe outstanding at a time, the transport exclusively owned for the
//! session's lifetime.

mod ping;
mod trace;

pub use ping::{PingConfig, PingReport, PingSession, SessionEnd, PING_TIMEOUT};
pub use trace::{
    Hop, TraceOutcome, TraceReport, TraceSession, HOP_TIMEOUT, MAX_HOPS, PROBES_PER_HOP,
};

use std::io;
use std::time::{Duration, Instant};

use crate::probe::{EchoProbe, EchoReply, ProbeOutcome, ProbeTransport};

/// Waits for the reply that answers `probe`, discarding spurious datagrams,
/// until `timeout` has elapsed since the call. Each pass through the loop is
/// one bounded readiness check with the remaining budget; there is no
/// busy-polling and no retry once the budget is spent.
pub(crate) fn await_reply<T: ProbeTransport>(
    transport: &mut T,
    probe: &EchoProbe,
    timeout: Duration,
) -> io::Result<Option<EchoReply>> {
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(None);
        }
        match transport.recv(remaining)? {
            ProbeOutcome::Reply(reply) if reply.matches(probe) => return Ok(Some(reply)),
            ProbeOutcome::Reply(reply) => {
                log::debug!(
                    "discarding reply ident={} seq={} from {}",
                    reply.ident,
                    reply.sequence,
                    reply.source
                );
            }
            ProbeOutcome::Ignored => {}
            ProbeOutcome::Timeout => return Ok(None),
        }
    }
}
