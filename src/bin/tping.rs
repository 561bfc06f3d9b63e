//! `tping`: fixed-count ICMP echo probing with a statistics summary.

use std::io;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use traceping::args::{PingArgs, SummaryFormat};
use traceping::event::PingEventHandler;
use traceping::lookup::resolve_target;
use traceping::packet::PACKET_SIZE;
use traceping::probe::unix::IcmpSocket;
use traceping::probe::EchoReply;
use traceping::session::{PingConfig, PingSession, SessionEnd};
use traceping::stats::as_millis;

struct ConsoleReporter;

impl PingEventHandler for ConsoleReporter {
    fn on_sent(&mut self, _sequence: u16) {}

    fn on_reply(&mut self, reply: &EchoReply, rtt: Duration) {
        match reply.hop_limit {
            Some(ttl) => println!(
                "{} bytes from {}: icmp_seq={} ttl={} time={:.3} ms",
                PACKET_SIZE,
                reply.source,
                reply.sequence,
                ttl,
                as_millis(rtt)
            ),
            None => println!(
                "{} bytes from {}: icmp_seq={} time={:.3} ms",
                PACKET_SIZE,
                reply.source,
                reply.sequence,
                as_millis(rtt)
            ),
        }
    }

    fn on_timeout(&mut self, sequence: u16) {
        println!("Request timeout for icmp_seq={}", sequence);
    }

    fn on_error(&mut self, sequence: u16, error: &io::Error) {
        eprintln!("icmp_seq={} abandoned: {}", sequence, error);
    }
}

fn main() -> ExitCode {
    let args = match PingArgs::try_parse() {
        Ok(args) => args,
        Err(error) => {
            let _ = error.print();
            return if error.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    match run(args) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("tping: {:#}", error);
            ExitCode::FAILURE
        }
    }
}

fn run(args: PingArgs) -> anyhow::Result<ExitCode> {
    let _logger = flexi_logger::Logger::try_with_env_or_str("warn")
        .context("bad RUST_LOG spec")?
        .start()
        .context("cannot start logger")?;

    let target = resolve_target(&args.address, args.family)
        .with_context(|| format!("cannot resolve {}", args.address))?;

    let pattern = match &args.pattern {
        Some(text) => hex::decode(text).context("payload pattern is not valid hex")?,
        None => Vec::new(),
    };

    let mut socket = IcmpSocket::open(target)
        .context("cannot open raw ICMP socket (CAP_NET_RAW or root required)")?;
    socket.set_payload_pattern(pattern);

    let config = PingConfig {
        count: args.count,
        ttl: args.ttl,
        flood: args.flood,
    };
    let mut session = PingSession::new(socket, config);

    let interrupt = session.interrupt_flag();
    ctrlc::set_handler(move || interrupt.store(true, Ordering::Relaxed))
        .context("cannot install Ctrl-C handler")?;

    let report = session.run(&mut ConsoleReporter)?;

    if report.end == SessionEnd::DeadlineExceeded {
        println!("Timeout reached. Exiting...");
        return Ok(ExitCode::SUCCESS);
    }

    match args.summary {
        SummaryFormat::Text => print!("{}", report.summary.as_text()?),
        SummaryFormat::Json => println!("{}", serde_json::to_string_pretty(&report.summary)?),
        SummaryFormat::None => {}
    }
    Ok(ExitCode::SUCCESS)
}
