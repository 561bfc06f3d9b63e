//! `ttrace`: hop discovery with TTL-limited echo probes, IPv4 only.

use std::io::Write;
use std::net::IpAddr;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use traceping::args::{IpFamily, TraceArgs};
use traceping::event::TraceEventHandler;
use traceping::lookup::resolve_target;
use traceping::probe::unix::IcmpSocket;
use traceping::session::{TraceSession, MAX_HOPS};
use traceping::stats::as_millis;

struct ConsoleReporter {
    stdout: std::io::Stdout,
}

impl ConsoleReporter {
    // Hop lines build up probe by probe; flush so progress is visible.
    fn write(&mut self, text: &str) {
        let _ = self.stdout.write_all(text.as_bytes());
        let _ = self.stdout.flush();
    }
}

impl TraceEventHandler for ConsoleReporter {
    fn on_hop_start(&mut self, ttl: u8) {
        self.write(&format!("{:2} ", ttl));
    }

    fn on_hop_address(&mut self, _ttl: u8, address: IpAddr) {
        self.write(&format!("{} ", address));
    }

    fn on_probe_rtt(&mut self, _ttl: u8, rtt: Duration) {
        self.write(&format!("{:.3} ms ", as_millis(rtt)));
    }

    fn on_probe_lost(&mut self, _ttl: u8) {
        self.write("* ");
    }

    fn on_hop_end(&mut self, _ttl: u8) {
        self.write("\n");
    }

    fn on_destination_reached(&mut self, address: IpAddr) {
        self.write(&format!("Reached destination: {}\n", address));
    }

    fn on_unreachable(&mut self) {
        self.write("Destination unreachable.\n");
    }
}

fn main() -> ExitCode {
    let args = match TraceArgs::try_parse() {
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
            eprintln!("ttrace: {:#}", error);
            ExitCode::FAILURE
        }
    }
}

fn run(args: TraceArgs) -> anyhow::Result<ExitCode> {
    let _logger = flexi_logger::Logger::try_with_env_or_str("warn")
        .context("bad RUST_LOG spec")?
        .start()
        .context("cannot start logger")?;

    let target = resolve_target(&args.address, Some(IpFamily::V4))
        .with_context(|| format!("cannot resolve {}", args.address))?;

    let socket = IcmpSocket::open(target)
        .context("cannot open raw ICMP socket (CAP_NET_RAW or root required)")?;
    let mut session = TraceSession::new(socket, target);

    println!("Traceroute to {}, {} hops max", target, MAX_HOPS);
    let mut reporter = ConsoleReporter {
        stdout: std::io::stdout(),
    };
    session.run(&mut reporter)?;

    Ok(ExitCode::SUCCESS)
}
