use clap::Parser;

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum IpFamily {
    #[value(name = "4")]
    V4,
    #[value(name = "6")]
    V6,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SummaryFormat {
    #[default]
    Text,
    Json,
    None,
}

/// Send ICMP echo requests and report round-trip statistics.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, name = "tping")]
pub struct PingArgs {
    /// Address or name of the target host
    #[arg(short, long)]
    pub address: String,

    /// Force the address family (inferred from the address otherwise)
    #[arg(short = 't', long = "family", value_enum)]
    pub family: Option<IpFamily>,

    /// Number of echo requests to send
    #[arg(short, long, default_value_t = 4)]
    pub count: u32,

    /// Flood mode: no delay between requests
    #[arg(short, long)]
    pub flood: bool,

    /// Time to live of outgoing requests
    #[arg(long, default_value_t = 64)]
    pub ttl: u8,

    /// Payload fill pattern in hex (zero fill by default)
    #[arg(short, long)]
    pub pattern: Option<String>,

    /// Summary printed after the run
    #[arg(long, value_enum, default_value = "text")]
    pub summary: SummaryFormat,
}

/// Discover the route to a host with TTL-limited ICMP echo probes.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, name = "ttrace")]
pub struct TraceArgs {
    /// IPv4 address or name of the target host
    #[arg(short, long)]
    pub address: String,
}
