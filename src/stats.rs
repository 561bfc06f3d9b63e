//! Running RTT aggregates and the end-of-session summary.

use std::fmt::Write;
use std::time::Duration;

use serde_derive::Serialize;
use serde_with::{serde_as, DurationSecondsWithFrac};

/// Running aggregates for one ping session: a single owned value, updated in
/// place by the controller as replies arrive.
#[derive(Clone, Debug, Default)]
pub struct SessionStats {
    transmitted: u64,
    received: u64,
    sum: Duration,
    sum_sq_millis: f64,
    min: Option<Duration>,
    max: Option<Duration>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_sent(&mut self) {
        self.transmitted += 1;
    }

    pub fn record_received(&mut self, rtt: Duration) {
        self.received += 1;
        self.sum += rtt;
        let millis = as_millis(rtt);
        self.sum_sq_millis += millis * millis;
        self.min = Some(self.min.map_or(rtt, |m| m.min(rtt)));
        self.max = Some(self.max.map_or(rtt, |m| m.max(rtt)));
    }

    pub fn transmitted(&self) -> u64 {
        self.transmitted
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn average(&self) -> Option<Duration> {
        if self.received == 0 {
            return None;
        }
        Some(self.sum / self.received as u32)
    }

    /// Mean deviation over the recorded samples, `sqrt(E[x²] − E[x]²)`, with
    /// a true sum of squares rather than the classic `sum²` shortcut.
    pub fn mdev(&self) -> Option<Duration> {
        let mean = as_millis(self.average()?);
        let variance = (self.sum_sq_millis / self.received as f64 - mean * mean).max(0.0);
        Some(Duration::from_secs_f64(variance.sqrt() / 1e3))
    }

    pub fn summary(&self) -> Summary {
        Summary {
            packets_transmitted: self.transmitted,
            packets_received: self.received,
            minimum_rtt: self.min,
            average_rtt: self.average(),
            maximum_rtt: self.max,
            mdev_rtt: self.mdev(),
        }
    }
}

/// End-of-run report, serializable for the `--summary json` path.
#[serde_as]
#[derive(Clone, Debug, Serialize)]
pub struct Summary {
    pub packets_transmitted: u64,
    pub packets_received: u64,
    #[serde_as(as = "Option<DurationSecondsWithFrac<f64>>")]
    pub minimum_rtt: Option<Duration>,
    #[serde_as(as = "Option<DurationSecondsWithFrac<f64>>")]
    pub average_rtt: Option<Duration>,
    #[serde_as(as = "Option<DurationSecondsWithFrac<f64>>")]
    pub maximum_rtt: Option<Duration>,
    #[serde_as(as = "Option<DurationSecondsWithFrac<f64>>")]
    pub mdev_rtt: Option<Duration>,
}

impl Summary {
    pub fn as_text(&self) -> Result<String, std::fmt::Error> {
        let mut result = String::new();
        writeln!(&mut result, "--- ping statistics ---")?;
        write!(
            &mut result,
            "{} packets transmitted, {} received",
            self.packets_transmitted, self.packets_received
        )?;
        if self.packets_transmitted > 0 {
            write!(
                &mut result,
                ", {:.1}% packet loss",
                100.0 - (self.packets_received as f64 / self.packets_transmitted as f64 * 100.0)
            )?;
        }
        writeln!(&mut result)?;
        match (self.minimum_rtt, self.average_rtt, self.maximum_rtt, self.mdev_rtt) {
            (Some(min), Some(avg), Some(max), Some(mdev)) => {
                writeln!(
                    &mut result,
                    "rtt min/avg/max/mdev = {:.3}/{:.3}/{:.3}/{:.3} ms",
                    as_millis(min),
                    as_millis(avg),
                    as_millis(max),
                    as_millis(mdev)
                )?;
            }
            _ => {
                writeln!(&mut result, "No reply received")?;
            }
        }
        Ok(result)
    }
}

pub fn as_millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1e3
}
