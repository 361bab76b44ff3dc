//! Parsers for the text printed by the diagnostic commands
//!
//! All functions are pure and never fail: a missing or garbled value reads
//! as `0`. Structural checks on the combined report live in
//! [`RemoteReport::parse`], which is what turns malformed output into a
//! collection failure.

use std::sync::LazyLock;

use regex::Regex;

use crate::util::round_to;

/// Line-delimited script printing cpu summary, memory summary, load average
/// and uptime, one per line. Every step falls back to an empty line so the
/// line positions stay fixed.
pub const REPORT_COMMAND: &str = "top -bn1 | grep -m1 'Cpu(s)' || echo; \
free | grep -m1 '^Mem:' || echo; \
cat /proc/loadavg || echo; \
uptime -p 2>/dev/null || echo unknown";

/// Usage line of the root filesystem in POSIX format
pub const DISK_COMMAND: &str = "df -P / | tail -n 1";

static CPU_IDLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:[.,]\d+)?)\s*%?\s*id\b").expect("valid regex"));

/// `%Cpu(s):  5.2 us,  2.1 sy,  0.0 ni, 92.7 id, ...` -> `7.3`
pub fn parse_cpu_usage(line: &str) -> f64 {
    let Some(captures) = CPU_IDLE.captures(line) else {
        return 0.0;
    };

    let idle = captures[1].replace(',', ".");
    match idle.parse::<f64>() {
        Ok(idle) => round_to((100.0 - idle).clamp(0.0, 100.0), 2),
        Err(_) => 0.0,
    }
}

/// `Mem: total used free shared buff/cache available` -> used/total in percent
pub fn parse_memory_usage(line: &str) -> f64 {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 6 {
        return 0.0;
    }

    let (Ok(total), Ok(used)) = (parts[1].parse::<u64>(), parts[2].parse::<u64>()) else {
        return 0.0;
    };

    if total == 0 {
        return 0.0;
    }

    round_to((used as f64 / total as f64 * 100.0).clamp(0.0, 100.0), 2)
}

/// `/dev/sda1 52428800 26214400 23068672 53% /` -> `53.0`
pub fn parse_disk_usage(line: &str) -> f64 {
    disk_percent_token(line).unwrap_or(0.0)
}

fn disk_percent_token(line: &str) -> Option<f64> {
    line.split_whitespace()
        .filter_map(|token| token.strip_suffix('%'))
        .find_map(|value| value.parse::<f64>().ok())
}

/// `0.52 0.58 0.59 1/389 12345` -> `(0.52, 0.58, 0.59)`
pub fn parse_load_average(line: &str) -> (f64, f64, f64) {
    let mut loads = line
        .split_whitespace()
        .map(|token| token.parse::<f64>().unwrap_or(0.0));

    (
        loads.next().unwrap_or(0.0),
        loads.next().unwrap_or(0.0),
        loads.next().unwrap_or(0.0),
    )
}

/// Values read from one run of [`REPORT_COMMAND`] plus [`DISK_COMMAND`]
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteReport {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
    pub load: (f64, f64, f64),
    pub uptime_text: Option<String>,
}

impl RemoteReport {
    /// Parse both outputs, rejecting anything structurally off
    pub fn parse(report: &str, disk: &str) -> Result<Self, String> {
        let lines: Vec<&str> = report.lines().map(str::trim).collect();
        if lines.len() < 4 {
            return Err(format!("expected 4 report lines, got {}", lines.len()));
        }

        let (cpu_line, mem_line, load_line, uptime_line) = (lines[0], lines[1], lines[2], lines[3]);

        if !mem_line.starts_with("Mem:") {
            return Err(format!("unexpected memory line {mem_line:?}"));
        }

        let load_tokens = load_line.split_whitespace().take(3);
        if load_tokens.clone().count() < 3
            || load_tokens.clone().any(|t| t.parse::<f64>().is_err())
        {
            return Err(format!("unexpected load average line {load_line:?}"));
        }

        let disk_line = disk.trim();
        let Some(disk_percent) = disk_percent_token(disk_line) else {
            return Err(format!("no usage percentage in disk line {disk_line:?}"));
        };

        let uptime_text = match uptime_line {
            "" | "unknown" => None,
            text => Some(text.strip_prefix("up ").unwrap_or(text).to_string()),
        };

        Ok(Self {
            cpu_percent: parse_cpu_usage(cpu_line),
            memory_percent: parse_memory_usage(mem_line),
            disk_percent,
            load: parse_load_average(load_line),
            uptime_text,
        })
    }
}
