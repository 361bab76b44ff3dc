//! Deterministic synthetic metrics
//!
//! Each host gets a stable baseline derived from its address. On top of it
//! sits a slow oscillation with a period of 30 minutes, so values drift
//! over a session, plus a small jitter drawn from a generator seeded with
//! the same address. There is no shared random state: the same address at
//! the same instant always yields the same sample.

use chrono::{DateTime, Timelike, Utc};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{DataSource, HostRecord, HostStatus, MetricSample, util::round_to};

/// Seeds are reduced into `0..SEED_RANGE`
const SEED_RANGE: u64 = 10_000;

/// Oscillation period in seconds
const PERIOD_SECS: f64 = 1800.0;

pub const CPU_BOUNDS: (f64, f64) = (5.0, 98.0);
pub const MEMORY_BOUNDS: (f64, f64) = (10.0, 95.0);
pub const DISK_BOUNDS: (f64, f64) = (5.0, 90.0);

/// Lower bound of every synthetic load average
pub const MIN_LOAD: f64 = 0.1;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Stable per-address seed (FNV-1a, reduced into `0..10000`)
pub fn address_seed(address: &str) -> u64 {
    let hash = address.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    });
    hash % SEED_RANGE
}

/// Time-independent resting values of a host
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
}

impl Baseline {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            cpu: (30 + seed % 40) as f64,
            memory: (40 + (seed * 2) % 35) as f64,
            disk: (30 + (seed * 3) % 50) as f64,
        }
    }

    pub fn for_address(address: &str) -> Self {
        Self::from_seed(address_seed(address))
    }
}

/// Synthetic sample for `host` at `now`
///
/// Always `online` with `data_source = simulated`; the orchestrator
/// rewrites both when this is used as a fallback.
pub fn generate(host: &HostRecord, now: DateTime<Utc>) -> MetricSample {
    generate_for(&host.address, &host.display_name, now)
}

pub fn generate_for(address: &str, display_name: &str, now: DateTime<Utc>) -> MetricSample {
    let seed = address_seed(address);
    let baseline = Baseline::from_seed(seed);
    let mut rng = StdRng::seed_from_u64(seed);

    let t = f64::from(now.minute() * 60 + now.second()) / PERIOD_SECS;

    let cpu = baseline.cpu + 10.0 * (0.5 - t.fract()) + rng.random_range(-1.5..=1.5);
    let memory = baseline.memory + 8.0 * (0.5 - (t * 1.3).fract()) + rng.random_range(-1.0..=1.0);
    let disk = baseline.disk + 5.0 * (0.5 - (t * 0.7).fract()) + rng.random_range(-0.5..=0.5);

    let cpu = round_to(cpu.clamp(CPU_BOUNDS.0, CPU_BOUNDS.1), 1);
    let memory = round_to(memory.clamp(MEMORY_BOUNDS.0, MEMORY_BOUNDS.1), 1);
    let disk = round_to(disk.clamp(DISK_BOUNDS.0, DISK_BOUNDS.1), 1);

    // load follows cpu, longer windows are damped
    let load_base = 0.3 + cpu / 100.0 * 1.5;
    let load_1 = load_base + rng.random_range(-0.15..=0.15);
    let load_5 = load_base * 0.9 + rng.random_range(-0.1..=0.1);
    let load_15 = load_base * 0.8 + rng.random_range(-0.1..=0.1);

    let days: u32 = rng.random_range(1..=30);
    let hours: u32 = rng.random_range(1..=23);

    MetricSample {
        address: address.to_string(),
        display_name: display_name.to_string(),
        cpu_percent: cpu,
        memory_percent: memory,
        disk_percent: disk,
        load_1: round_to(load_1.max(MIN_LOAD), 2),
        load_5: round_to(load_5.max(MIN_LOAD), 2),
        load_15: round_to(load_15.max(MIN_LOAD), 2),
        uptime_text: Some(format!("up {days} days, {hours} hours")),
        status: HostStatus::Online,
        data_source: DataSource::Simulated,
        error_detail: None,
        observed_at: now,
    }
}
