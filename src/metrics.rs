//! Load-time metrics: stage timings and resident memory.
//!
//! Only the snapshot load is measured; queries are cheap enough to trace
//! individually.

use std::time::{Duration, Instant};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// Resident set size of this process in bytes, 0 if it cannot be read.
pub fn resident_memory() -> u64 {
    let pid = Pid::from_u32(std::process::id());
    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        true,
        ProcessRefreshKind::nothing().with_memory(),
    );
    system.process(pid).map_or(0, |process| process.memory())
}

/// `1536` -> `1.5KB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes}B")
    } else {
        format!("{value:.1}{}", UNITS[unit])
    }
}

/// One completed load stage.
#[derive(Debug, Clone)]
pub struct LoadStage {
    pub name: &'static str,
    pub elapsed: Duration,
    /// Vectors, records or entries the stage produced
    pub items: usize,
}

/// Timings and memory growth of one snapshot load.
#[derive(Debug)]
pub struct LoadReport {
    pub stages: Vec<LoadStage>,
    pub rss_before: u64,
    pub rss_after: u64,
    pub total: Duration,
    started: Instant,
    mark: Instant,
}

impl LoadReport {
    pub fn start() -> Self {
        let now = Instant::now();
        Self {
            stages: Vec::new(),
            rss_before: resident_memory(),
            rss_after: 0,
            total: Duration::ZERO,
            started: now,
            mark: now,
        }
    }

    /// Record the stage that ends now; the next stage starts from here.
    pub fn stage_done(&mut self, name: &'static str, items: usize) {
        let now = Instant::now();
        self.stages.push(LoadStage {
            name,
            elapsed: now - self.mark,
            items,
        });
        self.mark = now;
    }

    pub fn finalize(&mut self) {
        self.total = self.started.elapsed();
        self.rss_after = resident_memory();
    }

    pub fn log(&self) {
        for stage in &self.stages {
            tracing::info!(target: "index",
                "load stage {:<10} {:>8} items in {:.2}s",
                stage.name,
                stage.items,
                stage.elapsed.as_secs_f64()
            );
        }
        tracing::info!(target: "index",
            "load finished in {:.2}s, rss {} (+{})",
            self.total.as_secs_f64(),
            format_bytes(self.rss_after),
            format_bytes(self.rss_after.saturating_sub(self.rss_before))
        );
    }
}
