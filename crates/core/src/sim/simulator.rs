//! Cooperative multi-core host driver.
//!
//! Owns the processor cores and schedules them round-robin in bounded
//! `step` slices on one thread. Between slices it advances the real-time
//! clock (one tick per `insns_per_rtc_tick` instructions handed out) and
//! the global step counter that fault-injection triggers compare against;
//! both are synced into a core before its slice runs.

use crate::config::Config;
use crate::core::Processor;

/// Top-level driver for a set of cooperatively scheduled cores.
#[derive(Debug)]
pub struct Simulator {
    procs: Vec<Processor>,
    interleave: u64,
    insns_per_rtc_tick: u64,
    rtc: u64,
    total_steps: u64,
    current_proc: usize,
}

impl Simulator {
    /// Creates a driver over pre-built cores.
    ///
    /// The host configuration supplies the interleave quantum and the
    /// clock ratio; callers validate it first (`Config::validate`).
    pub fn new(procs: Vec<Processor>, config: &Config) -> Self {
        Self {
            procs,
            interleave: config.host.interleave,
            insns_per_rtc_tick: config.host.insns_per_rtc_tick,
            rtc: 0,
            total_steps: 0,
            current_proc: 0,
        }
    }

    /// Number of cores owned by this driver.
    pub fn num_cores(&self) -> usize {
        self.procs.len()
    }

    /// Borrows core `i`.
    pub fn core(&self, i: usize) -> &Processor {
        &self.procs[i]
    }

    /// Mutably borrows core `i` (for external controllers: injection
    /// arming, run-flag manipulation, cache invalidation).
    pub fn core_mut(&mut self, i: usize) -> &mut Processor {
        &mut self.procs[i]
    }

    /// Whether any core still has its run flag set.
    pub fn running(&self) -> bool {
        self.procs.iter().any(|p| p.running)
    }

    /// The real-time clock value.
    pub const fn rtc(&self) -> u64 {
        self.rtc
    }

    /// The global step counter.
    pub const fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Distributes up to `n` instructions across the cores round-robin,
    /// one interleave quantum at a time.
    ///
    /// Returns early when every core has stopped.
    pub fn step(&mut self, n: u64) {
        let mut remaining = n;
        while remaining > 0 && self.running() {
            let quantum = remaining.min(self.interleave);
            let proc = &mut self.procs[self.current_proc];
            proc.sync_host(self.rtc, self.total_steps);
            if proc.running {
                proc.step(quantum);
            }

            self.total_steps += quantum;
            self.rtc += quantum / self.insns_per_rtc_tick;
            self.current_proc = (self.current_proc + 1) % self.procs.len();
            remaining -= quantum;
        }
    }

    /// Runs until every core stops, then returns the total retired count.
    pub fn run(&mut self) -> u64 {
        while self.running() {
            let quantum = self.interleave * self.procs.len() as u64;
            self.step(quantum);
        }
        self.procs.iter().map(|p| p.minstret).sum()
    }

    /// Requests a cooperative stop of every core.
    pub fn stop(&mut self) {
        for proc in &mut self.procs {
            proc.stop();
        }
    }
}
