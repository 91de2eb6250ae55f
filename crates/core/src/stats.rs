//! Simulation statistics collection and reporting.
//!
//! Tracks the execution-core metrics of interest for a functional
//! simulator:
//! 1. **Throughput:** Retired instructions, host seconds, and derived MIPS.
//! 2. **Control events:** Traps, interrupts, and serialization points.
//! 3. **Instruction cache:** Demand hits/misses and sequential refills.
//! 4. **Fault injection:** Faults actually substituted into a fetch.

use std::time::Instant;

/// Statistics for one processor core.
#[derive(Clone, Debug)]
pub struct SimStats {
    start_time: Instant,
    /// Instructions committed (mirrors the architectural `minstret`).
    pub instructions_retired: u64,
    /// Traps taken, exceptions and interrupts combined.
    pub traps_taken: u64,
    /// Interrupts taken (subset of `traps_taken`).
    pub interrupts_taken: u64,
    /// Batches halted at a serialization point.
    pub serializations: u64,
    /// Demand fetches served from the decoded-instruction cache.
    pub icache_hits: u64,
    /// Demand fetches that had to fall back to a cold fetch.
    pub icache_misses: u64,
    /// Lines pre-installed by the sequential-refill heuristic.
    pub icache_refills: u64,
    /// Transient faults substituted by the injection hook.
    pub injected_faults: u64,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            instructions_retired: 0,
            traps_taken: 0,
            interrupts_taken: 0,
            serializations: 0,
            icache_hits: 0,
            icache_misses: 0,
            icache_refills: 0,
            injected_faults: 0,
        }
    }
}

impl SimStats {
    /// Prints the statistics report to stdout.
    pub fn print(&self) {
        let seconds = self.start_time.elapsed().as_secs_f64();
        let mips = if seconds > 0.0 {
            (self.instructions_retired as f64 / seconds) / 1_000_000.0
        } else {
            0.0
        };
        let ic_total = self.icache_hits + self.icache_misses;
        let hit_rate = if ic_total > 0 {
            (self.icache_hits as f64 / ic_total as f64) * 100.0
        } else {
            0.0
        };

        println!("\n==========================================================");
        println!("FUNCTIONAL SIMULATION STATISTICS");
        println!("==========================================================");
        println!("host_seconds             {seconds:.4} s");
        println!("sim_insts                {}", self.instructions_retired);
        println!("sim_mips                 {mips:.2}");
        println!("----------------------------------------------------------");
        println!("traps_taken              {}", self.traps_taken);
        println!("interrupts_taken         {}", self.interrupts_taken);
        println!("serializations           {}", self.serializations);
        println!("injected_faults          {}", self.injected_faults);
        println!("----------------------------------------------------------");
        println!("icache.accesses          {ic_total}");
        println!("icache.hits              {}", self.icache_hits);
        println!("icache.refills           {}", self.icache_refills);
        println!("icache.hit_rate          {hit_rate:.2}%");
        println!("==========================================================");
    }
}
