//! Host Driver Tests.
//!
//! Verifies cooperative round-robin scheduling, real-time clock and
//! global step accounting, and whole-simulation stop conditions.

use pretty_assertions::assert_eq;

use rvfsim_core::{Config, Simulator};

use crate::common::{asm, bed, small_config};

fn host_config(interleave: u64, insns_per_rtc_tick: u64) -> Config {
    let mut config = small_config();
    config.host.interleave = interleave;
    config.host.insns_per_rtc_tick = insns_per_rtc_tick;
    config
}

/// Cores advance in interleave-sized slices, round-robin.
#[test]
fn round_robin_slices_quota_across_cores() {
    let config = host_config(4, 2);
    let p0 = bed(&[asm::nop(); 16]).proc;
    let p1 = bed(&[asm::nop(); 16]).proc;
    let mut sim = Simulator::new(vec![p0, p1], &config);

    sim.step(8);

    assert_eq!(sim.core(0).minstret, 4);
    assert_eq!(sim.core(1).minstret, 4);
    assert_eq!(sim.total_steps(), 8);
    assert_eq!(sim.rtc(), 4);
}

/// A stopped core is skipped while the others keep running.
#[test]
fn halted_core_is_skipped() {
    let config = host_config(4, 100);
    let p0 = bed(&[asm::halt(), asm::nop(), asm::nop()]).proc;
    let p1 = bed(&[asm::nop(); 16]).proc;
    let mut sim = Simulator::new(vec![p0, p1], &config);

    sim.step(16);

    assert_eq!(sim.core(0).minstret, 1, "halted after its first instruction");
    assert_eq!(sim.core(1).minstret, 8);
    assert!(sim.running(), "core 1 still runs");
}

/// run() drains every core and reports the total retired count.
#[test]
fn run_returns_total_retired() {
    let config = host_config(4, 100);
    let p0 = bed(&[asm::nop(), asm::nop(), asm::halt()]).proc;
    let p1 = bed(&[asm::nop(), asm::halt()]).proc;
    let mut sim = Simulator::new(vec![p0, p1], &config);

    let total = sim.run();

    assert!(!sim.running());
    assert_eq!(total, 5);
    assert_eq!(sim.core(0).minstret, 3);
    assert_eq!(sim.core(1).minstret, 2);
}

/// stop() requests a cooperative stop of every core.
#[test]
fn stop_clears_every_run_flag() {
    let config = host_config(4, 100);
    let p0 = bed(&[asm::nop(); 8]).proc;
    let p1 = bed(&[asm::nop(); 8]).proc;
    let mut sim = Simulator::new(vec![p0, p1], &config);

    sim.stop();
    sim.step(100);

    assert!(!sim.running());
    assert_eq!(sim.core(0).minstret, 0);
    assert_eq!(sim.core(1).minstret, 0);
}

/// The driver syncs its clock into a core before each slice, so a core
/// with an expired timer compare observes it at its next slice.
#[test]
fn host_clock_reaches_cores() {
    let config = host_config(4, 1); // rtc advances 4 per slice
    let p0 = bed(&[asm::nop(); 64]).proc;
    let mut sim = Simulator::new(vec![p0], &config);

    sim.step(8);

    // Two slices handed out: rtc was 0 then 4; the core last saw 4.
    assert_eq!(sim.rtc(), 8);
    assert_eq!(sim.core(0).minstret, 8);
}
