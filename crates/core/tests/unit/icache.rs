//! Decoded-Instruction Cache Tests.
//!
//! Verifies tag correctness, idempotent caching, the sequential-refill
//! locality heuristic, and the invalidation contract. Decode counts come
//! from the mock port, so what the cache absorbed is directly observable.

use pretty_assertions::assert_eq;

use rvfsim_core::core::units::ICache;
use rvfsim_core::{ExecOutcome, FetchResult, Insn, Processor, Trap};

use crate::common::{BASE, asm, bed};

fn stub_exec(_: &mut Processor, _: Insn, pc: u64) -> Result<ExecOutcome, Trap> {
    Ok(ExecOutcome::jump(pc + 4))
}

fn stub_fetch(bits: u64) -> FetchResult {
    FetchResult {
        insn: Insn::new(bits),
        exec: stub_exec,
    }
}

// ══════════════════════════════════════════════════════════
// 1. Tag Correctness (unit level)
// ══════════════════════════════════════════════════════════

/// After a fill at tag t, access(t) hits; access(t') for a colliding t'
/// misses.
#[test]
fn fill_then_lookup_hits_only_exact_tag() {
    let mut ic = ICache::new(16);
    ic.fill(0x1000, stub_fetch(0x13));

    assert!(ic.lookup(0x1000).is_some());
    // 16 lines, 4-byte granule: 0x1000 and 0x1040 share an index but
    // differ in tag.
    assert_eq!(ic.index(0x1000), ic.index(0x1040));
    assert!(ic.lookup(0x1040).is_none());
}

/// A conflicting fill evicts the previous occupant of the line.
#[test]
fn conflicting_fill_evicts_previous_tag() {
    let mut ic = ICache::new(16);
    ic.fill(0x1000, stub_fetch(0x13));
    ic.fill(0x1040, stub_fetch(0x17));

    assert!(ic.lookup(0x1000).is_none());
    let hit = ic.lookup(0x1040);
    assert!(hit.is_some_and(|f| f.insn.bits() == 0x17));
}

/// Invalidation clears every line.
#[test]
fn invalidate_all_clears_every_line() {
    let mut ic = ICache::new(8);
    for i in 0..8u64 {
        ic.fill(i * 4, stub_fetch(0x13));
    }
    ic.invalidate_all();
    for i in 0..8u64 {
        assert!(ic.lookup(i * 4).is_none());
    }
}

/// Geometry that breaks mask addressing is an invariant violation.
#[test]
#[should_panic(expected = "power of two")]
fn non_power_of_two_geometry_is_rejected() {
    let _ = ICache::new(12);
}

// ══════════════════════════════════════════════════════════
// 2. Idempotent Caching
// ══════════════════════════════════════════════════════════

/// A hot loop decodes each instruction exactly once; every later fetch is
/// served from the cache, bit-identical to the cold fetch.
#[test]
fn hot_loop_decodes_each_pc_once() {
    let program = [asm::nop(), asm::nop(), asm::nop(), asm::jmp(BASE)];
    let mut t = bed(&program);

    t.proc.step(40); // ten trips around the loop

    assert_eq!(t.proc.minstret, 40);
    assert_eq!(t.proc.pc, BASE);
    // One decode per distinct pc: one demand miss plus three refills.
    assert_eq!(t.decodes.get(), 4);
    assert_eq!(t.proc.stats.icache_misses, 1);
    assert_eq!(t.proc.stats.icache_refills, 3);
    // Everything else was a hit: 40 retired, one fed by the cold fetch.
    assert_eq!(t.proc.stats.icache_hits, 39);

    // The cached fetch result carries the original raw bits.
    let cached = t.proc.icache.lookup(BASE);
    assert!(cached.is_some_and(|f| f.insn.bits() == u64::from(program[0])));
}

// ══════════════════════════════════════════════════════════
// 3. Refill Locality Heuristic
// ══════════════════════════════════════════════════════════

/// Straight-line code inside one line group: after the first miss, every
/// demand access hits (the sequential refill stays one line ahead).
#[test]
fn straight_line_misses_once() {
    let mut program = vec![asm::nop(); 12];
    program.push(asm::halt());
    let mut t = bed(&program);

    t.proc.step(13);

    assert_eq!(t.proc.minstret, 13);
    assert_eq!(t.proc.stats.icache_misses, 1);
    assert_eq!(t.proc.stats.icache_refills, 12);
}

/// A taken branch right after a miss does not refill for the branch
/// target; the target pays its own demand miss.
#[test]
fn taken_branch_suppresses_refill() {
    let program = [
        asm::jmp(BASE + 12),
        asm::ebreak(),
        asm::ebreak(),
        asm::nop(),
        asm::halt(),
    ];
    let mut t = bed(&program);

    t.proc.step(1);
    assert_eq!(t.proc.stats.icache_misses, 1);
    assert_eq!(t.proc.stats.icache_refills, 0);

    t.proc.step(2);
    assert_eq!(t.proc.stats.icache_misses, 2);
}

/// Crossing the end of the line group costs one demand miss, then
/// the sequential pattern resumes.
#[test]
fn line_group_boundary_costs_one_miss() {
    // 16-line cache: words 0..15 fill the group; word 16 wraps to line 0.
    let mut program = vec![asm::nop(); 20];
    program.push(asm::halt());
    let mut t = bed(&program);

    t.proc.step(17);

    assert_eq!(t.proc.minstret, 17);
    assert_eq!(t.proc.stats.icache_misses, 2);
}

// ══════════════════════════════════════════════════════════
// 4. Invalidation Contract
// ══════════════════════════════════════════════════════════

/// After a flush, every pc is re-decoded; before it, the warm loop
/// decodes nothing new.
#[test]
fn flush_forces_full_redecode() {
    let program = [asm::nop(), asm::nop(), asm::jmp(BASE)];
    let mut t = bed(&program);

    t.proc.step(6); // warm: two trips
    let warm_decodes = t.decodes.get();
    assert_eq!(warm_decodes, 3);

    t.proc.step(3);
    assert_eq!(t.decodes.get(), warm_decodes, "warm loop must not decode");

    t.proc.flush_icache();
    t.proc.step(3);
    assert_eq!(t.decodes.get(), warm_decodes + 3);
}
