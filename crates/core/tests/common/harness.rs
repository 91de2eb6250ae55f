//! Processor test bed.
//!
//! The core never interprets instruction encodings, so the tests drive it
//! with a toy fixed-width ISA: 32-bit words whose bits `[7:2]` select a
//! behavior and bits `[31:8]` carry an operand. Low bits are `0b11` so the
//! words report a 4-byte encoded length. The mock fetch port decodes these
//! words out of a flat memory image and counts every cold decode, which is
//! what the caching tests measure.

use std::cell::{Cell, RefCell};
use std::io::{self, Write};
use std::rc::Rc;

use rvfsim_core::{
    Config, ExecFn, ExecOutcome, FetchPort, FetchResult, Insn, Processor, RegDest, Trap,
};

/// Base address programs are loaded at (and the default start pc).
pub const BASE: u64 = 0x8000_0000;

/// Opcodes of the test ISA (bits `[7:2]` of a word).
pub mod op {
    /// Fall through to `pc + 4`.
    pub const NOP: u32 = 1;
    /// Absolute jump to `BASE + operand * 4`.
    pub const JMP: u32 = 2;
    /// Serialize once, then fall through on re-execution.
    pub const FENCE: u32 = 3;
    /// Raise `Trap::Breakpoint(pc)`.
    pub const EBREAK: u32 = 4;
    /// Write `operand >> 5` to integer register `operand & 31`.
    pub const LI: u32 = 5;
    /// Write `operand >> 5` to fp register `operand & 31`.
    pub const FLI: u32 = 6;
    /// Clear the run flag, then fall through.
    pub const HALT: u32 = 8;
    /// Raise the environment call for the current privilege mode.
    pub const ECALL: u32 = 9;
    /// Request serialization unconditionally (never completes).
    pub const SERIALIZE: u32 = 10;
}

/// Word encoders for building test programs.
pub mod asm {
    use super::{BASE, op};

    const fn enc(opcode: u32, operand: u32) -> u32 {
        (operand << 8) | (opcode << 2) | 0b11
    }

    /// Fall-through instruction.
    pub const fn nop() -> u32 {
        enc(op::NOP, 0)
    }

    /// Absolute jump to `target` (must be word-aligned, at or above `BASE`).
    pub const fn jmp(target: u64) -> u32 {
        enc(op::JMP, ((target - BASE) >> 2) as u32)
    }

    /// Serialize-once barrier.
    pub const fn fence() -> u32 {
        enc(op::FENCE, 0)
    }

    /// Breakpoint trap.
    pub const fn ebreak() -> u32 {
        enc(op::EBREAK, 0)
    }

    /// Integer register write: `x[rd] = val`.
    pub const fn li(rd: u32, val: u32) -> u32 {
        enc(op::LI, (val << 5) | rd)
    }

    /// FP register write: `f[rd] = val`.
    pub const fn fli(rd: u32, val: u32) -> u32 {
        enc(op::FLI, (val << 5) | rd)
    }

    /// Cooperative halt.
    pub const fn halt() -> u32 {
        enc(op::HALT, 0)
    }

    /// Environment call.
    pub const fn ecall() -> u32 {
        enc(op::ECALL, 0)
    }

    /// Unconditional serialization request.
    pub const fn serialize() -> u32 {
        enc(op::SERIALIZE, 0)
    }
}

fn exec_nop(_: &mut Processor, _: Insn, pc: u64) -> Result<ExecOutcome, Trap> {
    Ok(ExecOutcome::jump(pc + 4))
}

fn exec_jmp(_: &mut Processor, insn: Insn, _: u64) -> Result<ExecOutcome, Trap> {
    let operand = (insn.bits() >> 8) & 0xFF_FFFF;
    Ok(ExecOutcome::jump(BASE + (operand << 2)))
}

fn exec_fence(p: &mut Processor, _: Insn, pc: u64) -> Result<ExecOutcome, Trap> {
    if p.serialized {
        p.serialized = false;
        Ok(ExecOutcome::jump(pc + 4))
    } else {
        Ok(ExecOutcome::serialize())
    }
}

fn exec_ebreak(_: &mut Processor, _: Insn, pc: u64) -> Result<ExecOutcome, Trap> {
    Err(Trap::Breakpoint(pc))
}

fn exec_li(p: &mut Processor, insn: Insn, pc: u64) -> Result<ExecOutcome, Trap> {
    let operand = (insn.bits() >> 8) & 0xFF_FFFF;
    let rd = (operand & 31) as usize;
    let val = operand >> 5;
    p.regs.write(rd, val);
    Ok(ExecOutcome::jump_with_write(pc + 4, RegDest::Int(rd as u8), val))
}

fn exec_fli(p: &mut Processor, insn: Insn, pc: u64) -> Result<ExecOutcome, Trap> {
    let operand = (insn.bits() >> 8) & 0xFF_FFFF;
    let rd = (operand & 31) as usize;
    let val = operand >> 5;
    p.regs.write_f(rd, val);
    Ok(ExecOutcome::jump_with_write(pc + 4, RegDest::Fp(rd as u8), val))
}

fn exec_halt(p: &mut Processor, _: Insn, pc: u64) -> Result<ExecOutcome, Trap> {
    p.stop();
    Ok(ExecOutcome::jump(pc + 4))
}

fn exec_ecall(p: &mut Processor, _: Insn, _: u64) -> Result<ExecOutcome, Trap> {
    use rvfsim_core::core::arch::PrivilegeMode;
    Err(match p.privilege {
        PrivilegeMode::User => Trap::EnvironmentCallFromUMode,
        PrivilegeMode::Supervisor => Trap::EnvironmentCallFromSMode,
        PrivilegeMode::Machine => Trap::EnvironmentCallFromMMode,
    })
}

fn exec_serialize(_: &mut Processor, _: Insn, _: u64) -> Result<ExecOutcome, Trap> {
    Ok(ExecOutcome::serialize())
}

fn exec_illegal(_: &mut Processor, insn: Insn, _: u64) -> Result<ExecOutcome, Trap> {
    Err(Trap::IllegalInstruction(insn.bits()))
}

/// Mock memory/decode port: a flat image at `BASE`, decoding the test ISA.
///
/// Counts every cold decode so tests can verify what the instruction
/// cache absorbed.
pub struct TestPort {
    mem: Vec<u8>,
    decodes: Rc<Cell<u64>>,
}

impl FetchPort for TestPort {
    fn decode_and_translate(&mut self, pc: u64) -> Result<FetchResult, Trap> {
        let off = match pc.checked_sub(BASE) {
            Some(off) if (off as usize) + 4 <= self.mem.len() => off as usize,
            _ => return Err(Trap::InstructionAccessFault(pc)),
        };
        self.decodes.set(self.decodes.get() + 1);

        let raw = u32::from_le_bytes([
            self.mem[off],
            self.mem[off + 1],
            self.mem[off + 2],
            self.mem[off + 3],
        ]);
        let exec: ExecFn = match (raw >> 2) & 0x3F {
            op::NOP => exec_nop,
            op::JMP => exec_jmp,
            op::FENCE => exec_fence,
            op::EBREAK => exec_ebreak,
            op::LI => exec_li,
            op::FLI => exec_fli,
            op::HALT => exec_halt,
            op::ECALL => exec_ecall,
            op::SERIALIZE => exec_serialize,
            _ => exec_illegal,
        };
        Ok(FetchResult {
            insn: Insn::new(u64::from(raw)),
            exec,
        })
    }
}

/// Commit-log sink the test keeps a handle to.
struct SharedSink(Rc<RefCell<Vec<u8>>>);

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A processor wired to observable collaborators.
pub struct TestBed {
    /// The core under test.
    pub proc: Processor,
    /// Cold decodes performed by the mock port.
    pub decodes: Rc<Cell<u64>>,
    /// Captured commit-log bytes.
    pub commit: Rc<RefCell<Vec<u8>>>,
}

impl TestBed {
    /// The captured commit log as text.
    pub fn commit_text(&self) -> String {
        String::from_utf8_lossy(&self.commit.borrow()).into_owned()
    }
}

/// A small deterministic configuration: 16 icache lines, start at `BASE`,
/// fast path, hooks off.
pub fn small_config() -> Config {
    let mut config = Config::default();
    config.core.start_pc = BASE;
    config.icache.entries = 16;
    config
}

/// Builds a test bed around `words` with the default small configuration.
pub fn bed(words: &[u32]) -> TestBed {
    bed_with(small_config(), words)
}

/// Builds a test bed around `words` with an explicit configuration.
pub fn bed_with(config: Config, words: &[u32]) -> TestBed {
    let mut mem = Vec::with_capacity(words.len() * 4);
    for w in words {
        mem.extend_from_slice(&w.to_le_bytes());
    }

    let decodes = Rc::new(Cell::new(0));
    let commit = Rc::new(RefCell::new(Vec::new()));
    let port = TestPort {
        mem,
        decodes: Rc::clone(&decodes),
    };

    let mut proc = Processor::new(0, Box::new(port), &config);
    proc.set_commit_sink(Box::new(SharedSink(Rc::clone(&commit))));

    TestBed {
        proc,
        decodes,
        commit,
    }
}
