//! The single-node fetch/decode/execute engine. `Cpu`
//! owns one F18A core's registers, stacks, and local RAM/ROM; the chip
//! orchestrator drives it one slot at a time via [`Cpu::step`], supplying
//! mesh-shared state (the port fabric, the IO write log) through
//! [`StepContext`] rather than letting nodes reach into each other.

mod alu;
mod branch;
mod memory;
mod stackops;

use crate::constants::{
    EXTENDED_ARITH_BIT, IO_ADDR_BIT, PORT_IO, PORT_RDLU, RAM_SIZE, ROM_SIZE, STACK_RESET_FILL,
};
use crate::coord::Coord;
use crate::io::IoRing;
use crate::port::PortFabric;
use crate::stack::CircularStack;
use crate::word::{self, DecodedSlot, Opcode};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum CoreState {
    Running,
    BlockedRead { addr: u32, terminates: bool },
    BlockedWrite { addr: u32, value: u32, terminates: bool },
    Suspended,
}

impl CoreState {
    pub fn label(self) -> &'static str {
        match self {
            CoreState::Running => "running",
            CoreState::BlockedRead { .. } => "blocked_read",
            CoreState::BlockedWrite { .. } => "blocked_write",
            CoreState::Suspended => "suspended",
        }
    }
}

/// Mesh-shared state a node's step needs but does not own.
pub struct StepContext<'a> {
    pub coord: Coord,
    pub fabric: &'a mut PortFabric,
    pub io_log: &'a mut IoRing,
}

pub struct Cpu {
    pub p: u32,
    pub i: u32,
    pub slot: u8,
    pub a: u32,
    pub b: u32,
    pub t: u32,
    pub s: u32,
    pub r: u32,
    pub io: u32,
    pub d_stack: CircularStack,
    pub r_stack: CircularStack,
    pub ram: [u32; RAM_SIZE as usize],
    pub rom: [u32; ROM_SIZE as usize],
    pub state: CoreState,
    pub step_count: u64,
    /// Bit 9 of the last slot-0/1 `jump`/`call`'s raw word, captured and
    /// exposed read-only; no opcode consults it.
    pub extended_arith: bool,
}

impl Cpu {
    pub fn new() -> Self {
        let mut cpu = Self {
            p: 0,
            i: 0,
            slot: 4,
            a: 0,
            b: PORT_IO,
            t: STACK_RESET_FILL,
            s: STACK_RESET_FILL,
            r: STACK_RESET_FILL,
            io: STACK_RESET_FILL,
            d_stack: CircularStack::filled_with(STACK_RESET_FILL),
            r_stack: CircularStack::filled_with(STACK_RESET_FILL),
            ram: [crate::constants::RAM_RESET_FILL; RAM_SIZE as usize],
            rom: [STACK_RESET_FILL; ROM_SIZE as usize],
            state: CoreState::Running,
            step_count: 0,
            extended_arith: false,
        };
        cpu.reset(false);
        cpu
    }

    /// Reinitializes everything reset() touches: RAM to
    /// the warm-call pattern, stacks to the all-nop pattern, registers to
    /// their canonical defaults, `P` to the boot or cold entry, then one
    /// fetch so observers see `P == start + 1`. ROM is left untouched —
    /// it is supplied once by the loader and treated as read-only mapped
    /// memory.
    pub fn reset(&mut self, is_boot_node: bool) {
        self.ram = [crate::constants::RAM_RESET_FILL; RAM_SIZE as usize];
        self.d_stack = CircularStack::filled_with(STACK_RESET_FILL);
        self.r_stack = CircularStack::filled_with(STACK_RESET_FILL);
        self.a = 0;
        self.b = PORT_IO;
        self.t = STACK_RESET_FILL;
        self.s = STACK_RESET_FILL;
        self.r = STACK_RESET_FILL;
        self.io = STACK_RESET_FILL;
        self.p = if is_boot_node {
            crate::constants::BOOT_START_P
        } else {
            crate::constants::COLD_START_P
        };
        self.slot = 4;
        self.step_count = 0;
        self.extended_arith = false;
        self.fetch();

        // Boot nodes start executing their boot ROM immediately; every
        // other node parks on the multiport listening for relayed boot
        // code to arrive over the mesh.
        self.state = if is_boot_node {
            CoreState::Running
        } else {
            CoreState::BlockedRead { addr: PORT_RDLU, terminates: true }
        };
    }

    /// One fetch/decode cycle: reads `mem[P]`, XOR-decodes it into `I`,
    /// advances `P` by the address-region-aware increment rule, and resets
    /// the slot cursor.
    pub fn fetch(&mut self) {
        let raw = self.mem_read(self.p);
        self.i = word::xor_decode(raw);
        self.p = increment_address(self.p);
        self.slot = 0;
    }

    /// Advances the chip-visible node state by one slot. Does
    /// nothing if suspended; resumes a blocked port operation if a peer has
    /// since parked; otherwise executes the current slot of `I`.
    pub fn step(&mut self, ctx: &mut StepContext) {
        match self.state {
            CoreState::Suspended => return,
            CoreState::BlockedRead { addr, terminates } => {
                if let Some((value, _from)) = ctx.fabric.try_read(ctx.coord, addr) {
                    self.push_data(value);
                    self.state = CoreState::Running;
                    self.advance_after(terminates);
                    self.step_count += 1;
                }
                return;
            }
            CoreState::BlockedWrite { addr, value, terminates } => {
                if ctx.fabric.try_write(ctx.coord, addr, value).is_some() {
                    self.state = CoreState::Running;
                    self.advance_after(terminates);
                    self.step_count += 1;
                }
                return;
            }
            CoreState::Running => {}
        }

        if self.slot >= 4 {
            self.fetch();
        }

        let decoded = word::disassemble(self.i);
        let Some(slot_result) = decoded.get(self.slot as usize).copied() else {
            // The remaining slots of this word were never independently
            // decodable (an earlier slot consumed them); fall through to
            // the next word.
            self.slot = 4;
            self.step_count += 1;
            return;
        };

        let blocked = match slot_result {
            DecodedSlot::Op(op) => match op {
                Opcode::FetchP
                | Opcode::FetchPlus
                | Opcode::FetchB
                | Opcode::Fetch
                | Opcode::StoreP
                | Opcode::StorePlus
                | Opcode::StoreB
                | Opcode::Store => self.exec_memory(op, ctx),
                Opcode::MulStep
                | Opcode::ShiftLeft
                | Opcode::ShiftRight
                | Opcode::Not
                | Opcode::Plus
                | Opcode::And
                | Opcode::Or => {
                    self.exec_alu(op);
                    self.slot += 1;
                    false
                }
                _ => {
                    self.exec_stackop(op);
                    self.slot += 1;
                    false
                }
            },
            DecodedSlot::Addressed(op, addr) => {
                let slot_index = self.slot as usize;
                self.exec_branch(op, addr, slot_index);
                false
            }
        };

        if !blocked {
            self.step_count += 1;
        }
    }

    fn advance_after(&mut self, terminates: bool) {
        if terminates {
            self.slot = 4;
        } else {
            self.slot += 1;
        }
    }

    /// Pushes `value` as the new `T`, shifting the old `T`/`S` down into the
    /// circular D-stack.
    pub(crate) fn push_data(&mut self, value: u32) {
        self.d_stack.push(self.s);
        self.s = self.t;
        self.t = value & crate::word::WORD_MASK;
    }

    /// Pops `T`, pulling `S` up from the D-stack.
    pub(crate) fn pop_data(&mut self) -> u32 {
        let value = self.t;
        self.t = self.s;
        self.s = self.d_stack.pop();
        value
    }

    pub(crate) fn push_return(&mut self, value: u32) {
        self.r_stack.push(self.r);
        self.r = value & crate::word::WORD_MASK;
    }

    pub(crate) fn pop_return(&mut self) -> u32 {
        let value = self.r;
        self.r = self.r_stack.pop();
        value
    }

    fn mem_read(&self, addr: u32) -> u32 {
        let a = addr & 0x1FF;
        if a & 0x80 != 0 {
            self.rom[(a & 0x3F) as usize]
        } else {
            self.ram[(a & 0x3F) as usize]
        }
    }

    fn mem_write(&mut self, addr: u32, value: u32) {
        let a = addr & 0x1FF;
        if a & 0x80 == 0 {
            self.ram[(a & 0x3F) as usize] = value & crate::word::WORD_MASK;
        }
        // ROM is read-only mapped memory: writes are dropped.
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

/// The address-region-aware increment shared by `P`'s post-fetch advance
/// and the `p`/`+` memory variants' post-increment:
/// IO addresses never increment; RAM wraps within `0x00..0x7F`; ROM wraps
/// within `0x80..0xFF`; bit 9 (extended-arith) rides along unchanged.
pub fn increment_address(addr: u32) -> u32 {
    let ext = addr & EXTENDED_ARITH_BIT;
    let low = addr & 0x1FF;
    let incremented = if low & IO_ADDR_BIT != 0 {
        low
    } else if low & 0x80 != 0 {
        0x80 | (low.wrapping_add(1) & 0x7F)
    } else {
        low.wrapping_add(1) & 0x7F
    };
    ext | incremented
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ram_address_wraps_at_0x7f() {
        assert_eq!(increment_address(0x7F), 0x00);
        assert_eq!(increment_address(0x3F), 0x40);
    }

    #[test]
    fn rom_address_wraps_within_its_half() {
        assert_eq!(increment_address(0xFF), 0x80);
        assert_eq!(increment_address(0xBF), 0xC0);
    }

    #[test]
    fn io_address_never_increments() {
        assert_eq!(increment_address(PORT_IO), PORT_IO);
    }

    #[test]
    fn extended_arith_bit_rides_through_increment() {
        let addr = 0x3F | EXTENDED_ARITH_BIT;
        assert_eq!(increment_address(addr) & EXTENDED_ARITH_BIT, EXTENDED_ARITH_BIT);
    }

    #[test]
    fn reset_sets_boot_and_cold_start_p() {
        let mut cpu = Cpu::new();
        cpu.reset(true);
        assert_eq!(cpu.p, increment_address(crate::constants::BOOT_START_P));
        cpu.reset(false);
        assert_eq!(cpu.p, increment_address(crate::constants::COLD_START_P));
    }
}
