//! Memory and port opcodes: `@`-family pushes, `!`-family
//! pops-and-stores, dispatched across RAM, ROM, the plain IO register, or a
//! neighbor rendezvous depending on the effective address.

use crate::constants::IO_ADDR_BIT;
use crate::port::port_directions;
use crate::word::Opcode;

use super::{increment_address, CoreState, Cpu, StepContext};

impl Cpu {
    /// Executes one memory opcode. Returns `true` if the node just blocked
    /// on a port rendezvous (the chip's per-node step counter should not
    /// advance for this tick).
    pub(crate) fn exec_memory(&mut self, op: Opcode, ctx: &mut StepContext) -> bool {
        match op {
            Opcode::FetchP => {
                let addr = self.p;
                self.p = increment_address(self.p);
                self.do_read(addr, ctx, true)
            }
            Opcode::FetchPlus => {
                let addr = self.a;
                self.a = increment_address(self.a);
                self.do_read(addr, ctx, false)
            }
            Opcode::FetchB => self.do_read(self.b, ctx, false),
            Opcode::Fetch => self.do_read(self.a, ctx, false),
            Opcode::StoreP => {
                let addr = self.p;
                self.p = increment_address(self.p);
                self.do_write(addr, ctx, true)
            }
            Opcode::StorePlus => {
                let addr = self.a;
                self.a = increment_address(self.a);
                self.do_write(addr, ctx, false)
            }
            Opcode::StoreB => self.do_write(self.b, ctx, false),
            Opcode::Store => self.do_write(self.a, ctx, false),
            _ => unreachable!("exec_memory called with non-memory opcode {op:?}"),
        }
    }

    fn do_read(&mut self, addr: u32, ctx: &mut StepContext, terminates: bool) -> bool {
        let addr = addr & 0x1FF;
        if addr & IO_ADDR_BIT == 0 {
            let value = self.mem_read(addr);
            self.push_data(value);
            self.advance_after(terminates);
            return false;
        }

        if port_directions(ctx.coord, addr).is_empty() {
            let value = self.io;
            self.push_data(value);
            self.advance_after(terminates);
            return false;
        }

        match ctx.fabric.try_read(ctx.coord, addr) {
            Some((value, _from)) => {
                self.push_data(value);
                self.advance_after(terminates);
                false
            }
            None => {
                self.state = CoreState::BlockedRead { addr, terminates };
                true
            }
        }
    }

    fn do_write(&mut self, addr: u32, ctx: &mut StepContext, terminates: bool) -> bool {
        let addr = addr & 0x1FF;
        let value = self.pop_data();

        if addr & IO_ADDR_BIT == 0 {
            self.mem_write(addr, value);
            self.advance_after(terminates);
            return false;
        }

        if port_directions(ctx.coord, addr).is_empty() {
            self.io = value;
            ctx.io_log.push(ctx.coord, value);
            self.advance_after(terminates);
            return false;
        }

        match ctx.fabric.try_write(ctx.coord, addr, value) {
            Some(_neighbor) => {
                self.advance_after(terminates);
                false
            }
            None => {
                self.state = CoreState::BlockedWrite { addr, value, terminates };
                true
            }
        }
    }
}
