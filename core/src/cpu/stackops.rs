//! Register/stack opcodes that never touch memory or ports.

use crate::word::Opcode;

use super::Cpu;

impl Cpu {
    pub(crate) fn exec_stackop(&mut self, op: Opcode) {
        match op {
            Opcode::Drop => {
                self.pop_data();
            }
            Opcode::Dup => {
                let t = self.t;
                self.push_data(t);
            }
            Opcode::Pop => {
                let r = self.pop_return();
                self.push_data(r);
            }
            Opcode::Over => {
                let s = self.s;
                self.push_data(s);
            }
            Opcode::A => {
                let a = self.a;
                self.push_data(a);
            }
            Opcode::Nop => {}
            Opcode::Push => {
                let t = self.pop_data();
                self.push_return(t);
            }
            Opcode::BStore => {
                let t = self.pop_data();
                self.b = t & 0x1FF;
            }
            Opcode::AStore => {
                let t = self.pop_data();
                self.a = t & crate::word::WORD_MASK;
            }
            _ => unreachable!("exec_stackop called with non-stack opcode {op:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dup_replicates_top_without_losing_s() {
        let mut cpu = Cpu::new();
        cpu.t = 7;
        cpu.s = 9;
        cpu.exec_stackop(Opcode::Dup);
        assert_eq!(cpu.t, 7);
        assert_eq!(cpu.s, 7);
        cpu.exec_stackop(Opcode::Drop);
        assert_eq!(cpu.t, 7);
        assert_eq!(cpu.s, 9);
    }

    #[test]
    fn push_then_pop_round_trips_through_return_stack() {
        let mut cpu = Cpu::new();
        cpu.t = 0x42;
        cpu.exec_stackop(Opcode::Push);
        assert_eq!(cpu.r, 0x42);
        cpu.exec_stackop(Opcode::Pop);
        assert_eq!(cpu.t, 0x42);
    }

    #[test]
    fn a_store_masks_to_18_bits_and_b_store_to_9() {
        let mut cpu = Cpu::new();
        cpu.t = 0x4_0005;
        cpu.exec_stackop(Opcode::AStore);
        assert_eq!(cpu.a, 5);

        cpu.t = 0x203;
        cpu.exec_stackop(Opcode::BStore);
        assert_eq!(cpu.b, 3);
    }
}
