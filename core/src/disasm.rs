//! Inverse of the word codec, plus the presentation rules tooling needs:
//! literal detection after `@p`/`!p`, resolved branch targets, and
//! symbolic port names.

use crate::constants::{PORT_DOWN, PORT_IO, PORT_LEFT, PORT_RDLU, PORT_RIGHT, PORT_UP};
use crate::word::{self, BRANCH_PRESERVE_MASK, DecodedSlot, Opcode};

/// Disassembles a contiguous run of memory starting at word address 0,
/// producing one line of pipe-separated slot text per instruction word.
/// A word immediately following `@p`/`!p` is rendered as a bare literal
/// instead of being decoded, since the assembler placed raw data there.
pub fn disassemble_node(mem: &[u32]) -> Vec<String> {
    let mut lines = Vec::with_capacity(mem.len());
    let mut addr = 0usize;
    while addr < mem.len() {
        let decoded_word = word::xor_decode(mem[addr]);
        let slots = word::disassemble(decoded_word);
        let takes_literal = slots
            .iter()
            .any(|slot| matches!(slot, DecodedSlot::Op(op) if op.takes_inline_literal()));
        lines.push(format_slots(&slots, addr as u32));
        addr += 1;

        if takes_literal && addr < mem.len() {
            lines.push(format!("{:#07x}", mem[addr]));
            addr += 1;
        }
    }
    lines
}

fn format_slots(slots: &[DecodedSlot], word_addr: u32) -> String {
    slots
        .iter()
        .enumerate()
        .map(|(slot_index, slot)| format_slot(slot, slot_index, word_addr))
        .collect::<Vec<_>>()
        .join("|")
}

fn format_slot(slot: &DecodedSlot, slot_index: usize, word_addr: u32) -> String {
    match slot {
        DecodedSlot::Op(op) => op.mnemonic().to_string(),
        DecodedSlot::Addressed(op, addr) => {
            let shown = match op {
                Opcode::Jump | Opcode::Call | Opcode::Next | Opcode::If | Opcode::MinusIf => {
                    effective_target(word_addr, slot_index, *addr)
                }
                _ => *addr,
            };
            format!("{} {}", op.mnemonic(), symbolic_or_hex(shown))
        }
    }
}

/// Applies the slot's preserved-bits mask against `word_addr + 1` (the P
/// value after this word's fetch) to recover the absolute branch target.
fn effective_target(word_addr: u32, slot_index: usize, addr: u32) -> u32 {
    let mask = BRANCH_PRESERVE_MASK[slot_index];
    ((word_addr + 1) & mask) | addr
}

fn symbolic_or_hex(addr: u32) -> String {
    match addr {
        PORT_IO => "IO".to_string(),
        PORT_RIGHT => "RIGHT".to_string(),
        PORT_LEFT => "LEFT".to_string(),
        PORT_UP => "UP".to_string(),
        PORT_DOWN => "DOWN".to_string(),
        PORT_RDLU => "RDLU".to_string(),
        _ => format!("{addr:#x}"),
    }
}
