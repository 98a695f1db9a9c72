//! Pass two: walks a [`NodeBlock`], packs opcodes into 18-bit words the
//! same way the hardware would, and resolves every label and structured
//! control-flow marker to a concrete address.
//!
//! Label addresses never depend on what a branch eventually targets, so a
//! lightweight first walk ([`scan_labels`]) replays the exact same packing
//! timing as the real emission walk to discover where every label and data
//! word lands, before the second walk ([`emit_node`]) builds any words.
//!
//! Structured control flow (`for`/`begin`/`then`/`while`/`end`) is this
//! assembler's own convention, not part of the instruction set: an
//! address-class opcode written with no explicit operand is "implicit" and
//! resolves against one of two compile-time stacks. `for`/`begin` push the
//! current (word-aligned) address; the next implicit branch pops it and
//! targets it directly, closing a loop. An implicit branch with nothing on
//! that stack instead pushes its own `(word, slot)` site onto a second
//! stack, to be backpatched by a later `then` or `while` once the
//! fall-through address is known. `end` just drops whatever `for`/`begin`
//! address is still outstanding.

use std::collections::HashMap;

use ga144_core::compiled::{CompiledNode, Diagnostic};
use ga144_core::word::{self, Opcode, SlotInput};

use crate::parser::{Instr, NodeBlock, NodeItem, Operand};

struct Packer {
    addr: u32,
    slot: usize,
    buf: [SlotInput; 4],
}

/// A word the packer just finished, along with the slot inputs it was
/// built from (the emitter needs those again later to backpatch a forward
/// branch without re-deriving them).
struct PackedWord {
    addr: u32,
    slots: [SlotInput; 4],
}

impl Packer {
    fn new(start: u32) -> Self {
        Self { addr: start, slot: 0, buf: [SlotInput::Empty; 4] }
    }

    fn flush_if_partial(&mut self) -> Option<PackedWord> {
        if self.slot > 0 {
            Some(self.flush())
        } else {
            None
        }
    }

    fn flush(&mut self) -> PackedWord {
        while self.slot < 4 {
            self.buf[self.slot] = SlotInput::Op(Opcode::Nop);
            self.slot += 1;
        }
        let word = PackedWord { addr: self.addr, slots: self.buf };
        self.addr += 1;
        self.slot = 0;
        self.buf = [SlotInput::Empty; 4];
        word
    }

    /// Places one opcode, returning the `(word, slot)` it landed in, plus a
    /// completed word if placing it caused a flush. Address-class opcodes
    /// (and `@p`/`!p`, which also end the word at runtime regardless of
    /// slot) never land in slot 3, where an address-class opcode's address
    /// field would be forced to zero; placing one there instead pads the
    /// rest of the current word and starts fresh. A plain opcode that just
    /// happens to land in slot 3 is subject to the same rule if its index
    /// doesn't survive the 3-bit slot-3 field (`slot3_representable`) —
    /// otherwise it starts a fresh word instead of producing an
    /// unassemblable one.
    fn place(&mut self, input: SlotInput, terminates: bool) -> ((u32, usize), Vec<PackedWord>) {
        let mut completed = Vec::new();
        if self.slot == 3 && (terminates || !input.opcode().slot3_representable()) {
            completed.push(self.flush());
        }
        let landed = (self.addr, self.slot);
        self.buf[self.slot] = input;
        self.slot += 1;
        if terminates || self.slot == 4 {
            completed.push(self.flush());
        }
        (landed, completed)
    }

    /// Reserves one whole word for a bare data literal, which is never
    /// slot-packed. Only valid right after a flush.
    fn reserve_word(&mut self) -> u32 {
        debug_assert_eq!(self.slot, 0);
        let addr = self.addr;
        self.addr += 1;
        addr
    }

    fn current_addr(&self) -> u32 {
        self.addr
    }
}

pub fn scan_labels(items: &[NodeItem]) -> HashMap<String, u32> {
    let mut labels = HashMap::new();
    let mut packer = Packer::new(0);

    for item in items {
        match item {
            NodeItem::Org(n) => {
                packer.flush_if_partial();
                packer = Packer::new(*n);
            }
            NodeItem::Label(name) => {
                packer.flush_if_partial();
                labels.insert(name.clone(), packer.current_addr());
            }
            NodeItem::LoopMark | NodeItem::Then | NodeItem::While | NodeItem::End | NodeItem::Warm => {
                packer.flush_if_partial();
            }
            NodeItem::Data(_) => {
                packer.flush_if_partial();
                packer.reserve_word();
            }
            NodeItem::Instr { instr, .. } => match instr {
                Instr::Bare(op) => {
                    packer.place(SlotInput::Op(*op), false);
                }
                Instr::Addressed(op, _) | Instr::Implicit(op) | Instr::Terminator(op) => {
                    packer.place(SlotInput::Addressed(*op, 0), true);
                }
                Instr::InlineLiteral(op, _) => {
                    packer.place(SlotInput::Op(*op), true);
                    packer.reserve_word();
                }
            },
        }
    }
    packer.flush_if_partial();

    labels
}

pub fn emit_node(block: &NodeBlock, errors: &mut Vec<Diagnostic>) -> CompiledNode {
    let labels = scan_labels(&block.items);
    let mut mem: Vec<Option<u32>> = Vec::new();
    let mut warm_addr: Option<u32> = None;

    let mut packer = Packer::new(0);
    let mut loop_stack: Vec<u32> = Vec::new();
    let mut patch_stack: Vec<(usize, usize)> = Vec::new(); // (word index into `mem`, slot)
    let mut slot_inputs: HashMap<usize, [SlotInput; 4]> = HashMap::new();

    let resolve = |operand: &Operand, errors: &mut Vec<Diagnostic>, line: u32, col: u32| -> u32 {
        match operand {
            Operand::Number(n) => *n,
            Operand::Label(name) => match labels.get(name) {
                Some(addr) => *addr,
                None => {
                    errors.push(Diagnostic::new(line, col, format!("undefined label '{name}'")));
                    0
                }
            },
        }
    };

    for item in &block.items {
        match item {
            NodeItem::Org(n) => {
                store_completed(packer.flush_if_partial(), &mut mem, &mut slot_inputs, errors);
                packer = Packer::new(*n);
            }
            NodeItem::Label(_) => {
                store_completed(packer.flush_if_partial(), &mut mem, &mut slot_inputs, errors);
            }
            NodeItem::Warm => {
                store_completed(packer.flush_if_partial(), &mut mem, &mut slot_inputs, errors);
                warm_addr = Some(packer.current_addr());
            }
            NodeItem::LoopMark => {
                store_completed(packer.flush_if_partial(), &mut mem, &mut slot_inputs, errors);
                loop_stack.push(packer.current_addr());
            }
            NodeItem::End => {
                store_completed(packer.flush_if_partial(), &mut mem, &mut slot_inputs, errors);
                loop_stack.pop();
            }
            NodeItem::Then | NodeItem::While => {
                store_completed(packer.flush_if_partial(), &mut mem, &mut slot_inputs, errors);
                if let Some((word_addr, slot)) = patch_stack.pop() {
                    backpatch(word_addr, slot, packer.current_addr(), &mut mem, &mut slot_inputs, errors);
                } else {
                    errors.push(Diagnostic::new(0, 0, "'then'/'while' with nothing to close"));
                }
            }
            NodeItem::Data(operand) => {
                store_completed(packer.flush_if_partial(), &mut mem, &mut slot_inputs, errors);
                let addr = packer.reserve_word();
                let value = resolve(operand, errors, 0, 0);
                ensure_len(&mut mem, addr as usize + 1);
                mem[addr as usize] = Some(value & word::WORD_MASK);
            }
            NodeItem::Instr { instr, line, col } => match instr {
                Instr::Bare(op) => {
                    let (_, done) = packer.place(SlotInput::Op(*op), false);
                    store_completed(done.into_iter().next(), &mut mem, &mut slot_inputs, errors);
                }
                Instr::Addressed(op, operand) => {
                    let addr = resolve(operand, errors, *line, *col);
                    let (_, done) = packer.place(SlotInput::Addressed(*op, addr), true);
                    store_all(done, &mut mem, &mut slot_inputs, errors);
                }
                Instr::Implicit(op) => {
                    if let Some(target) = loop_stack.pop() {
                        let (_, done) = packer.place(SlotInput::Addressed(*op, target), true);
                        store_all(done, &mut mem, &mut slot_inputs, errors);
                    } else {
                        let ((word_addr, slot), done) = packer.place(SlotInput::Addressed(*op, 0), true);
                        store_all(done, &mut mem, &mut slot_inputs, errors);
                        patch_stack.push((word_addr as usize, slot));
                    }
                }
                Instr::InlineLiteral(op, operand) => {
                    let (_, done) = packer.place(SlotInput::Op(*op), true);
                    store_all(done, &mut mem, &mut slot_inputs, errors);
                    let addr = packer.reserve_word();
                    let value = resolve(operand, errors, *line, *col);
                    ensure_len(&mut mem, addr as usize + 1);
                    mem[addr as usize] = Some(value & word::WORD_MASK);
                }
                Instr::Terminator(op) => {
                    let (_, done) = packer.place(SlotInput::Addressed(*op, 0), true);
                    store_all(done, &mut mem, &mut slot_inputs, errors);
                }
            },
        }
    }
    store_completed(packer.flush_if_partial(), &mut mem, &mut slot_inputs, errors);

    if !patch_stack.is_empty() {
        errors.push(Diagnostic::new(0, 0, "unresolved forward branch: missing 'then' or 'while'"));
    }

    let len = mem.len();
    CompiledNode { coord: block.coord, mem, len, p: warm_addr, a: None, b: None, io: None, stack: None }
}

fn store_all(
    words: Vec<PackedWord>,
    mem: &mut Vec<Option<u32>>,
    slot_inputs: &mut HashMap<usize, [SlotInput; 4]>,
    errors: &mut Vec<Diagnostic>,
) {
    for word in words {
        store_completed(Some(word), mem, slot_inputs, errors);
    }
}

fn store_completed(
    word: Option<PackedWord>,
    mem: &mut Vec<Option<u32>>,
    slot_inputs: &mut HashMap<usize, [SlotInput; 4]>,
    errors: &mut Vec<Diagnostic>,
) {
    let Some(PackedWord { addr, slots }) = word else { return };
    match word::assemble(slots) {
        Ok(decoded) => {
            ensure_len(mem, addr as usize + 1);
            mem[addr as usize] = Some(word::xor_encode(decoded));
            slot_inputs.insert(addr as usize, slots);
        }
        Err(e) => errors.push(Diagnostic::new(0, 0, e.to_string())),
    }
}

fn backpatch(
    word_addr: usize,
    slot: usize,
    target: u32,
    mem: &mut [Option<u32>],
    slot_inputs: &mut HashMap<usize, [SlotInput; 4]>,
    errors: &mut Vec<Diagnostic>,
) {
    let Some(slots) = slot_inputs.get_mut(&word_addr) else { return };
    let SlotInput::Addressed(op, _) = slots[slot] else {
        errors.push(Diagnostic::new(0, 0, "internal error: backpatch target is not an addressed slot"));
        return;
    };
    slots[slot] = SlotInput::Addressed(op, target);
    match word::assemble(*slots) {
        Ok(decoded) => mem[word_addr] = Some(word::xor_encode(decoded)),
        Err(e) => errors.push(Diagnostic::new(0, 0, e.to_string())),
    }
}

fn ensure_len(mem: &mut Vec<Option<u32>>, len: usize) {
    if mem.len() < len {
        mem.resize(len, None);
    }
}
