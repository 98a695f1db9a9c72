//! Builds the serial byte stream a boot pin feeds into the mesh: a header,
//! one relay/load fragment per node on the trimmed canonical path (farthest
//! first), and the boot node's own trailer.
//!
//! `Chip::load_via_boot_stream` is a deliberate fast path — per its own doc
//! comment it installs a stream's body directly into the receiving node's
//! RAM rather than simulating hop-by-hop relay through intermediate nodes'
//! boot ROM. The fragments built here are still real, validly-assembled
//! GA144 words using the opcodes a relay/load pump would use, but nothing
//! here claims bit-for-bit fidelity to the undocumented silicon boot PROM —
//! there was no source for that subsystem to check against. What's
//! exercised end-to-end is the header, the path trimming, and the case
//! where the boot node is its own only target; everything else is tested
//! structurally.

use std::collections::HashSet;

use ga144_core::compiled::{CompiledNode, CompiledProgram};
use ga144_core::constants::{BOOT_MAGIC, PORT_DOWN, PORT_IO, PORT_LEFT, PORT_RIGHT, PORT_UP, RAM_RESET_FILL};
use ga144_core::coord::Coord;
use ga144_core::serial;
use ga144_core::word::{self, Opcode, SlotInput, WORD_MASK};

use crate::error::BootBuildError;
use crate::path;

/// Serializes a compiled program into a boot stream ready to hand to
/// `Chip::load_via_boot_stream` (for a single-target program) or to a real
/// boot pin.
pub fn build_boot_stream(program: &CompiledProgram) -> Result<Vec<u8>, BootBuildError> {
    if program.nodes.is_empty() {
        return Err(BootBuildError::EmptyProgram);
    }
    let targets: HashSet<Coord> = program.nodes.iter().map(|n| n.coord).collect();

    let full_path = path::canonical_path();
    let trimmed = path::trim_to_targets(&full_path, &targets)?;

    let mut body = Vec::new();
    for i in (1..trimmed.len()).rev() {
        let coord = trimmed[i];
        let port_back = port_toward(coord, trimmed[i - 1]);
        let port_forward = trimmed.get(i + 1).map(|&next| port_toward(coord, next));
        body.extend(build_node_fragment(program.node(coord), port_back, port_forward));
    }

    let first_hop_port = if trimmed.len() > 1 { port_toward(trimmed[0], trimmed[1]) } else { PORT_IO };
    let trailer = boot_node_trailer(program.node(trimmed[0]));

    // The header's declared length covers every word that follows it, body
    // and trailer together: that's what `Chip::load_via_boot_stream`'s
    // single-target fast path actually checks before dumping them flat
    // into the receiving node's RAM.
    let mut words = vec![BOOT_MAGIC as u32, first_hop_port, (body.len() + trailer.len()) as u32];
    words.extend(body);
    words.extend(trailer);

    Ok(words.into_iter().flat_map(serial::encode_word).collect())
}

/// Frame 2: the boot node's own start address, a reserved word, the code
/// length, then its code words (gaps filled with the reset pattern, since
/// the wire can't carry an absent word).
fn boot_node_trailer(boot_node: Option<&CompiledNode>) -> Vec<u32> {
    let (start_p, code): (u32, Vec<u32>) = match boot_node {
        Some(n) => (n.p.unwrap_or(0), n.mem.iter().map(|c| c.unwrap_or(RAM_RESET_FILL) & WORD_MASK).collect()),
        None => (0, Vec::new()),
    };
    let mut words = vec![start_p, 0, code.len() as u32];
    words.extend(code);
    words
}

/// One node's worth of relay plumbing: a focusing call back toward the
/// node that forwarded it this far, an optional relay stub if the path
/// continues past this node, then either a load stub plus the node's own
/// code and descriptors, or a bare `ret` for a wire-only relay node.
fn build_node_fragment(node: Option<&CompiledNode>, port_back: u32, port_forward: Option<u32>) -> Vec<u32> {
    let mut words = vec![addressed_word(Opcode::Call, port_back)];

    if let Some(next_port) = port_forward {
        words.extend(relay_stub(next_port));
    }

    match node {
        None => words.push(bare_word(&[Opcode::Ret])),
        Some(n) => {
            let code: Vec<u32> = n.mem.iter().map(|c| c.unwrap_or(RAM_RESET_FILL) & WORD_MASK).collect();
            words.extend(load_stub(code.len()));
            words.extend(code);
            if let Some(a) = n.a {
                words.extend(a_descriptor(a));
            }
            if let Some(io) = n.io {
                words.extend(io_descriptor(io));
            }
            if let Some(b) = n.b {
                words.extend(b_descriptor(b));
            }
            if let Some(stack) = n.stack.as_ref().filter(|s| !s.is_empty()) {
                words.extend(stack_descriptor(stack));
            }
            words.push(addressed_word(Opcode::Jump, n.p.unwrap_or(0)));
        }
    }

    words
}

/// `@p dup a!`, `call <next-direction-port>`: hands the forwarding port
/// address to `a!` and calls onward.
fn relay_stub(next_port: u32) -> Vec<u32> {
    let mut words = fetch_p(next_port).to_vec();
    words.push(bare_word(&[Opcode::Dup, Opcode::AStore]));
    words.push(addressed_word(Opcode::Call, next_port));
    words
}

/// `@p push !+ unext`: reads `count` code words off the wire and stores
/// them starting at RAM address 0 (A defaults there on a fresh reset, so
/// no explicit `a!` is needed first).
fn load_stub(count: usize) -> Vec<u32> {
    let mut words = fetch_p(count as u32).to_vec();
    words.push(bare_word(&[Opcode::Push]));
    words.push(bare_word(&[Opcode::StorePlus]));
    words.push(addressed_word(Opcode::Unext, 0));
    words
}

/// `@p a!`, then A's value.
fn a_descriptor(value: u32) -> Vec<u32> {
    vec![bare_word(&[Opcode::FetchP, Opcode::AStore]), value & WORD_MASK]
}

/// `@p b!` with the IO port literal, then `@p !b` with IO's value.
fn io_descriptor(value: u32) -> Vec<u32> {
    vec![
        bare_word(&[Opcode::FetchP, Opcode::BStore]),
        PORT_IO,
        bare_word(&[Opcode::FetchP, Opcode::StoreB]),
        value & WORD_MASK,
    ]
}

/// `@p b!`, then B's value.
fn b_descriptor(value: u32) -> Vec<u32> {
    vec![bare_word(&[Opcode::FetchP, Opcode::BStore]), value & WORD_MASK]
}

/// `@p push`, `stack.len - 1`, `@p unext`, then the stack values
/// themselves (deepest first), loaded in the unext loop.
fn stack_descriptor(stack: &[u32]) -> Vec<u32> {
    let mut words = vec![
        bare_word(&[Opcode::FetchP, Opcode::Push]),
        (stack.len().saturating_sub(1) as u32) & WORD_MASK,
        addressed_word_with_lead(Opcode::FetchP, Opcode::Unext, 0),
    ];
    words.extend(stack.iter().map(|&v| v & WORD_MASK));
    words
}

/// `@p` alone, followed by its literal. `@p` always ends the word it's in
/// (it forces a refetch of the next word as the literal), so anything
/// meant to run after it has to live in a later word.
fn fetch_p(literal: u32) -> [u32; 2] {
    [bare_word(&[Opcode::FetchP]), literal & WORD_MASK]
}

/// Packs up to four non-address-class opcodes into one word, padding the
/// rest with `.` (Nop).
fn bare_word(ops: &[Opcode]) -> u32 {
    let mut slots = [SlotInput::Empty; 4];
    for (slot, &op) in slots.iter_mut().zip(ops) {
        *slot = SlotInput::Op(op);
    }
    word::xor_encode(word::assemble(slots).expect("boot-stream plumbing words are always valid"))
}

/// One address-class opcode alone in slot 0, address masked to 10 bits.
fn addressed_word(op: Opcode, addr: u32) -> u32 {
    let slots = [SlotInput::Addressed(op, addr & 0x3FF), SlotInput::Empty, SlotInput::Empty, SlotInput::Empty];
    word::xor_encode(word::assemble(slots).expect("boot-stream plumbing words are always valid"))
}

/// A non-address-class opcode in slot 0 followed by an address-class
/// opcode in slot 1, e.g. `@p unext`.
fn addressed_word_with_lead(lead: Opcode, addr_op: Opcode, addr: u32) -> u32 {
    let slots = [SlotInput::Op(lead), SlotInput::Addressed(addr_op, addr & 0xFF), SlotInput::Empty, SlotInput::Empty];
    word::xor_encode(word::assemble(slots).expect("boot-stream plumbing words are always valid"))
}

/// Which port address on `from` points toward the orthogonally adjacent
/// `to`, matching the parity rules `ga144_core::port` uses to resolve the
/// same addresses back into directions.
fn port_toward(from: Coord, to: Coord) -> u32 {
    let dr = to.row() as i32 - from.row() as i32;
    let dc = to.col() as i32 - from.col() as i32;
    match (dr, dc) {
        (0, 1) => {
            if from.east_port_is_right() {
                PORT_RIGHT
            } else {
                PORT_LEFT
            }
        }
        (0, -1) => {
            if from.east_port_is_right() {
                PORT_LEFT
            } else {
                PORT_RIGHT
            }
        }
        (-1, 0) => {
            if from.south_port_is_up() {
                PORT_UP
            } else {
                PORT_DOWN
            }
        }
        (1, 0) => {
            if from.south_port_is_up() {
                PORT_DOWN
            } else {
                PORT_UP
            }
        }
        _ => PORT_IO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ga144_core::compiled::CompiledNode;
    use ga144_core::word::xor_decode;

    fn node(coord: Coord, mem: Vec<Option<u32>>, p: Option<u32>) -> CompiledNode {
        CompiledNode { coord, len: mem.len(), mem, p, a: None, b: None, io: None, stack: None }
    }

    #[test]
    fn port_toward_matches_the_neighboring_direction() {
        let a = Coord::try_from(708).unwrap(); // row 7, col 8: odd row, even col
        let east = Coord::try_from(709).unwrap();
        let south_toward_row_0 = Coord::try_from(608).unwrap();
        assert_eq!(port_toward(a, east), PORT_RIGHT);
        assert_eq!(port_toward(a, south_toward_row_0), PORT_UP);
    }

    #[test]
    fn relay_stub_decodes_to_a_call_toward_the_next_port() {
        let words = relay_stub(PORT_RIGHT);
        let last = *words.last().unwrap();
        let decoded = word::disassemble(xor_decode(last));
        assert!(matches!(
            decoded.first(),
            Some(word::DecodedSlot::Addressed(Opcode::Call, addr)) if *addr == PORT_RIGHT
        ));
    }

    #[test]
    fn load_stub_has_five_words() {
        assert_eq!(load_stub(3).len(), 5);
    }

    #[test]
    fn empty_program_is_rejected() {
        let program = CompiledProgram { nodes: Vec::new(), errors: Vec::new(), warnings: None };
        assert_eq!(build_boot_stream(&program), Err(BootBuildError::EmptyProgram));
    }

    #[test]
    fn single_target_stream_round_trips_through_the_serial_codec() {
        let coord = Coord::try_from(708).unwrap();
        let program = CompiledProgram {
            nodes: vec![node(coord, vec![Some(0xAA), Some(0x55)], Some(0))],
            errors: Vec::new(),
            warnings: None,
        };
        let bytes = build_boot_stream(&program).unwrap();
        assert_eq!(bytes.len() % 3, 0);
        let words = serial::decode_words(&bytes).unwrap();
        assert_eq!(words[0], BOOT_MAGIC as u32);
        // the boot node itself carries no relay fragment, only the frame-2
        // trailer: start_p, reserved, code_len, then the code words. The
        // declared length covers all of it (3 trailer header words + 2
        // code words).
        assert_eq!(words[2], 5);
        assert_eq!(words[3], 0);
        assert_eq!(words[5], 2);
        assert_eq!(words[6], 0xAA);
        assert_eq!(words[7], 0x55);
    }

    #[test]
    fn target_off_path_is_unreachable_for_any_valid_coord_but_trim_still_validates() {
        // every valid Coord lies on the canonical path, so this exercises
        // the happy path instead: a two-hop program trims to exactly those
        // two nodes.
        let boot = Coord::try_from(708).unwrap();
        let next = Coord::try_from(709).unwrap();
        let program = CompiledProgram {
            nodes: vec![node(boot, vec![], Some(0)), node(next, vec![Some(0x10)], Some(0))],
            errors: Vec::new(),
            warnings: None,
        };
        let bytes = build_boot_stream(&program).unwrap();
        let words = serial::decode_words(&bytes).unwrap();
        assert_eq!(words[0], BOOT_MAGIC as u32);
        assert_eq!(words[1], PORT_RIGHT);
        assert!(words[2] > 0, "relaying to node 709 needs a non-empty frame-1 body");
    }
}
