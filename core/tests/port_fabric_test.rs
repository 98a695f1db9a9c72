//! Physical rendezvous between two adjacent nodes, driven through a real
//! `Chip` rather than `PortFabric` directly (that's covered inline in
//! `port.rs`): one node stores to its east neighbor, the other fetches
//! from its west neighbor, in the same tick.

use ga144_core::chip::Chip;
use ga144_core::compiled::{CompiledNode, CompiledProgram};
use ga144_core::constants::{PORT_LEFT, PORT_RIGHT};
use ga144_core::coord::Coord;
use ga144_core::word::{self, Opcode, SlotInput};

fn bare_word(op: Opcode) -> u32 {
    let instr = word::assemble([SlotInput::Op(op), SlotInput::Empty, SlotInput::Empty, SlotInput::Empty]).unwrap();
    word::xor_encode(instr)
}

#[test]
fn a_store_toward_a_neighbor_is_visible_through_its_matching_fetch() {
    // Writer is west of reader (lower column, so lower node index, so
    // `Chip::step` reaches it first within the same tick).
    let writer = Coord::new(2, 4).unwrap();
    let reader = Coord::new(2, 5).unwrap();
    assert!(writer.index() < reader.index());

    let writer_addr = if writer.east_port_is_right() { PORT_RIGHT } else { PORT_LEFT };
    let reader_addr = if reader.east_port_is_right() { PORT_LEFT } else { PORT_RIGHT };

    let program = CompiledProgram {
        nodes: vec![
            CompiledNode {
                coord: writer,
                len: 1,
                mem: vec![Some(bare_word(Opcode::Store))],
                p: Some(0),
                a: Some(writer_addr),
                b: None,
                io: None,
                stack: Some(vec![0x99]),
            },
            CompiledNode {
                coord: reader,
                len: 1,
                mem: vec![Some(bare_word(Opcode::Fetch))],
                p: Some(0),
                a: Some(reader_addr),
                b: None,
                io: None,
                stack: None,
            },
        ],
        errors: Vec::new(),
        warnings: None,
    };

    let mut chip = Chip::new("port-fabric-test");
    chip.load(&program);
    chip.step();

    let snap = chip.snapshot(None);
    assert_eq!(snap.node(reader).unwrap().t, 0x99);
}
