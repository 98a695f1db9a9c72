//! Chip-wide lifecycle invariants: reset determinism, and that `load`
//! brings a node to `Running` and overrides only the fields it names.

use ga144_core::chip::Chip;
use ga144_core::compiled::{CompiledNode, CompiledProgram};
use ga144_core::coord::Coord;
use ga144_core::cpu::CoreState;

#[test]
fn two_freshly_reset_chips_are_identical() {
    let a = Chip::new("a");
    let mut b = Chip::new("b");
    b.reset();

    let snap_a = a.snapshot(None);
    let snap_b = b.snapshot(None);

    assert_eq!(snap_a.nodes.len(), snap_b.nodes.len());
    for (node_a, node_b) in snap_a.nodes.iter().zip(snap_b.nodes.iter()) {
        assert_eq!(node_a.p, node_b.p);
        assert_eq!(node_a.t, node_b.t);
        assert_eq!(node_a.s, node_b.s);
        assert_eq!(node_a.ram, node_b.ram);
        assert_eq!(node_a.rom, node_b.rom);
        assert_eq!(node_a.state, node_b.state);
    }
}

#[test]
fn load_sets_only_the_fields_a_compiled_node_names() {
    let coord = Coord::try_from(0).unwrap();
    let program = CompiledProgram {
        nodes: vec![CompiledNode {
            coord,
            len: 1,
            mem: vec![Some(0x1234)],
            p: Some(0x10),
            a: None,
            b: Some(0x42),
            io: None,
            stack: None,
        }],
        errors: Vec::new(),
        warnings: None,
    };

    let before = Chip::new("before").snapshot(Some(coord));
    let default_a = before.node(coord).unwrap().a;

    let mut chip = Chip::new("load-test");
    chip.load(&program);
    let snap = chip.snapshot(Some(coord));
    let node = snap.node(coord).unwrap();

    assert_eq!(node.state, CoreState::Running);
    assert_eq!(node.p, 0x10);
    assert_eq!(node.b, 0x42);
    assert_eq!(node.a, default_a);
    assert_eq!(node.ram[0], 0x1234);
}

#[test]
fn a_non_boot_node_reset_does_not_start_at_the_boot_entry() {
    // node 1 (row 0, col 1) is not in the default boot-node set.
    let coord = Coord::try_from(1).unwrap();
    let boot_coord = Coord::try_from(708).unwrap();

    let chip = Chip::new("boot-vs-cold");
    let snap = chip.snapshot(None);

    assert_ne!(snap.node(coord).unwrap().p, snap.node(boot_coord).unwrap().p);
}
