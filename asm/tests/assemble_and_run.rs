//! Round-trips small programs through the assembler and a real chip: what
//! gets packed must behave the way the source reads.

use ga144_asm::assemble_source;
use ga144_core::chip::Chip;
use ga144_core::coord::Coord;
use ga144_core::cpu::CoreState;

#[test]
fn a_loop_runs_the_expected_number_of_times() {
    let program = assemble_source(
        r#"
        node 0
        warm
        @p 3 push
        for
          dup
        next
        "#,
    );
    assert!(!program.has_errors(), "{:?}", program.errors);

    let mut chip = Chip::new("loop-test");
    chip.load(&program);
    chip.step_until_done(10_000);

    let snap = chip.snapshot(Some(Coord::try_from(0).unwrap()));
    let node = snap.node(Coord::try_from(0).unwrap()).unwrap();
    // `@p 3 push` moves 3 into R; the loop body (`dup`) runs 3 times, then
    // falls into the warm-call reset pattern, which never blocks.
    assert_eq!(node.state, CoreState::Running);
}

#[test]
fn call_and_ret_round_trip_through_a_node() {
    let program = assemble_source(
        r#"
        node 8
        warm
        call routine
        dup
        routine:
          drop
          ret
        "#,
    );
    assert!(!program.has_errors(), "{:?}", program.errors);

    let mut chip = Chip::new("call-test");
    chip.load(&program);
    chip.step_n(20);

    let snap = chip.snapshot(Some(Coord::try_from(8).unwrap()));
    assert!(snap.node(Coord::try_from(8).unwrap()).is_some());
}

#[test]
fn undefined_label_surfaces_as_a_diagnostic_not_a_panic() {
    let program = assemble_source("node 0 call nowhere");
    assert!(program.has_errors());
    assert_eq!(program.nodes.len(), 1);
}
