//! Generates randomized single-step golden vectors for every GA144 opcode:
//! `gen_opcode_tests <mnemonic | all>`. Mirrors the patsoffice cpu-validation
//! generators' shape (randomize state, execute one instruction, diff the
//! result) with `Chip`/`CompiledNode` standing in for their tracing bus.

use std::fs;
use std::path::Path;

use ga144_conformance::{NodeState, OpcodeTestCase};
use ga144_core::chip::Chip;
use ga144_core::compiled::{CompiledNode, CompiledProgram};
use ga144_core::coord::Coord;
use ga144_core::snapshot::NodeSnapshot;
use ga144_core::word::{self, Opcode, SlotInput, ALL_OPCODES, WORD_MASK};
use rand::Rng;

const NUM_TESTS: usize = 200;
const NODE: u16 = 0;

fn snapshot_to_state(snap: &NodeSnapshot) -> NodeState {
    NodeState {
        p: snap.p,
        a: snap.a,
        b: snap.b,
        io: snap.io,
        t: snap.t,
        s: snap.s,
        r: snap.r,
        dstack: snap.dstack.clone(),
        rstack: snap.rstack.clone(),
        ram: snap.ram.to_vec(),
    }
}

/// Builds the one-word (or two-word, for `@p`/`!p`) program that exercises
/// `op` alone in slot 0, with a random operand/literal where the opcode
/// needs one.
fn build_word(op: Opcode, rng: &mut impl Rng) -> Vec<u32> {
    if op.takes_inline_literal() {
        let instr = word::assemble([SlotInput::Op(op), SlotInput::Empty, SlotInput::Empty, SlotInput::Empty])
            .expect("a bare opcode alone in slot 0 always assembles");
        vec![word::xor_encode(instr), rng.gen_range(0..=WORD_MASK)]
    } else if op.requires_address() {
        let addr = rng.gen_range(0..0x3FFu32);
        let instr = word::assemble([SlotInput::Addressed(op, addr), SlotInput::Empty, SlotInput::Empty, SlotInput::Empty])
            .expect("an address-class opcode alone in slot 0 always assembles");
        vec![word::xor_encode(instr)]
    } else {
        let instr = word::assemble([SlotInput::Op(op), SlotInput::Empty, SlotInput::Empty, SlotInput::Empty])
            .expect("a bare opcode alone in slot 0 always assembles");
        vec![word::xor_encode(instr)]
    }
}

fn random_stack(rng: &mut impl Rng, depth: usize) -> Vec<u32> {
    let len = rng.gen_range(0..=depth);
    (0..len).map(|_| rng.gen_range(0..=WORD_MASK)).collect()
}

fn generate(op: Opcode, rng: &mut impl Rng) -> Vec<OpcodeTestCase> {
    let coord = Coord::try_from(NODE).unwrap();
    let mut tests = Vec::with_capacity(NUM_TESTS);

    for _ in 0..NUM_TESTS {
        let mem: Vec<Option<u32>> = build_word(op, rng).into_iter().map(Some).collect();
        let program = CompiledProgram {
            nodes: vec![CompiledNode {
                coord,
                len: mem.len(),
                mem,
                p: Some(0),
                a: Some(rng.gen_range(0..=WORD_MASK)),
                b: Some(rng.gen_range(0..=WORD_MASK)),
                io: Some(rng.gen_range(0..=WORD_MASK)),
                stack: Some(random_stack(rng, 7)),
            }],
            errors: Vec::new(),
            warnings: None,
        };

        let mut chip = Chip::new("conformance");
        chip.load(&program);

        let before = chip.snapshot(Some(coord));
        let initial = snapshot_to_state(before.node(coord).unwrap());

        chip.step();

        let after = chip.snapshot(Some(coord));
        let final_state = snapshot_to_state(after.node(coord).unwrap());

        let ram_writes = initial.diff_ram(&final_state);
        tests.push(OpcodeTestCase { name: op.mnemonic().to_string(), opcode: op.mnemonic().to_string(), initial, final_state, ram_writes });
    }

    tests
}

fn generate_and_write(op: Opcode, rng: &mut impl Rng, out_dir: &Path) {
    let tests = generate(op, rng);
    let out_path = out_dir.join(format!("{}.json", op.mnemonic().replace(['!', '@', '+', '-', '*', '/'], "_")));
    let json = serde_json::to_string_pretty(&tests).expect("test vectors always serialize");
    fs::write(&out_path, json).expect("failed to write output file");
    println!("generated {} tests for {} -> {}", tests.len(), op.mnemonic(), out_path.display());
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        eprintln!("usage: gen_opcode_tests <mnemonic | all>");
        std::process::exit(1);
    }

    let out_dir = Path::new("test_data/opcodes");
    fs::create_dir_all(out_dir).expect("failed to create output directory");
    let mut rng = rand::thread_rng();

    if args[1] == "all" {
        for op in ALL_OPCODES {
            generate_and_write(op, &mut rng, out_dir);
        }
        println!("generated tests for {} opcodes", ALL_OPCODES.len());
    } else {
        let op = Opcode::from_mnemonic(&args[1]).unwrap_or_else(|| {
            eprintln!("unknown mnemonic: {}", args[1]);
            std::process::exit(1);
        });
        generate_and_write(op, &mut rng, out_dir);
    }
}
