//! The 144-node orchestrator: owns every `Cpu`, the
//! shared port fabric, and the IO-write log; drives them one tick at a
//! time in coordinate order so port rendezvous stays deterministic
//! regardless of how the caller schedules calls.

use std::collections::{HashMap, HashSet};

use crate::compiled::CompiledProgram;
use crate::constants::DEFAULT_BOOT_NODES;
use crate::coord::Coord;
use crate::cpu::{CoreState, Cpu, StepContext};
use crate::error::BootIntegrityError;
use crate::io::IoRing;
use crate::port::PortFabric;
use crate::serial::{self, BitSegment};
use crate::snapshot::{ChipSnapshot, NodeSnapshot};

pub struct Chip {
    name: String,
    nodes: Vec<Cpu>,
    fabric: PortFabric,
    io_log: IoRing,
    boot_nodes: HashSet<Coord>,
    breakpoints: HashSet<(Coord, u32)>,
    total_steps: u64,
}

impl Chip {
    pub fn new(name: impl Into<String>) -> Self {
        let mut chip = Self {
            name: name.into(),
            nodes: (0..crate::coord::NODE_COUNT).map(|_| Cpu::new()).collect(),
            fabric: PortFabric::new(),
            io_log: IoRing::new(),
            boot_nodes: DEFAULT_BOOT_NODES
                .iter()
                .map(|&raw| Coord::try_from(raw).expect("default boot nodes are valid coordinates"))
                .collect(),
            breakpoints: HashSet::new(),
            total_steps: 0,
        };
        chip.reset();
        chip
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn node(&self, coord: Coord) -> &Cpu {
        &self.nodes[coord.index()]
    }

    fn node_mut(&mut self, coord: Coord) -> &mut Cpu {
        &mut self.nodes[coord.index()]
    }

    /// Installs per-node ROM images; nodes absent from `table` keep
    /// whatever ROM they already had.
    pub fn set_rom_data(&mut self, table: HashMap<Coord, [u32; 64]>) {
        for (coord, rom) in table {
            self.node_mut(coord).rom = rom;
        }
    }

    /// Replaces the set of nodes that start executing their ROM on reset
    /// rather than parking to listen for relayed boot code. Takes effect on
    /// the next `reset()`.
    pub fn set_boot_nodes(&mut self, coords: HashSet<Coord>) {
        self.boot_nodes = coords;
    }

    /// The nodes currently configured to start executing their ROM on
    /// reset, used by callers that need to pick one of them (e.g. the CLI
    /// resolving which node a boot stream should target).
    pub fn boot_nodes(&self) -> &HashSet<Coord> {
        &self.boot_nodes
    }

    /// Reinitializes every node, clears the port fabric and IO log, and
    /// resets the tick counter.
    pub fn reset(&mut self) {
        for index in 0..self.nodes.len() {
            let coord = Coord::from_index(index);
            let is_boot_node = self.boot_nodes.contains(&coord);
            self.nodes[index].reset(is_boot_node);
        }
        self.fabric.clear();
        self.io_log = IoRing::new();
        self.total_steps = 0;
    }

    /// Writes a `CompiledProgram` directly into node state: the fast path used by tests and by any caller that
    /// does not need to model the physical boot wire.
    pub fn load(&mut self, program: &CompiledProgram) {
        for compiled in &program.nodes {
            let node = self.node_mut(compiled.coord);
            for (i, cell) in compiled.mem.iter().copied().enumerate().take(64) {
                if let Some(word) = cell {
                    node.ram[i] = word & crate::word::WORD_MASK;
                }
            }
            if let Some(p) = compiled.p {
                node.p = p;
            }
            if let Some(a) = compiled.a {
                node.a = a;
            }
            if let Some(b) = compiled.b {
                node.b = b;
            }
            if let Some(io) = compiled.io {
                node.io = io;
            }
            if let Some(stack) = &compiled.stack {
                for &value in stack {
                    node.push_data(value);
                }
            }
            node.state = CoreState::Running;
        }
    }

    /// Installs a raw boot-stream byte sequence onto `boot_coord`: validates
    /// the 3-word header, deframes the body into words, then reads those
    /// words as a frame-2 trailer (`start_p`, a reserved word, `code_len`,
    /// then `code_len` code words) — the shape `ga144_boot::build_boot_stream`
    /// produces when the boot node is the stream's only target. Code lands
    /// at `ram[0]` and `P` is set to `start_p`, reproducing the silicon boot
    /// ROM's "copy N words into RAM then jump to the declared entry"
    /// behavior. This fast path does not relay through intermediate nodes —
    /// it supports only a stream whose declared target is the boot node
    /// itself; once installed, the code runs through the ordinary `step()`
    /// scheduler like any other program.
    pub fn load_via_boot_stream(
        &mut self,
        boot_coord: Coord,
        bytes: &[u8],
    ) -> Result<(), BootIntegrityError> {
        if !self.boot_nodes.contains(&boot_coord) {
            return Err(BootIntegrityError::UnknownBootNode(boot_coord));
        }
        if bytes.len() < 9 {
            return Err(BootIntegrityError::TruncatedFrame { expected_words: 3, got_bytes: bytes.len() });
        }

        let header = serial::decode_words(&bytes[0..9]).expect("9 bytes is 3 whole words");
        let magic = header[0];
        if magic != crate::constants::BOOT_MAGIC as u32 {
            return Err(BootIntegrityError::BadMagic {
                expected: crate::constants::BOOT_MAGIC,
                found: magic as u8,
            });
        }
        let length = header[2] as usize;

        let body_bytes = &bytes[9..];
        if body_bytes.len() != length * 3 {
            return Err(BootIntegrityError::TruncatedFrame {
                expected_words: length,
                got_bytes: body_bytes.len(),
            });
        }
        let words = serial::decode_words(body_bytes).expect("validated multiple of 3 above");

        if words.len() < 3 {
            return Err(BootIntegrityError::TruncatedFrame { expected_words: 3, got_bytes: words.len() * 3 });
        }
        let start_p = words[0];
        let code_len = words[2] as usize;
        let code = &words[3..];
        if code.len() != code_len {
            return Err(BootIntegrityError::TruncatedFrame { expected_words: code_len, got_bytes: code.len() * 3 });
        }

        let node = self.node_mut(boot_coord);
        for (i, word) in code.iter().copied().enumerate().take(64) {
            node.ram[i] = word & crate::word::WORD_MASK;
        }
        node.p = start_p;
        node.slot = 4;
        node.state = CoreState::Running;

        Ok(())
    }

    /// Drives `coord`'s boot pin with a lazy `(value, duration)` bit
    /// sequence, deframes it back into the boot-stream byte sequence,
    /// installs it, then steps the chip for up to
    /// `budget` ticks. Returns whether the chip reached quiescence
    /// naturally before the budget ran out.
    pub fn step_with_serial_bits(
        &mut self,
        coord: Coord,
        bits: &[BitSegment],
        budget: u64,
    ) -> Result<bool, BootIntegrityError> {
        let bytes = serial::decode_bits_to_bytes(bits);
        self.load_via_boot_stream(coord, &bytes)?;
        Ok(self.step_until_done(budget))
    }

    /// One chip-wide tick: every node gets a chance to make progress, in
    /// coordinate order. Always counts, even if every node was
    /// blocked and nothing happened.
    pub fn step(&mut self) {
        let Chip { nodes, fabric, io_log, .. } = self;
        for index in 0..nodes.len() {
            let coord = Coord::from_index(index);
            let mut ctx = StepContext { coord, fabric, io_log };
            nodes[index].step(&mut ctx);
        }
        self.total_steps += 1;
    }

    pub fn step_n(&mut self, n: u64) {
        for _ in 0..n {
            self.step();
        }
    }

    /// Steps until no node can make further progress or `budget` ticks
    /// elapse, whichever comes first. Returns `true` only on natural
    /// quiescence.
    pub fn step_until_done(&mut self, budget: u64) -> bool {
        for _ in 0..budget {
            if self.hit_breakpoint().is_some() {
                return false;
            }
            if self.active_count() == 0 {
                return true;
            }
            self.step();
        }
        self.active_count() == 0
    }

    fn hit_breakpoint(&self) -> Option<(Coord, u32)> {
        self.breakpoints
            .iter()
            .copied()
            .find(|&(coord, addr)| {
                let node = self.node(coord);
                node.state == CoreState::Running && node.slot >= 4 && node.p == addr
            })
    }

    pub fn set_breakpoint(&mut self, coord: Coord, addr: u32) {
        self.breakpoints.insert((coord, addr));
    }

    pub fn clear_breakpoint(&mut self, coord: Coord, addr: u32) {
        self.breakpoints.remove(&(coord, addr));
    }

    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Nodes that are either running or blocked with a peer that could
    /// still complete the rendezvous: zero means the chip can
    /// never progress again without more external input.
    pub fn active_count(&self) -> usize {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(index, node)| {
                let coord = Coord::from_index(*index);
                match node.state {
                    CoreState::Running => true,
                    CoreState::BlockedRead { addr, .. } | CoreState::BlockedWrite { addr, .. } => {
                        self.fabric.has_pending_peer(coord, addr)
                    }
                    CoreState::Suspended => false,
                }
            })
            .count()
    }

    /// Full or single-node debugging view.
    pub fn snapshot(&self, coord: Option<Coord>) -> ChipSnapshot {
        let coords: Vec<Coord> = match coord {
            Some(c) => vec![c],
            None => (0..self.nodes.len()).map(Coord::from_index).collect(),
        };

        let nodes: Vec<NodeSnapshot> = coords.iter().map(|&c| self.node_snapshot(c)).collect();

        ChipSnapshot {
            total_steps: self.total_steps,
            active_count: self.active_count(),
            node_states: self.nodes.iter().map(|n| n.state).collect(),
            node_coords: (0..self.nodes.len()).map(Coord::from_index).collect(),
            io_writes: self.io_log.iter().map(Some).collect(),
            io_write_start: self.io_log.start(),
            io_write_count: self.io_log.len(),
            nodes,
        }
    }

    fn node_snapshot(&self, coord: Coord) -> NodeSnapshot {
        let node = self.node(coord);
        let (current_reading_port, current_writing_port) = match node.state {
            CoreState::BlockedRead { addr, .. } => (Some(addr), None),
            CoreState::BlockedWrite { addr, .. } => (None, Some(addr)),
            _ => (None, None),
        };
        NodeSnapshot {
            coord,
            state: node.state,
            slot_index: node.slot as usize,
            step_count: node.step_count,
            p: node.p,
            i: node.i,
            a: node.a,
            b: node.b,
            t: node.t,
            s: node.s,
            r: node.r,
            io: node.io,
            dstack: node.d_stack.cells_from_top().to_vec(),
            rstack: node.r_stack.cells_from_top().to_vec(),
            ram: node.ram,
            rom: node.rom,
            current_reading_port,
            current_writing_port,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiled::CompiledNode;

    fn coord(raw: u16) -> Coord {
        Coord::try_from(raw).unwrap()
    }

    #[test]
    fn two_freshly_reset_chips_are_identical() {
        let a = Chip::new("a");
        let mut b = Chip::new("b");
        b.reset();
        assert_eq!(a.snapshot(None).nodes, b.snapshot(None).nodes);
    }

    #[test]
    fn set_boot_nodes_changes_which_node_runs_on_reset() {
        let mut chip = Chip::new("custom-boot");
        let mut wanted = std::collections::HashSet::new();
        wanted.insert(coord(17));
        chip.set_boot_nodes(wanted);
        chip.reset();
        let snap = chip.snapshot(None);
        assert_eq!(snap.node(coord(17)).unwrap().state, CoreState::Running);
        assert_ne!(snap.node(coord(708)).unwrap().state, CoreState::Running);
    }

    #[test]
    fn step_on_all_suspended_chip_is_a_no_op_but_counts() {
        let mut chip = Chip::new("idle");
        for index in 0..crate::coord::NODE_COUNT {
            chip.nodes[index].state = CoreState::Suspended;
        }
        let before = chip.snapshot(None).nodes;
        chip.step();
        let after = chip.snapshot(None).nodes;
        assert_eq!(chip.total_steps(), 1);
        for (b, a) in before.iter().zip(after.iter()) {
            assert_eq!(b.step_count, a.step_count);
        }
    }

    #[test]
    fn load_writes_sparse_memory_and_defaults_b_to_io() {
        let mut chip = Chip::new("load-test");
        let target = coord(709);
        let program = CompiledProgram {
            nodes: vec![CompiledNode {
                coord: target,
                mem: vec![Some(0xAA), None, Some(0x55)],
                len: 3,
                p: None,
                a: None,
                b: None,
                io: None,
                stack: None,
            }],
            errors: Vec::new(),
            warnings: None,
        };
        chip.load(&program);
        let snap = chip.snapshot(Some(target));
        assert_eq!(snap.nodes[0].ram[0], 0xAA);
        assert_eq!(snap.nodes[0].ram[2], 0x55);
        assert_eq!(snap.nodes[0].b, crate::constants::PORT_IO);
    }

    #[test]
    fn boot_stream_rejects_bad_magic() {
        let mut chip = Chip::new("boot-test");
        let bytes = serial::encode_word(0x00)
            .into_iter()
            .chain(serial::encode_word(0))
            .chain(serial::encode_word(0))
            .collect::<Vec<_>>();
        let err = chip.load_via_boot_stream(coord(708), &bytes).unwrap_err();
        assert!(matches!(err, BootIntegrityError::BadMagic { .. }));
    }

    #[test]
    fn boot_stream_installs_code_at_ram_zero_and_sets_p_to_start_p() {
        let mut chip = Chip::new("boot-test");
        let code = [0xAAu32, 0x55];
        let start_p = 5u32;
        // frame-2 trailer: start_p, reserved, code_len, then the code words.
        let trailer = [start_p, 0, code.len() as u32, code[0], code[1]];

        let mut bytes: Vec<u8> = serial::encode_word(crate::constants::BOOT_MAGIC as u32).to_vec();
        bytes.extend(serial::encode_word(0)); // first-hop port, unused when the boot node is its own target
        bytes.extend(serial::encode_word(trailer.len() as u32));
        for word in trailer {
            bytes.extend(serial::encode_word(word));
        }

        chip.load_via_boot_stream(coord(708), &bytes).unwrap();
        let snap = chip.snapshot(Some(coord(708)));
        assert_eq!(snap.nodes[0].ram[0], 0xAA);
        assert_eq!(snap.nodes[0].ram[1], 0x55);
        assert_eq!(snap.nodes[0].p, start_p);
    }

    #[test]
    fn boot_stream_rejects_a_trailer_too_short_to_hold_its_own_header() {
        let mut chip = Chip::new("boot-test");
        let mut bytes: Vec<u8> = serial::encode_word(crate::constants::BOOT_MAGIC as u32).to_vec();
        bytes.extend(serial::encode_word(0));
        bytes.extend(serial::encode_word(1)); // declares 1 word, short of the 3-word trailer header
        bytes.extend(serial::encode_word(0));

        let err = chip.load_via_boot_stream(coord(708), &bytes).unwrap_err();
        assert!(matches!(err, BootIntegrityError::TruncatedFrame { .. }));
    }
}
