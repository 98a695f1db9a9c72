//! Golden single-step test vectors for the GA144 opcode set: randomize a
//! node's registers and stacks, execute exactly one opcode, and record the
//! before/after state plus any RAM words it touched. Mirrors how the
//! patsoffice cpu-validation crate's m6809/m6800 generators fuzz one
//! instruction at a time against a tracing bus, just with a data stack
//! instead of a byte bus and one opcode per test file instead of one byte
//! value.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpcodeTestCase {
    pub name: String,
    pub opcode: String,
    pub initial: NodeState,
    #[serde(rename = "final")]
    pub final_state: NodeState,
    /// `(ram_index, value)` pairs that differ between `initial.ram` and
    /// `final_state.ram`.
    pub ram_writes: Vec<(usize, u32)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeState {
    pub p: u32,
    pub a: u32,
    pub b: u32,
    pub io: u32,
    pub t: u32,
    pub s: u32,
    pub r: u32,
    pub dstack: Vec<u32>,
    pub rstack: Vec<u32>,
    pub ram: Vec<u32>,
}

impl NodeState {
    pub fn diff_ram(&self, other: &NodeState) -> Vec<(usize, u32)> {
        self.ram
            .iter()
            .zip(other.ram.iter())
            .enumerate()
            .filter_map(|(i, (a, b))| (a != b).then_some((i, *b)))
            .collect()
    }
}
