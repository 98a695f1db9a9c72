//! Immutable debugging views handed back by [`crate::chip::Chip::snapshot`].
//! Plain data: no behavior, nothing here feeds back into
//! execution.

use serde::Serialize;
use serde_big_array::BigArray;

use crate::coord::Coord;
use crate::cpu::CoreState;
use crate::io::IoWrite;

/// One node's complete visible state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSnapshot {
    pub coord: Coord,
    pub state: CoreState,
    pub slot_index: usize,
    pub step_count: u64,
    pub p: u32,
    pub i: u32,
    pub a: u32,
    pub b: u32,
    pub t: u32,
    pub s: u32,
    pub r: u32,
    pub io: u32,
    pub dstack: Vec<u32>,
    pub rstack: Vec<u32>,
    #[serde(with = "BigArray")]
    pub ram: [u32; 64],
    #[serde(with = "BigArray")]
    pub rom: [u32; 64],
    /// Set only while `state` is `BlockedRead`.
    pub current_reading_port: Option<u32>,
    /// Set only while `state` is `BlockedWrite`.
    pub current_writing_port: Option<u32>,
}

/// Chip-wide view: every node plus the shared IO-write ring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChipSnapshot {
    pub total_steps: u64,
    pub active_count: usize,
    pub node_states: Vec<CoreState>,
    pub node_coords: Vec<Coord>,
    pub io_writes: Vec<Option<IoWrite>>,
    pub io_write_start: usize,
    pub io_write_count: usize,
    pub nodes: Vec<NodeSnapshot>,
}

impl ChipSnapshot {
    pub fn node(&self, coord: Coord) -> Option<&NodeSnapshot> {
        self.nodes.iter().find(|n| n.coord == coord)
    }
}
