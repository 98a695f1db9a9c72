//! The port fabric: pending-reader/writer bookkeeping between neighboring
//! nodes, and the rendezvous rule that resolves a read against a parked
//! write or vice versa.
//!
//! The fabric is the only mesh-shared mutable state (§5); it is owned and
//! mutated exclusively by the chip orchestrator during tick evaluation,
//! never by a node directly.

use std::collections::HashMap;

use crate::constants::{PORT_DOWN, PORT_LEFT, PORT_RDLU, PORT_RIGHT, PORT_UP};
use crate::coord::{Coord, Direction};

/// Priority order used whenever more than one neighbor direction could
/// satisfy a multiport rendezvous.
const PRIORITY: [Direction; 4] = [Direction::North, Direction::East, Direction::South, Direction::West];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pending {
    Reader { at: Coord },
    Writer { at: Coord, value: u32 },
}

#[derive(Default)]
pub struct PortFabric {
    edges: HashMap<(Coord, Coord), Pending>,
}

fn edge_key(a: Coord, b: Coord) -> (Coord, Coord) {
    if a < b { (a, b) } else { (b, a) }
}

/// Maps a physical port address to the geometric direction(s) it addresses
/// from `coord`'s point of view. `RIGHT`/`LEFT`/`UP`/`DOWN` each resolve to
/// exactly one geometric direction depending on the node's row/column
/// parity; `rdlu` bundles all four. Returns an empty vector for
/// any address that is not a recognized mesh port (callers fall back to
/// treating the address as the plain IO register).
pub fn port_directions(coord: Coord, addr: u32) -> Vec<Direction> {
    let east = if coord.east_port_is_right() { Direction::East } else { Direction::West };
    let west = if coord.east_port_is_right() { Direction::West } else { Direction::East };
    let south = if coord.south_port_is_up() { Direction::South } else { Direction::North };
    let north = if coord.south_port_is_up() { Direction::North } else { Direction::South };

    match addr {
        PORT_RIGHT => vec![east],
        PORT_LEFT => vec![west],
        PORT_UP => vec![north],
        PORT_DOWN => vec![south],
        PORT_RDLU => vec![east, west, north, south],
        _ => Vec::new(),
    }
}

impl PortFabric {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears every pending transfer. Used by `reset()`: a
    /// blocked core's wait is abandoned, not satisfied.
    pub fn clear(&mut self) {
        self.edges.clear();
    }

    /// Attempt to deliver `value` written by `coord` on `addr`. Returns the
    /// neighbor that received it immediately, or `None` if the write had to
    /// park (the caller should transition the node to `blocked_write`).
    pub fn try_write(&mut self, coord: Coord, addr: u32, value: u32) -> Option<Coord> {
        let dirs = port_directions(coord, addr);
        if dirs.is_empty() {
            return None;
        }

        for dir in PRIORITY {
            if !dirs.contains(&dir) {
                continue;
            }
            let Some(neighbor) = coord.neighbor(dir) else { continue };
            let key = edge_key(coord, neighbor);
            if matches!(self.edges.get(&key), Some(Pending::Reader { at }) if *at == neighbor) {
                // The writer is done the instant a waiting reader is found, but
                // the fabric has no direct handle to that reader's registers —
                // deposit the word as an ordinary pending write so the
                // reader's own next `try_read` (this tick or a later one)
                // picks it up the same way it would from a fresh write.
                self.edges.insert(key, Pending::Writer { at: coord, value });
                return Some(neighbor);
            }
        }

        for dir in dirs {
            if let Some(neighbor) = coord.neighbor(dir) {
                self.edges.insert(edge_key(coord, neighbor), Pending::Writer { at: coord, value });
            }
        }
        None
    }

    /// Attempt to satisfy a read by `coord` on `addr`. Returns the value and
    /// the neighbor that supplied it, or `None` if the read had to park.
    pub fn try_read(&mut self, coord: Coord, addr: u32) -> Option<(u32, Coord)> {
        let dirs = port_directions(coord, addr);
        if dirs.is_empty() {
            return None;
        }

        for dir in PRIORITY {
            if !dirs.contains(&dir) {
                continue;
            }
            let Some(neighbor) = coord.neighbor(dir) else { continue };
            let key = edge_key(coord, neighbor);
            if let Some(Pending::Writer { at, value }) = self.edges.get(&key).copied() {
                if at == neighbor {
                    self.edges.remove(&key);
                    return Some((value, neighbor));
                }
            }
        }

        for dir in dirs {
            if let Some(neighbor) = coord.neighbor(dir) {
                self.edges.insert(edge_key(coord, neighbor), Pending::Reader { at: coord });
            }
        }
        None
    }

    /// True if no edge touching `coord` holds a pending record — used by
    /// `step_until_done` to decide whether a blocked node could ever make
    /// progress without further external input.
    pub fn has_pending_peer(&self, coord: Coord, addr: u32) -> bool {
        port_directions(coord, addr).into_iter().any(|dir| {
            coord.neighbor(dir).is_some_and(|n| self.edges.contains_key(&edge_key(coord, n)))
        })
    }
}
