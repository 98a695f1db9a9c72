//! The external interface a compiler (out of scope here) hands to
//! [`crate::chip::Chip::load`] / [`crate::chip::Chip::load_via_boot_stream`].
//! Serde-derived so the shape can cross a process or
//! file boundary as JSON, the way the CLI's `assemble`/`run` subcommands do.

use serde::{Deserialize, Serialize};

use crate::coord::Coord;

/// One node's compiled image: up to 64 sparse memory words plus optional
/// register/stack overrides applied at `load()` time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledNode {
    pub coord: Coord,
    /// Sparse RAM image; `None` entries are left at the reset fill.
    pub mem: Vec<Option<u32>>,
    pub len: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub a: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub io: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<Vec<u32>>,
}

/// A `{line, col, message}` diagnostic: assembly never
/// fails outright, it just accumulates these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub line: u32,
    pub col: u32,
    pub message: String,
}

impl Diagnostic {
    pub fn new(line: u32, col: u32, message: impl Into<String>) -> Self {
        Self { line, col, message: message.into() }
    }
}

/// The complete output of assembly: a set of per-node images
/// plus whatever diagnostics were collected along the way.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompiledProgram {
    pub nodes: Vec<CompiledNode>,
    pub errors: Vec<Diagnostic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<Diagnostic>>,
}

impl CompiledProgram {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn node(&self, coord: Coord) -> Option<&CompiledNode> {
        self.nodes.iter().find(|n| n.coord == coord)
    }
}
