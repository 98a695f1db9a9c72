//! Errors a boot-stream build can hit. All of them are programmer mistakes
//! (an empty program, a target that isn't on the mesh) rather than anything
//! a caller retries, so there's no `thiserror`/`anyhow` machinery here —
//! just a plain enum with hand-written `Display`, matching how the rest of
//! this workspace reports build-time failures.

use std::fmt;

use ga144_core::coord::Coord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootBuildError {
    /// A program names a node the canonical path never visits.
    TargetOffPath(Coord),
    /// Nothing to boot.
    EmptyProgram,
    /// The path was trimmed to nothing; only reachable if `TargetOffPath`
    /// checks above it were somehow bypassed.
    PathExhausted,
}

impl fmt::Display for BootBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootBuildError::TargetOffPath(coord) => {
                write!(f, "node {coord} does not lie on the canonical boot path")
            }
            BootBuildError::EmptyProgram => {
                write!(f, "cannot build a boot stream for a program with no nodes")
            }
            BootBuildError::PathExhausted => {
                write!(f, "canonical boot path contains none of the program's target nodes")
            }
        }
    }
}

impl std::error::Error for BootBuildError {}
