//! Builds the serial boot stream that brings a GA144 mesh up from cold
//! silence: a Hamiltonian path across the 144 nodes, per-node relay/load
//! code, and the wire-level byte encoding `ga144_core::serial` defines.

mod error;
mod frame;
mod path;

pub use error::BootBuildError;
pub use frame::build_boot_stream;
pub use path::{canonical_path, trim_to_targets};
