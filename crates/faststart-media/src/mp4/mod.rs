//! QuickTime/MP4 container handling.
//!
//! Only the top-level atom layout and the chunk offset tables inside `moov`
//! are interpreted; everything else is carried as opaque bytes.

mod atoms;
mod relocate;

pub use atoms::{AtomHeader, AtomType, ATOM_PREAMBLE_SIZE};
pub use relocate::{
    relocate, scan, FastStart, Outcome, PassThroughReason, Relocation, ScanOutcome,
};
