//! Faststart-Media: moov relocation for QuickTime/MP4 files
//!
//! This crate moves the `moov` atom of an in-memory MP4 file in front of the
//! media data so players can start before the whole file has arrived.
//!
//! # Modules
//!
//! - `buffer` - Fixed-capacity cursor buffer with configurable byte order
//! - `store` - Growable in-memory byte store standing in for a file
//! - `mp4` - Top-level atom scanning and chunk offset patching
//!
//! # Example
//!
//! ```no_run
//! let input = std::fs::read("movie.mp4").unwrap();
//! let relocation = faststart_media::relocate(&input).unwrap();
//! assert_eq!(relocation.output.len(), input.len());
//! ```

pub mod buffer;
pub mod error;
pub mod mp4;
pub mod store;

pub use buffer::{ByteOrder, CursorBuffer, Word};
pub use error::{Error, Result};
pub use mp4::{
    relocate, scan, AtomType, FastStart, Outcome, PassThroughReason, Relocation, ScanOutcome,
};
pub use store::ByteStore;
