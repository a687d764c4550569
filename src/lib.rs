//! Faststart - QuickTime/MP4 moov relocation tool
//!
//! This library crate exposes the CLI's configuration and I/O plumbing for
//! integration testing. The relocation itself lives in `faststart-media`.

pub mod config;
pub mod io;
