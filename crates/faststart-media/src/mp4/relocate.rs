//! Moov relocation ("fast start").
//!
//! Rewrites a QuickTime/MP4 file held in memory so that the `moov` atom
//! comes before the media data:
//!
//! 1. Walk the top-level atoms, capturing `ftyp` and skipping everything
//!    else by its declared size.
//! 2. If `moov` is the last top-level atom, load it whole and add its size
//!    to every entry of every `stco`/`co64` table inside it.
//! 3. Emit `ftyp`, the patched `moov`, then the bytes that sat between
//!    them in the input.
//!
//! Inputs that cannot be relocated (moov not last, unknown top-level
//! atoms, truncation) are passed through byte-for-byte.

use super::atoms::{AtomHeader, AtomType, ATOM_PREAMBLE_SIZE};
use crate::buffer::{ByteOrder, CursorBuffer};
use crate::store::ByteStore;
use crate::{Error, Result};
use bytes::Bytes;

/// Extended-size preamble: 32-bit marker, type, 64-bit size.
const EXTENDED_PREAMBLE_SIZE: u64 = 16;

/// Offset of the first child's type code inside the moov atom.
const FIRST_CHILD_TYPE_OFFSET: usize = 12;

/// Size, type and version/flags of a chunk offset table.
const CHUNK_OFFSET_HEADER_SIZE: usize = 12;

/// Why an input was copied through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassThroughReason {
    /// The input holds no atoms at all.
    Empty,
    /// A top-level atom type that QuickTime files do not use.
    NotQuickTime(AtomType),
    /// Scanning finished but the final atom was not `moov`.
    LastAtomNotMoov(AtomType),
    /// An atom header or body runs past the end of the input.
    Truncated(AtomType),
    /// An atom declares a size smaller than its own header.
    Undersized(AtomType),
    /// The input ends with fewer bytes than an atom preamble.
    PartialPreamble { trailing: usize },
    /// `ftyp` is not the first atom, so bytes ahead of it would be lost.
    FtypNotFirst,
}

impl std::fmt::Display for PassThroughReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "input contains no atoms"),
            Self::NotQuickTime(atom) => {
                write!(f, "encountered non-QT top-level atom '{atom}'")
            }
            Self::LastAtomNotMoov(atom) => {
                write!(f, "last atom in file was '{atom}', not moov")
            }
            Self::Truncated(atom) => write!(f, "atom '{atom}' is truncated"),
            Self::Undersized(atom) => {
                write!(f, "atom '{atom}' is smaller than its header")
            }
            Self::PartialPreamble { trailing } => {
                write!(f, "input ends with {trailing} bytes of a partial atom header")
            }
            Self::FtypNotFirst => write!(f, "ftyp atom is not the first atom in the file"),
        }
    }
}

/// What [`relocate`] did with its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// `moov` was moved to the front.
    Relocated {
        /// Size of the moov atom, added to every chunk offset.
        moov_size: u64,
        /// Number of `stco`/`co64` tables patched.
        patched_tables: usize,
    },
    /// The input was copied unchanged.
    PassThrough(PassThroughReason),
}

/// Result of a relocation run.
#[derive(Debug, Clone)]
pub struct Relocation {
    /// Bytes of the rewritten (or passed-through) file.
    pub output: Bytes,
    /// Whether moov was moved, or why the input was copied unchanged.
    pub outcome: Outcome,
}

impl Relocation {
    /// Whether the output differs in layout from the input.
    pub fn is_relocated(&self) -> bool {
        matches!(self.outcome, Outcome::Relocated { .. })
    }
}

/// Layout facts gathered from the top-level atoms, without relocating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// `moov` is the final atom and can be moved to the front.
    Relocatable {
        /// Offset of the moov atom in the input.
        moov_offset: u64,
        moov_size: u64,
    },
    /// Relocation would copy the input unchanged.
    PassThrough(PassThroughReason),
}

/// Relocate the `moov` atom of `input` to the front.
pub fn relocate(input: &[u8]) -> Result<Relocation> {
    FastStart::new(ByteStore::from_slice(input)).run()
}

/// Inspect the top-level layout of `input` without rewriting it.
pub fn scan(input: &[u8]) -> Result<ScanOutcome> {
    let mut store = ByteStore::from_slice(input);
    let layout = scan_top_level(&mut store)?;
    Ok(match layout.end {
        ScanEnd::Moov { size } => ScanOutcome::Relocatable {
            moov_offset: store.len() - size,
            moov_size: size,
        },
        ScanEnd::PassThrough(reason) => ScanOutcome::PassThrough(reason),
    })
}

/// A single relocation run over an owned input store.
#[derive(Debug)]
pub struct FastStart {
    input: ByteStore,
}

impl FastStart {
    pub fn new(input: impl Into<ByteStore>) -> Self {
        Self {
            input: input.into(),
        }
    }

    /// Run the relocation, consuming the input.
    pub fn run(mut self) -> Result<Relocation> {
        let layout = scan_top_level(&mut self.input)?;

        let moov_size = match layout.end {
            ScanEnd::Moov { size } => size,
            ScanEnd::PassThrough(reason) => {
                tracing::debug!("Passing input through unchanged: {}", reason);
                let mut output = ByteStore::new();
                self.input.set_position(0);
                self.input.transfer_to(0, self.input.len(), &mut output)?;
                return Ok(Relocation {
                    output: output.into_bytes(),
                    outcome: Outcome::PassThrough(reason),
                });
            }
        };

        // moov is known to be the final atom, so it ends exactly at the end
        // of the input.
        let last_offset = self.input.len() - moov_size;
        let mut moov = CursorBuffer::try_new(to_usize(moov_size)?, ByteOrder::BigEndian)?;
        // The top-level walk rejected every atom running past the end.
        let read = self.input.read_and_fill_at(last_offset, &mut moov)?;
        debug_assert_eq!(read, moov.capacity());

        if moov.limit() >= FIRST_CHILD_TYPE_OFFSET + 4
            && AtomType::from_u32(moov.get_u32_at(FIRST_CHILD_TYPE_OFFSET)?) == AtomType::CMOV
        {
            return Err(Error::CompressedMoov);
        }

        let patched_tables = patch_chunk_offsets(&mut moov, moov_size)?;

        let start_offset = layout.start_offset;
        self.input.set_position(start_offset);

        let mut output = ByteStore::new();
        if let Some(ftyp) = &layout.ftyp {
            tracing::debug!("Writing ftyp atom ({} bytes)", ftyp.capacity());
            output.write_buffer(ftyp)?;
        }

        tracing::debug!("Writing moov atom ({} bytes)", moov_size);
        moov.rewind();
        output.write_buffer(&moov)?;

        let rest = last_offset.saturating_sub(start_offset);
        tracing::debug!("Copying rest of file ({} bytes)", rest);
        self.input.transfer_to(start_offset, rest, &mut output)?;

        Ok(Relocation {
            output: output.into_bytes(),
            outcome: Outcome::Relocated {
                moov_size,
                patched_tables,
            },
        })
    }
}

#[derive(Debug)]
enum ScanEnd {
    Moov { size: u64 },
    PassThrough(PassThroughReason),
}

#[derive(Debug)]
struct TopLevelLayout {
    ftyp: Option<CursorBuffer>,
    /// Input offset just past the ftyp atom, or 0 without one.
    start_offset: u64,
    end: ScanEnd,
}

/// Walk the top-level atoms of `input` from its current position.
fn scan_top_level(input: &mut ByteStore) -> Result<TopLevelLayout> {
    let mut preamble = CursorBuffer::new(ATOM_PREAMBLE_SIZE, ByteOrder::BigEndian);
    let mut ftyp = None;
    let mut start_offset = 0;
    let mut last: Option<(AtomType, u64)> = None;

    let stop = loop {
        let atom_start = input.position();
        let read = input.read_and_fill(&mut preamble)?;
        if read == 0 {
            break None;
        }
        if read < ATOM_PREAMBLE_SIZE {
            break Some(PassThroughReason::PartialPreamble { trailing: read });
        }

        let header = AtomHeader::parse(
            preamble
                .as_slice()
                .try_into()
                .map_err(|_| Error::malformed("short atom preamble"))?,
        );
        let atom_type = header.atom_type;
        tracing::trace!("Top-level atom '{}' at offset {}", atom_type, atom_start);

        if !atom_type.is_top_level() {
            tracing::debug!("Encountered non-QT top-level atom '{}'", atom_type);
            break Some(PassThroughReason::NotQuickTime(atom_type));
        }

        let (atom_size, header_size) = if header.has_extended_size() {
            let mut extended = CursorBuffer::new(8, ByteOrder::BigEndian);
            if input.read_and_fill(&mut extended)? < 8 {
                break Some(PassThroughReason::Truncated(atom_type));
            }
            (extended.get_u64()?, EXTENDED_PREAMBLE_SIZE)
        } else {
            (u64::from(header.size), ATOM_PREAMBLE_SIZE as u64)
        };

        if atom_size < header_size {
            break Some(PassThroughReason::Undersized(atom_type));
        }
        let atom_end = match atom_start.checked_add(atom_size) {
            Some(end) if end <= input.len() => end,
            _ => break Some(PassThroughReason::Truncated(atom_type)),
        };

        if atom_type == AtomType::FTYP {
            // Output starts with ftyp, so anything ahead of it (or a second
            // ftyp) would be dropped and shift every chunk offset.
            if atom_start != 0 {
                tracing::debug!("ftyp atom found at offset {}, not 0", atom_start);
                break Some(PassThroughReason::FtypNotFirst);
            }
            let mut atom = CursorBuffer::try_new(to_usize(atom_size)?, ByteOrder::BigEndian)?;
            atom.put_buffer(&mut preamble)?;
            // atom_end was checked against the input length above
            let body = input.read_buffer_at(atom_start + ATOM_PREAMBLE_SIZE as u64, &mut atom)?;
            debug_assert_eq!(body as u64, atom_size - ATOM_PREAMBLE_SIZE as u64);
            start_offset = input.position();
            ftyp = Some(atom);
        } else {
            input.set_position(atom_end);
        }

        last = Some((atom_type, atom_size));
    };

    let end = match (stop, last) {
        (Some(reason), _) => ScanEnd::PassThrough(reason),
        (None, None) => ScanEnd::PassThrough(PassThroughReason::Empty),
        (None, Some((AtomType::MOOV, size))) => ScanEnd::Moov { size },
        (None, Some((atom, _))) => {
            tracing::debug!("Last atom in file was '{}', not moov", atom);
            ScanEnd::PassThrough(PassThroughReason::LastAtomNotMoov(atom))
        }
    };

    Ok(TopLevelLayout {
        ftyp,
        start_offset,
        end,
    })
}

/// Add `delta` to every entry of every chunk offset table in `moov`.
///
/// Tables are found by sliding a one-byte window over the whole atom and
/// testing for an `stco` or `co64` type code, not by walking the box tree.
/// Returns the number of tables patched.
fn patch_chunk_offsets(moov: &mut CursorBuffer, delta: u64) -> Result<usize> {
    let mut patched = 0;

    while moov.remaining() >= ATOM_PREAMBLE_SIZE {
        let atom_head = moov.position();
        let atom_type = AtomType::from_u32(moov.get_u32_at(atom_head + 4)?);
        if !atom_type.is_chunk_offset_table() {
            moov.set_position(atom_head + 1)?;
            continue;
        }

        let atom_size = moov.get_u32_at(atom_head)? as usize;
        if atom_size > moov.remaining() {
            return Err(Error::BadAtomSize {
                size: atom_size as u64,
                remaining: moov.remaining() as u64,
            });
        }

        // size, type, version and flags, then the 32-bit entry count
        if moov.limit() < atom_head + CHUNK_OFFSET_HEADER_SIZE + 4 {
            return Err(Error::malformed("malformed atom"));
        }
        moov.set_position(atom_head + CHUNK_OFFSET_HEADER_SIZE)?;
        let entry_count = moov.get_u32()? as u64;

        let entry_width = if atom_type == AtomType::STCO { 4 } else { 8 };
        if entry_count * entry_width > moov.remaining() as u64 {
            return Err(Error::malformed("bad atom size/element count"));
        }

        tracing::debug!(
            "Patching {} atom with {} entries at moov offset {}",
            atom_type,
            entry_count,
            atom_head
        );

        if atom_type == AtomType::STCO {
            patch_stco_entries(moov, entry_count, delta)?;
        } else {
            for _ in 0..entry_count {
                let offset = moov.get_u64_at(moov.position())?;
                moov.put_u64(offset.wrapping_add(delta))?;
            }
        }

        patched += 1;
    }

    Ok(patched)
}

/// 32-bit entries wrap on overflow; stco is never promoted to co64.
fn patch_stco_entries(moov: &mut CursorBuffer, entry_count: u64, delta: u64) -> Result<()> {
    let delta = delta as u32;
    let mut wrapped = 0u64;
    for _ in 0..entry_count {
        let offset = moov.get_u32_at(moov.position())?;
        let (new_offset, overflowed) = offset.overflowing_add(delta);
        if overflowed {
            wrapped += 1;
        }
        moov.put_u32(new_offset)?;
    }
    if wrapped > 0 {
        tracing::warn!(
            "{} stco offsets overflowed 32 bits and wrapped; the file needs co64 tables",
            wrapped
        );
    }
    Ok(())
}

fn to_usize(size: u64) -> Result<usize> {
    usize::try_from(size).map_err(|_| Error::AllocationFailure { requested: size })
}
