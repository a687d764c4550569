//! QuickTime atom type codes and preamble decoding.

/// Size of an atom preamble: 32-bit size plus four-character type.
pub const ATOM_PREAMBLE_SIZE: usize = 8;

/// Four-character atom type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtomType(pub [u8; 4]);

impl AtomType {
    pub const FREE: Self = Self(*b"free");
    pub const JUNK: Self = Self(*b"junk");
    pub const MDAT: Self = Self(*b"mdat");
    pub const MOOV: Self = Self(*b"moov");
    pub const PNOT: Self = Self(*b"pnot");
    pub const SKIP: Self = Self(*b"skip");
    pub const WIDE: Self = Self(*b"wide");
    pub const PICT: Self = Self(*b"PICT");
    pub const FTYP: Self = Self(*b"ftyp");
    pub const UUID: Self = Self(*b"uuid");
    pub const CMOV: Self = Self(*b"cmov");
    pub const STCO: Self = Self(*b"stco");
    pub const CO64: Self = Self(*b"co64");

    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Create from a 32-bit code read big-endian from the file.
    pub fn from_u32(code: u32) -> Self {
        Self(code.to_be_bytes())
    }

    /// Get the 4-char code as a string.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("????")
    }

    /// Whether this type may legitimately appear at the top level of a
    /// QuickTime file.
    pub fn is_top_level(&self) -> bool {
        matches!(
            *self,
            Self::FREE
                | Self::JUNK
                | Self::MDAT
                | Self::MOOV
                | Self::PNOT
                | Self::SKIP
                | Self::WIDE
                | Self::PICT
                | Self::UUID
                | Self::FTYP
        )
    }

    /// Whether this is a chunk offset table (`stco` or `co64`).
    pub fn is_chunk_offset_table(&self) -> bool {
        matches!(*self, Self::STCO | Self::CO64)
    }
}

impl std::fmt::Display for AtomType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decoded 8-byte atom preamble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtomHeader {
    /// Declared size including the preamble. `1` means a 64-bit size
    /// follows; `0` means the atom runs to the end of the file.
    pub size: u32,
    /// Atom type code.
    pub atom_type: AtomType,
}

impl AtomHeader {
    /// Decode a preamble.
    pub fn parse(bytes: &[u8; ATOM_PREAMBLE_SIZE]) -> Self {
        Self {
            size: u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            atom_type: AtomType([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    /// Whether a 64-bit extended size follows the preamble.
    pub fn has_extended_size(&self) -> bool {
        self.size == 1
    }
}
