//! Shared MP4 fixture builders for integration tests.
//!
//! Builds minimal QuickTime files byte by byte: enough structure for the
//! relocation engine (top-level atoms, a nested stbl with chunk offset
//! tables) and nothing more.

#![allow(dead_code)]

/// Build an atom with a 32-bit size.
pub fn atom(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + body.len());
    out.extend_from_slice(&((8 + body.len()) as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(body);
    out
}

/// Build an atom with the size-1 marker and a 64-bit extended size.
pub fn extended_atom(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(16 + body.len());
    out.extend_from_slice(&1u32.to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(&((16 + body.len()) as u64).to_be_bytes());
    out.extend_from_slice(body);
    out
}

/// Concatenate atoms into one container body.
pub fn concat(parts: &[Vec<u8>]) -> Vec<u8> {
    parts.iter().flatten().copied().collect()
}

pub fn ftyp() -> Vec<u8> {
    atom(b"ftyp", b"isom\0\0\x02\0isomiso2avc1mp41")
}

pub fn mdat(payload: &[u8]) -> Vec<u8> {
    atom(b"mdat", payload)
}

pub fn stco(entries: &[u32]) -> Vec<u8> {
    let mut body = vec![0, 0, 0, 0];
    body.extend_from_slice(&(entries.len() as u32).to_be_bytes());
    for entry in entries {
        body.extend_from_slice(&entry.to_be_bytes());
    }
    atom(b"stco", &body)
}

pub fn co64(entries: &[u64]) -> Vec<u8> {
    let mut body = vec![0, 0, 0, 0];
    body.extend_from_slice(&(entries.len() as u32).to_be_bytes());
    for entry in entries {
        body.extend_from_slice(&entry.to_be_bytes());
    }
    atom(b"co64", &body)
}

/// A moov holding one track whose sample table contains `tables`.
pub fn moov(tables: &[Vec<u8>]) -> Vec<u8> {
    let mvhd = atom(b"mvhd", &[0; 100]);
    let stbl = atom(b"stbl", &concat(tables));
    let minf = atom(b"minf", &stbl);
    let mdia = atom(b"mdia", &minf);
    let trak = atom(b"trak", &concat(&[atom(b"tkhd", &[0; 84]), mdia]));
    atom(b"moov", &concat(&[mvhd, trak]))
}

/// Deterministic payload bytes.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 251) as u8).collect()
}

/// Offset of the first occurrence of `needle` in `haystack`.
pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Read the entries of the first chunk offset table of type `kind`.
pub fn chunk_offsets(file: &[u8], kind: &[u8; 4]) -> Vec<u64> {
    let type_pos = find(file, kind).expect("chunk offset table not found");
    let count_pos = type_pos + 8;
    let count = u32::from_be_bytes(file[count_pos..count_pos + 4].try_into().unwrap()) as usize;
    let width = if kind == b"stco" { 4 } else { 8 };
    let entries = &file[count_pos + 4..count_pos + 4 + count * width];
    entries
        .chunks_exact(width)
        .map(|c| match width {
            4 => u32::from_be_bytes(c.try_into().unwrap()) as u64,
            _ => u64::from_be_bytes(c.try_into().unwrap()),
        })
        .collect()
}

/// A non-fast-start file: ftyp, mdat with `payload`, then a moov whose
/// stco table points at the given offsets inside the mdat payload.
pub fn slow_start_file(payload: &[u8], payload_offsets: &[u32]) -> Vec<u8> {
    let head = ftyp();
    let data_start = (head.len() + 8) as u32;
    let entries: Vec<u32> = payload_offsets.iter().map(|o| data_start + o).collect();
    concat(&[head, mdat(payload), moov(&[stco(&entries)])])
}
