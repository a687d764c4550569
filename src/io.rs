//! Reading whole inputs into memory and writing outputs.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Read the whole input from `path`, or standard input when `None`.
///
/// Inputs larger than `max_size` bytes are rejected.
pub fn read_input(path: Option<&Path>, max_size: u64) -> Result<Vec<u8>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input file: {:?}", path))?;
            read_limited(file, max_size)
                .with_context(|| format!("Failed to read input file: {:?}", path))
        }
        None => read_limited(std::io::stdin().lock(), max_size)
            .context("Failed to read standard input"),
    }
}

fn read_limited<R: Read>(reader: R, max_size: u64) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    reader
        .take(max_size.saturating_add(1))
        .read_to_end(&mut data)?;
    if data.len() as u64 > max_size {
        anyhow::bail!("Input is larger than the {} byte limit", max_size);
    }
    Ok(data)
}

/// Write `data` to `path`, or standard output when `None`.
pub fn write_output(path: Option<&Path>, data: &[u8]) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, data)
            .with_context(|| format!("Failed to write output file: {:?}", path)),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(data)
                .and_then(|_| stdout.flush())
                .context("Failed to write standard output")
        }
    }
}
