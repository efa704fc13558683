//! On-disk snapshot artifacts: a versioned binary vector blob and a
//! JSON metadata array. The two are only meaningful as a pair; the
//! store validates their lengths against each other after loading.

use anyhow::Result;
use docrag_core::error::Error;
use docrag_core::types::IndexedEntry;
use std::fs;
use std::path::Path;

const VECTORS_MAGIC: u32 = 0x4452_5649;
const VECTORS_VERSION: u32 = 1;
const HEADER_LEN: usize = 16;

/// Write the flat vector buffer: magic, version, dimension, row count,
/// then little-endian f32 data.
pub fn write_vectors(path: &Path, dim: usize, vectors: &[f32]) -> Result<()> {
    let count = if dim == 0 { 0 } else { vectors.len() / dim };
    let mut bytes = Vec::with_capacity(HEADER_LEN + vectors.len() * 4);
    bytes.extend_from_slice(&VECTORS_MAGIC.to_le_bytes());
    bytes.extend_from_slice(&VECTORS_VERSION.to_le_bytes());
    bytes.extend_from_slice(&(dim as u32).to_le_bytes());
    bytes.extend_from_slice(&(count as u32).to_le_bytes());
    for v in vectors {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    fs::write(path, bytes)
        .map_err(|e| Error::Snapshot(format!("failed to write {}: {e}", path.display())))?;
    Ok(())
}

/// Read a vector blob back as `(dimension, flat buffer)`. A missing
/// file is not an error; it returns `None` to support first-run
/// bootstrap.
pub fn read_vectors(path: &Path) -> Result<Option<(usize, Vec<f32>)>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read(path)
        .map_err(|e| Error::Snapshot(format!("failed to read {}: {e}", path.display())))?;
    if data.len() < HEADER_LEN {
        return Err(Error::Snapshot(format!("{} is too small to hold a header", path.display())).into());
    }

    let magic = u32::from_le_bytes(slice4(&data, 0));
    let version = u32::from_le_bytes(slice4(&data, 4));
    let dim = u32::from_le_bytes(slice4(&data, 8)) as usize;
    let count = u32::from_le_bytes(slice4(&data, 12)) as usize;

    if magic != VECTORS_MAGIC {
        return Err(Error::Snapshot(format!("{} has wrong magic {magic:#X}", path.display())).into());
    }
    if version != VECTORS_VERSION {
        return Err(Error::Snapshot(format!("unsupported vector blob version {version}")).into());
    }
    let expected = HEADER_LEN + dim * count * 4;
    if data.len() != expected {
        return Err(Error::Snapshot(format!(
            "{} size mismatch: got {}, expected {expected} (dim={dim}, count={count})",
            path.display(),
            data.len()
        ))
        .into());
    }

    let mut vectors = Vec::with_capacity(dim * count);
    for chunk in data[HEADER_LEN..].chunks_exact(4) {
        vectors.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    Ok(Some((dim, vectors)))
}

pub fn write_entries(path: &Path, entries: &[IndexedEntry]) -> Result<()> {
    let json = serde_json::to_vec(entries)
        .map_err(|e| Error::Snapshot(format!("failed to serialize metadata: {e}")))?;
    fs::write(path, json)
        .map_err(|e| Error::Snapshot(format!("failed to write {}: {e}", path.display())))?;
    Ok(())
}

/// Read the metadata artifact; `None` when the file does not exist.
pub fn read_entries(path: &Path) -> Result<Option<Vec<IndexedEntry>>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read(path)
        .map_err(|e| Error::Snapshot(format!("failed to read {}: {e}", path.display())))?;
    let entries = serde_json::from_slice(&data)
        .map_err(|e| Error::Snapshot(format!("{} is not valid metadata: {e}", path.display())))?;
    Ok(Some(entries))
}

fn slice4(data: &[u8], at: usize) -> [u8; 4] {
    [data[at], data[at + 1], data[at + 2], data[at + 3]]
}
