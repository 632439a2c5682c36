//! Container writer and reader.
//!
//! # Writer
//! [`write_container`] serializes the 8-byte `icns` header followed by every
//! block in catalog order, streaming into a temp file in the output's
//! directory and committing with one atomic rename.  A failed pack never
//! disturbs a previous output file.  [`pack_iconset`] is the full pipeline:
//! resolve → encode (warn and skip empty payloads) → write.
//!
//! # Reader
//! [`parse_container`] walks `Header → Block* → EOF` over a byte slice,
//! raising a distinct error per structural violation — wrong magic,
//! truncation, undersized or overrunning block lengths, duplicate tags, and
//! declared/actual size disagreement — each carrying the byte offset or tag
//! needed to diagnose without re-running.
//!
//! # Endianness
//! All multi-byte integers are big-endian, per the ICNS layout.  No runtime
//! negotiation is ever performed.

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::block::{encode_block, IconBlock, BLOCK_HEADER_LEN};
use crate::catalog::{resolve_iconset, IconSpec, IconTag, ResolveError};

/// Container magic literal.
pub const MAGIC: &[u8; 4] = b"icns";
/// Bytes of magic + total-length prefix ahead of the first block.
pub const HEADER_LEN: u32 = 8;

// ── Writer ───────────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum PackError {
    #[error("no icon blocks to pack")]
    NoEntries,
    #[error("container would be {total} bytes, exceeding the u32 length field")]
    Oversized { total: u64 },
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Total container length for a block sequence, checked against the u32
/// length field.  Zero blocks is refused here, before any filesystem work.
/// Summed over [`IconBlock::byte_len`] so an oversized block constructed
/// directly (bypassing `encode_block`) is caught rather than wrapped.
fn container_len(blocks: &[IconBlock]) -> Result<u32, PackError> {
    if blocks.is_empty() {
        return Err(PackError::NoEntries);
    }
    let total: u64 =
        blocks.iter().map(IconBlock::byte_len).sum::<u64>() + HEADER_LEN as u64;
    if total > u32::MAX as u64 {
        return Err(PackError::Oversized { total });
    }
    Ok(total as u32)
}

/// Serialize a container into memory.  The file writer streams instead; this
/// exists for validation and tests.
pub fn encode_container(blocks: &[IconBlock]) -> Result<Vec<u8>, PackError> {
    let total = container_len(blocks)?;
    let mut out = Vec::with_capacity(total as usize);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&total.to_be_bytes());
    for block in blocks {
        out.extend_from_slice(block.tag.as_bytes());
        out.extend_from_slice(&block.declared_len().to_be_bytes());
        out.extend_from_slice(&block.payload);
    }
    Ok(out)
}

/// Write the container to `path` via a temp file in the same directory and
/// an atomic rename.  Returns the total byte length written.
pub fn write_container(blocks: &[IconBlock], path: &Path) -> Result<u32, PackError> {
    let total = container_len(blocks)?;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let werr = |source: io::Error| PackError::Write {
        path: path.to_owned(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(parent).map_err(werr)?;
    {
        let file = tmp.as_file_mut();
        file.write_all(MAGIC).map_err(werr)?;
        file.write_u32::<BigEndian>(total).map_err(werr)?;
        for block in blocks {
            block.write(&mut *file).map_err(werr)?;
        }
        file.flush().map_err(werr)?;
    }
    tmp.persist(path).map_err(|e| werr(e.error))?;

    log::debug!(
        "wrote {} ({} bytes, {} block(s))",
        path.display(),
        total,
        blocks.len()
    );
    Ok(total)
}

// ── Pack pipeline ────────────────────────────────────────────────────────────

/// Outcome of [`pack_iconset`], one tag list per disposition.
#[derive(Debug)]
pub struct PackReport {
    /// Total container bytes written.
    pub written: u32,
    pub packed: Vec<IconTag>,
    pub missing: Vec<IconTag>,
    /// Tags whose resolved payload was rejected by the encoder.
    pub skipped: Vec<IconTag>,
}

/// Resolve `specs` against `dir`, encode every usable entry, and commit the
/// container to `output`.  Missing tags and empty payloads are warned about
/// and skipped; only an empty result set is fatal.
pub fn pack_iconset(
    dir: &Path,
    specs: &[IconSpec],
    output: &Path,
) -> Result<PackReport, PackError> {
    let resolution = resolve_iconset(dir, specs)?;

    for tag in &resolution.missing {
        log::warn!("no usable source file for {tag}, skipping");
    }

    let mut blocks = Vec::with_capacity(resolution.entries.len());
    let mut skipped = Vec::new();
    for entry in resolution.entries {
        let tag = entry.tag;
        match encode_block(entry) {
            Ok(block) => blocks.push(block),
            Err(e) => {
                log::warn!("{e}, skipping");
                skipped.push(tag);
            }
        }
    }

    let packed: Vec<IconTag> = blocks.iter().map(|b| b.tag).collect();
    let written = write_container(&blocks, output)?;
    log::info!(
        "packed {} block(s) into {} ({} bytes)",
        packed.len(),
        output.display(),
        written
    );
    Ok(PackReport {
        written,
        packed,
        missing: resolution.missing,
        skipped,
    })
}

// ── Reader ───────────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("bad magic: expected \"icns\", found 0x{}", hex::encode(.found))]
    BadMagic { found: [u8; 4] },
    #[error("container truncated: header declares {declared} bytes, stream has {actual}")]
    Truncated { declared: u32, actual: u64 },
    #[error("malformed block {tag} at offset {offset}: declared length {declared}")]
    MalformedBlock {
        tag: IconTag,
        offset: u64,
        declared: u32,
    },
    #[error("duplicate tag {tag} at offset {offset}")]
    DuplicateTag { tag: IconTag, offset: u64 },
    #[error("container size mismatch: header declares {declared} bytes, consumed {consumed}")]
    SizeMismatch { declared: u32, consumed: u64 },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Parse a packed container, returning its blocks in on-disk order.
pub fn parse_container(data: &[u8]) -> Result<Vec<IconBlock>, ParseError> {
    if data.len() < HEADER_LEN as usize {
        return Err(ParseError::Truncated {
            declared: HEADER_LEN,
            actual: data.len() as u64,
        });
    }

    let mut found = [0u8; 4];
    found.copy_from_slice(&data[..4]);
    if &found != MAGIC {
        return Err(ParseError::BadMagic { found });
    }

    let total = BigEndian::read_u32(&data[4..8]);
    if total as u64 > data.len() as u64 {
        return Err(ParseError::Truncated {
            declared: total,
            actual: data.len() as u64,
        });
    }
    if (total as u64) < data.len() as u64 {
        // Trailing bytes past the declared container end.
        return Err(ParseError::SizeMismatch {
            declared: total,
            consumed: data.len() as u64,
        });
    }

    let total = total as usize;
    let mut blocks: Vec<IconBlock> = Vec::new();
    let mut offset = HEADER_LEN as usize;

    while offset < total {
        if total - offset < BLOCK_HEADER_LEN as usize {
            // Shortfall: room left inside the container but not enough for a
            // block header.
            return Err(ParseError::SizeMismatch {
                declared: total as u32,
                consumed: offset as u64,
            });
        }

        let mut tag_bytes = [0u8; 4];
        tag_bytes.copy_from_slice(&data[offset..offset + 4]);
        let tag = IconTag(tag_bytes);
        let declared = BigEndian::read_u32(&data[offset + 4..offset + 8]);

        if declared < BLOCK_HEADER_LEN || offset + declared as usize > total {
            return Err(ParseError::MalformedBlock {
                tag,
                offset: offset as u64,
                declared,
            });
        }
        if blocks.iter().any(|b| b.tag == tag) {
            return Err(ParseError::DuplicateTag {
                tag,
                offset: offset as u64,
            });
        }

        let payload = data[offset + BLOCK_HEADER_LEN as usize..offset + declared as usize].to_vec();
        blocks.push(IconBlock { tag, payload });
        offset += declared as usize;
    }

    Ok(blocks)
}

/// Read and parse a container file.
pub fn read_container(path: &Path) -> Result<Vec<IconBlock>, ParseError> {
    let data = fs::read(path)?;
    parse_container(&data)
}
