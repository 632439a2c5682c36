use byteorder::{BigEndian, WriteBytesExt};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

use crate::catalog::{IconTag, ResolvedEntry};

/// Bytes of tag + length prefix ahead of every payload.
pub const BLOCK_HEADER_LEN: u32 = 8;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("empty payload for tag {tag} ({path})")]
    EmptyPayload { tag: IconTag, path: PathBuf },
    #[error("payload for tag {tag} is {size} bytes, exceeding the u32 length field")]
    Oversized { tag: IconTag, size: usize },
}

/// One tagged, length-prefixed segment of the container.  The payload is
/// carried verbatim; nothing here inspects image contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconBlock {
    pub tag: IconTag,
    pub payload: Vec<u8>,
}

impl IconBlock {
    /// Exact block length in bytes: payload plus the 8-byte tag/length
    /// prefix.  Computed in u64 so a payload near `u32::MAX` cannot wrap.
    pub fn byte_len(&self) -> u64 {
        self.payload.len() as u64 + BLOCK_HEADER_LEN as u64
    }

    /// The on-wire length field.  Only meaningful when [`byte_len`] fits in
    /// u32; [`write`] and the container writer refuse blocks that don't.
    ///
    /// [`byte_len`]: IconBlock::byte_len
    /// [`write`]: IconBlock::write
    pub fn declared_len(&self) -> u32 {
        self.byte_len() as u32
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        if self.byte_len() > u32::MAX as u64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "payload for tag {} is {} bytes, exceeding the u32 length field",
                    self.tag,
                    self.payload.len()
                ),
            ));
        }
        writer.write_all(self.tag.as_bytes())?;
        writer.write_u32::<BigEndian>(self.declared_len())?;
        writer.write_all(&self.payload)?;
        Ok(())
    }
}

/// Wrap a resolved entry into a block.  The resolver never hands over an
/// empty payload, but the invariant is re-checked here rather than trusted.
pub fn encode_block(entry: ResolvedEntry) -> Result<IconBlock, EncodeError> {
    if entry.payload.is_empty() {
        return Err(EncodeError::EmptyPayload {
            tag: entry.tag,
            path: entry.path,
        });
    }
    if entry.payload.len() as u64 + BLOCK_HEADER_LEN as u64 > u32::MAX as u64 {
        return Err(EncodeError::Oversized {
            tag: entry.tag,
            size: entry.payload.len(),
        });
    }
    Ok(IconBlock {
        tag: entry.tag,
        payload: entry.payload,
    })
}
