//! On-disk byte format of the id index.
//!
//! The index file is a fixed header followed by append-only slot
//! records:
//!
//! ```text
//! [crc: u32][id_len: u16][tag_len: u16][offset: u64][len: u32]
//! [id bytes][tag bytes][prev: u64][next: u64]
//! ```
//!
//! `prev` and `next` hold slot ordinals ([`NIL_SLOT`] means absent).
//! Ordinals are assigned in file order, so they are stable across
//! reopen. The crc covers everything from `id_len` through `prev`;
//! `next` is excluded because it is the one field patched in place
//! after the record was written.

use byteorder::{ByteOrder, LittleEndian};
use spandb_core::{Location, Result, StoreError};

/// Magic bytes at the start of every index file.
pub const INDEX_MAGIC: [u8; 4] = *b"SPIX";
/// Current index format version.
pub const INDEX_VERSION: u16 = 1;
/// Header length: magic + version + reserved.
pub const INDEX_HEADER_LEN: u64 = 8;

/// Sentinel ordinal meaning "no neighbor".
pub const NIL_SLOT: u64 = u64::MAX;

/// Fixed part of a slot record before the id and tag bytes.
const RECORD_PREFIX_LEN: usize = 4 + 2 + 2 + 8 + 4;
/// Trailing chain links: prev + next.
const RECORD_LINKS_LEN: usize = 16;

/// One decoded slot record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRecord {
    /// Entry id
    pub id: String,
    /// Tag the entry was stored under
    pub tag: String,
    /// Payload location in the data log
    pub location: Location,
    /// Ordinal of the chain predecessor, [`NIL_SLOT`] at the chain head
    pub prev: u64,
    /// Ordinal of the chain successor, [`NIL_SLOT`] at the chain tail
    pub next: u64,
}

/// Result of decoding one record from a buffer.
#[derive(Debug)]
pub enum DecodeOutcome {
    /// A complete record and the bytes it consumed.
    Record {
        /// The decoded record
        record: SlotRecord,
        /// Encoded size in bytes
        consumed: usize,
    },
    /// The buffer ends before the record does (torn trailing write).
    Incomplete,
}

/// File-relative offset of a record's `prev` field, given its string
/// lengths. `next` sits 8 bytes after.
pub fn links_offset(id_len: usize, tag_len: usize) -> usize {
    RECORD_PREFIX_LEN + id_len + tag_len
}

/// Encode the index file header.
pub fn header_bytes() -> [u8; INDEX_HEADER_LEN as usize] {
    let mut header = [0u8; INDEX_HEADER_LEN as usize];
    header[0..4].copy_from_slice(&INDEX_MAGIC);
    LittleEndian::write_u16(&mut header[4..6], INDEX_VERSION);
    // bytes 6..8 reserved
    header
}

/// Validate the index file header.
pub fn check_header(buf: &[u8]) -> Result<()> {
    if buf.len() < INDEX_HEADER_LEN as usize {
        return Err(StoreError::Corruption("index header truncated".into()));
    }
    if buf[0..4] != INDEX_MAGIC {
        return Err(StoreError::Corruption("bad index magic".into()));
    }
    let version = LittleEndian::read_u16(&buf[4..6]);
    if version != INDEX_VERSION {
        return Err(StoreError::Corruption(format!(
            "unsupported index format version {}",
            version
        )));
    }
    Ok(())
}

/// Encode one slot record.
pub fn encode_record(record: &SlotRecord) -> Result<Vec<u8>> {
    let id = record.id.as_bytes();
    let tag = record.tag.as_bytes();
    if id.len() > u16::MAX as usize {
        return Err(StoreError::Internal(format!(
            "id of {} bytes exceeds index record limit",
            id.len()
        )));
    }
    if tag.len() > u16::MAX as usize {
        return Err(StoreError::Internal(format!(
            "tag of {} bytes exceeds index record limit",
            tag.len()
        )));
    }

    let total = RECORD_PREFIX_LEN + id.len() + tag.len() + RECORD_LINKS_LEN;
    let mut buf = vec![0u8; total];
    LittleEndian::write_u16(&mut buf[4..6], id.len() as u16);
    LittleEndian::write_u16(&mut buf[6..8], tag.len() as u16);
    LittleEndian::write_u64(&mut buf[8..16], record.location.offset);
    LittleEndian::write_u32(&mut buf[16..20], record.location.len);
    buf[RECORD_PREFIX_LEN..RECORD_PREFIX_LEN + id.len()].copy_from_slice(id);
    buf[RECORD_PREFIX_LEN + id.len()..RECORD_PREFIX_LEN + id.len() + tag.len()]
        .copy_from_slice(tag);
    let links = links_offset(id.len(), tag.len());
    LittleEndian::write_u64(&mut buf[links..links + 8], record.prev);
    LittleEndian::write_u64(&mut buf[links + 8..links + 16], record.next);

    // crc covers id_len..=prev, leaving next patchable in place.
    let crc = crc32fast::hash(&buf[4..total - 8]);
    LittleEndian::write_u32(&mut buf[0..4], crc);
    Ok(buf)
}

/// Decode one slot record from the front of `buf`.
pub fn decode_record(buf: &[u8]) -> Result<DecodeOutcome> {
    if buf.len() < RECORD_PREFIX_LEN {
        return Ok(DecodeOutcome::Incomplete);
    }
    let id_len = LittleEndian::read_u16(&buf[4..6]) as usize;
    let tag_len = LittleEndian::read_u16(&buf[6..8]) as usize;
    let total = RECORD_PREFIX_LEN + id_len + tag_len + RECORD_LINKS_LEN;
    if buf.len() < total {
        return Ok(DecodeOutcome::Incomplete);
    }

    let stored_crc = LittleEndian::read_u32(&buf[0..4]);
    if crc32fast::hash(&buf[4..total - 8]) != stored_crc {
        return Err(StoreError::Corruption("index record checksum mismatch".into()));
    }

    let offset = LittleEndian::read_u64(&buf[8..16]);
    let len = LittleEndian::read_u32(&buf[16..20]);
    let id = std::str::from_utf8(&buf[RECORD_PREFIX_LEN..RECORD_PREFIX_LEN + id_len])
        .map_err(|_| StoreError::Corruption("index record id is not UTF-8".into()))?
        .to_string();
    let tag = std::str::from_utf8(
        &buf[RECORD_PREFIX_LEN + id_len..RECORD_PREFIX_LEN + id_len + tag_len],
    )
    .map_err(|_| StoreError::Corruption("index record tag is not UTF-8".into()))?
    .to_string();
    let links = links_offset(id_len, tag_len);
    let prev = LittleEndian::read_u64(&buf[links..links + 8]);
    let next = LittleEndian::read_u64(&buf[links + 8..links + 16]);

    Ok(DecodeOutcome::Record {
        record: SlotRecord {
            id,
            tag,
            location: Location::new(offset, len),
            prev,
            next,
        },
        consumed: total,
    })
}
