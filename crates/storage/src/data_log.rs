//! Append-only payload log.
//!
//! One data log backs one bucket. Payloads are framed as
//! `[len: u32][crc32(payload): u32][payload]` and identified by the byte
//! offset of the frame. Records are written once and never modified or
//! removed; the log only grows.
//!
//! ## Visibility
//!
//! `append` publishes the new logical end with a release store only
//! after the frame is fully written, so a reader that obtained the
//! returned [`Location`] always sees a complete record. Durability to
//! disk is deferred to [`DataLog::sync`], which the owning bucket calls
//! at close.

use crate::fs::{read_exact_at, write_all_at};
use byteorder::{ByteOrder, LittleEndian};
use parking_lot::Mutex;
use spandb_core::{Location, Result, StoreError};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// Bytes of framing in front of every payload: length + checksum.
pub const RECORD_HEADER_LEN: u64 = 8;

/// Append-only record log with concurrent positioned reads.
pub struct DataLog {
    file: File,
    path: PathBuf,
    /// Published logical end; readers bound-check against this.
    end: AtomicU64,
    /// Append cursor; appends are serialized by the owning bucket, the
    /// mutex keeps the log safe on its own as well.
    append_pos: Mutex<u64>,
}

impl DataLog {
    /// Open the log at `path`, creating it if absent.
    ///
    /// The current file length becomes the logical end; record framing
    /// is validated lazily on read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;
        let end = file.metadata()?.len();

        debug!(path = %path.display(), end, "data log opened");

        Ok(DataLog {
            file,
            path,
            end: AtomicU64::new(end),
            append_pos: Mutex::new(end),
        })
    }

    /// Append one payload and return its stable location.
    pub fn append(&self, payload: &[u8]) -> Result<Location> {
        if payload.len() > u32::MAX as usize {
            return Err(StoreError::Internal(format!(
                "payload of {} bytes exceeds record limit",
                payload.len()
            )));
        }

        let mut frame = vec![0u8; RECORD_HEADER_LEN as usize + payload.len()];
        LittleEndian::write_u32(&mut frame[0..4], payload.len() as u32);
        LittleEndian::write_u32(&mut frame[4..8], crc32fast::hash(payload));
        frame[RECORD_HEADER_LEN as usize..].copy_from_slice(payload);

        let mut pos = self.append_pos.lock();
        let offset = *pos;
        write_all_at(&self.file, &frame, offset)?;
        *pos = offset + frame.len() as u64;
        self.end.store(*pos, Ordering::Release);
        drop(pos);

        trace!(offset, len = payload.len(), "record appended");
        Ok(Location::new(offset, payload.len() as u32))
    }

    /// Read the payload at `location`.
    ///
    /// A location outside the published end, a framing length that
    /// disagrees with the location, or a checksum mismatch all indicate
    /// that the index and the log have diverged, which is fatal to the
    /// bucket.
    pub fn read(&self, location: Location) -> Result<Vec<u8>> {
        let end = self.end.load(Ordering::Acquire);
        let record_end = location
            .offset
            .checked_add(RECORD_HEADER_LEN + u64::from(location.len))
            .ok_or_else(|| {
                StoreError::Corruption(format!("location {} overflows the log", location))
            })?;
        if record_end > end {
            return Err(StoreError::Corruption(format!(
                "location {} is beyond the log end {}",
                location, end
            )));
        }

        let mut header = [0u8; RECORD_HEADER_LEN as usize];
        read_exact_at(&self.file, &mut header, location.offset)?;
        let stored_len = LittleEndian::read_u32(&header[0..4]);
        let stored_crc = LittleEndian::read_u32(&header[4..8]);
        if stored_len != location.len {
            return Err(StoreError::Corruption(format!(
                "record at {} frames {} bytes but index expects {}",
                location.offset, stored_len, location.len
            )));
        }

        let mut payload = vec![0u8; location.len as usize];
        read_exact_at(&self.file, &mut payload, location.offset + RECORD_HEADER_LEN)?;
        if crc32fast::hash(&payload) != stored_crc {
            return Err(StoreError::Corruption(format!(
                "checksum mismatch for record at {}",
                location.offset
            )));
        }

        Ok(payload)
    }

    /// Flush all appended records to disk.
    pub fn sync(&self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Logical end of the log in bytes.
    pub fn len(&self) -> u64 {
        self.end.load(Ordering::Acquire)
    }

    /// True when the log holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for DataLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataLog")
            .field("path", &self.path)
            .field("end", &self.len())
            .finish()
    }
}
