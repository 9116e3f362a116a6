//! Audit segment files with CRC32-checked entry frames
//!
//! Layout: a 16 byte header `[magic: u32][version: u32][reserved: u64]`
//! followed by entry frames `[length: u32][crc32: u32][payload]`. Readers
//! scan to end-of-file rather than trusting a header count, so a segment cut
//! short by a crash still replays every complete frame.

use anyhow::{Result, anyhow};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc32fast::Hasher;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tracing::trace;

/// Size of the segment header in bytes
pub(crate) const SEGMENT_HEADER_SIZE: u64 = 16;

/// Magic number for audit segment files ("TXAL")
const SEGMENT_MAGIC: u32 = 0x5458_414C;

/// Version of the segment format
const SEGMENT_VERSION: u32 = 1;

/// A single audit segment open for appending
pub struct Segment {
    path: PathBuf,
    file: BufWriter<File>,
    size: u64,
}

impl Segment {
    /// Create a new segment file
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut writer = BufWriter::with_capacity(64 * 1024, file);
        writer.write_u32::<LittleEndian>(SEGMENT_MAGIC)?;
        writer.write_u32::<LittleEndian>(SEGMENT_VERSION)?;
        writer.write_u64::<LittleEndian>(0)?; // Reserved
        writer.flush()?;

        Ok(Self {
            path: path.to_path_buf(),
            file: writer,
            size: SEGMENT_HEADER_SIZE,
        })
    }

    /// Append one entry frame to the segment
    pub fn append(&mut self, data: &[u8]) -> Result<()> {
        let mut hasher = Hasher::new();
        hasher.update(data);
        let crc = hasher.finalize();

        // SAFETY: usize to u32 - audit records are tens of bytes
        #[allow(clippy::cast_possible_truncation)]
        let data_len = data.len() as u32;
        self.file.write_u32::<LittleEndian>(data_len)?;
        self.file.write_u32::<LittleEndian>(crc)?;
        self.file.write_all(data)?;

        self.size += 8 + data.len() as u64;
        trace!(segment = %self.path.display(), bytes = data.len(), "appended audit entry");
        Ok(())
    }

    /// True when appending `next_entry_size` bytes would exceed `max_size`
    #[must_use]
    pub const fn is_full(&self, next_entry_size: usize, max_size: u64) -> bool {
        self.size
            .saturating_add(8)
            .saturating_add(next_entry_size as u64)
            > max_size
    }

    /// Flush buffered frames and fsync the file
    pub fn flush(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.get_mut().sync_all()?;
        Ok(())
    }

    /// Current size of the segment in bytes
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Open a segment file for reading
    pub fn open(path: &Path) -> Result<SegmentReader> {
        let file = File::open(path)?;
        let mut reader = BufReader::with_capacity(64 * 1024, file);

        let magic = reader.read_u32::<LittleEndian>()?;
        if magic != SEGMENT_MAGIC {
            return Err(anyhow!("invalid segment magic: {:#x}", magic));
        }
        let version = reader.read_u32::<LittleEndian>()?;
        if version != SEGMENT_VERSION {
            return Err(anyhow!("unsupported segment version: {}", version));
        }
        let _reserved = reader.read_u64::<LittleEndian>()?;

        Ok(SegmentReader { reader })
    }
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segment")
            .field("path", &self.path)
            .field("size", &self.size)
            .finish()
    }
}

/// Sequential reader over a segment's entry frames
pub struct SegmentReader {
    reader: BufReader<File>,
}

impl SegmentReader {
    /// Read the next entry, or `None` at a clean end-of-file.
    ///
    /// A frame cut short mid-header or mid-payload, or a CRC mismatch, is an
    /// error.
    pub fn read_next(&mut self) -> Result<Option<Vec<u8>>> {
        let length = match self.reader.read_u32::<LittleEndian>() {
            Ok(length) => length as usize,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let expected_crc = self.reader.read_u32::<LittleEndian>()?;

        let mut data = vec![0u8; length];
        self.reader.read_exact(&mut data)?;

        let mut hasher = Hasher::new();
        hasher.update(&data);
        let actual_crc = hasher.finalize();
        if actual_crc != expected_crc {
            return Err(anyhow!(
                "CRC mismatch: expected {:#x}, got {:#x}",
                expected_crc,
                actual_crc
            ));
        }

        Ok(Some(data))
    }
}

impl std::fmt::Debug for SegmentReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentReader").finish_non_exhaustive()
    }
}
