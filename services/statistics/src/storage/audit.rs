//! Segmented append-only audit log
//!
//! Records are bincode-framed into CRC-checked segment files named
//! `NNNNNNNNNN.wal`, rotated at a configured size. Appends land in a buffer;
//! `flush` makes them durable. Replay streams every record, optionally from a
//! starting event time.

use super::events::AuditEvent;
use super::segment::{Segment, SegmentReader};
use anyhow::{Result, anyhow};
use services_common::Ts;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default segment rotation size (64 MB)
const DEFAULT_SEGMENT_SIZE: u64 = 64 * 1024 * 1024;

/// Append-only audit log over rotating segment files
pub struct AuditLog {
    dir: PathBuf,
    segment_size: u64,
    current_segment: Option<Segment>,
    segment_counter: u64,
}

impl AuditLog {
    /// Open (creating if necessary) an audit log in `dir`
    pub fn new(dir: &Path, segment_size: Option<u64>) -> Result<Self> {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }

        let segment_size = segment_size.unwrap_or(DEFAULT_SEGMENT_SIZE);
        let segment_counter = Self::latest_segment_number(dir)?;

        info!(
            dir = %dir.display(),
            segment_size_mb = segment_size / (1024 * 1024),
            "initialized audit log"
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            segment_size,
            current_segment: None,
            segment_counter,
        })
    }

    /// Append one audit record
    pub fn append(&mut self, event: &AuditEvent) -> Result<()> {
        let data = bincode::serialize(event)?;

        let needs_rotation = match &self.current_segment {
            None => true,
            Some(segment) => segment.is_full(data.len(), self.segment_size),
        };
        if needs_rotation {
            self.rotate_segment()?;
        }

        match &mut self.current_segment {
            Some(segment) => segment.append(&data),
            None => Err(anyhow!("failed to create audit segment")),
        }
    }

    /// Flush the current segment to disk (fsync)
    pub fn flush(&mut self) -> Result<()> {
        if let Some(segment) = &mut self.current_segment {
            segment.flush()?;
        }
        Ok(())
    }

    /// Stream records, skipping those with an event time before `from`
    pub fn stream(&self, from: Option<Ts>) -> Result<AuditIterator> {
        AuditIterator::new(&self.dir, from)
    }

    /// Counts and sizes across all segments
    pub fn stats(&self) -> Result<AuditStats> {
        let segments = Self::list_segments(&self.dir)?;
        let mut total_size = 0;
        let mut total_entries = 0u64;

        for segment_path in &segments {
            total_size += fs::metadata(segment_path)?.len();
            let mut reader = Segment::open(segment_path)?;
            while reader.read_next()?.is_some() {
                total_entries += 1;
            }
        }

        Ok(AuditStats {
            segment_count: segments.len() as u64,
            total_size,
            total_entries,
        })
    }

    fn rotate_segment(&mut self) -> Result<()> {
        if let Some(segment) = &mut self.current_segment {
            segment.flush()?;
        }

        self.segment_counter += 1;
        let segment_path = self.segment_path(self.segment_counter);
        self.current_segment = Some(Segment::create(&segment_path)?);

        debug!(segment = %segment_path.display(), "rotated to new audit segment");
        Ok(())
    }

    fn segment_path(&self, counter: u64) -> PathBuf {
        self.dir.join(format!("{counter:010}.wal"))
    }

    fn latest_segment_number(dir: &Path) -> Result<u64> {
        Ok(Self::list_segments(dir)?
            .iter()
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(|s| s.parse::<u64>().ok())
            })
            .max()
            .unwrap_or(0))
    }

    fn list_segments(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut segments: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(Result::ok)
            .filter(|entry| entry.path().extension().and_then(|s| s.to_str()) == Some("wal"))
            .map(|entry| entry.path())
            .collect();

        segments.sort();
        Ok(segments)
    }
}

impl Drop for AuditLog {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!("failed to flush audit log on drop: {}", e);
        }
    }
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog")
            .field("dir", &self.dir)
            .field("segment_size", &self.segment_size)
            .field("segment_counter", &self.segment_counter)
            .finish_non_exhaustive()
    }
}

/// Statistics about the audit log
#[derive(Debug)]
pub struct AuditStats {
    /// Number of segment files
    pub segment_count: u64,
    /// Total size in bytes
    pub total_size: u64,
    /// Total number of records
    pub total_entries: u64,
}

/// Iterator over audit records across all segments
pub struct AuditIterator {
    segments: Vec<PathBuf>,
    current_reader: Option<SegmentReader>,
    current_index: usize,
    from: Option<Ts>,
}

impl AuditIterator {
    fn new(dir: &Path, from: Option<Ts>) -> Result<Self> {
        Ok(Self {
            segments: AuditLog::list_segments(dir)?,
            current_reader: None,
            current_index: 0,
            from,
        })
    }

    /// Read the next record
    pub fn read_next_entry(&mut self) -> Result<Option<AuditEvent>> {
        loop {
            if self.current_reader.is_none() {
                if self.current_index >= self.segments.len() {
                    return Ok(None);
                }
                self.current_reader = Some(Segment::open(&self.segments[self.current_index])?);
                self.current_index += 1;
            }

            if let Some(reader) = &mut self.current_reader {
                match reader.read_next()? {
                    Some(data) => {
                        let event: AuditEvent = bincode::deserialize(&data)?;
                        if let Some(from) = self.from {
                            if event.timestamp < from {
                                continue;
                            }
                        }
                        return Ok(Some(event));
                    }
                    None => {
                        self.current_reader = None;
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for AuditIterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditIterator")
            .field("segments", &self.segments)
            .field("current_index", &self.current_index)
            .field("from", &self.from)
            .finish_non_exhaustive()
    }
}
