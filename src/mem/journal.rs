//! Append-only mutation journal of the embedded store.
//!
//! Record format:
//! ```text
//! +----------+---------+------+---------+
//! | Checksum | Length  | Type | Payload |
//! +----------+---------+------+---------+
//! | 4 bytes  | 4 bytes | 1 B  | N bytes |
//! +----------+---------+------+---------+
//! ```
//!
//! The checksum is CRC32 over the type byte and the payload. Payload fields
//! are length-prefixed byte strings followed by a big-endian timestamp.
//!
//! A record cut short at the tail of the file is a torn write and ends
//! replay. A checksum mismatch anywhere is corruption.

use std::{
    fs::{File, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use crc32fast::Hasher;

use crate::util::Status;

pub const HEADER_SIZE: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum RecordType {
    Put = 1,
    DeleteRow = 2,
    DeleteFamily = 3,
    DeleteColumns = 4,
    DeleteVersion = 5,
}

impl RecordType {
    fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(RecordType::Put),
            2 => Some(RecordType::DeleteRow),
            3 => Some(RecordType::DeleteFamily),
            4 => Some(RecordType::DeleteColumns),
            5 => Some(RecordType::DeleteVersion),
            _ => None,
        }
    }
}

/// One journaled mutation of a single cell group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalRecord {
    Put {
        table: String,
        row: Bytes,
        family: Bytes,
        qualifier: Bytes,
        timestamp: i64,
        value: Bytes,
    },
    DeleteRow {
        table: String,
        row: Bytes,
        timestamp: i64,
    },
    DeleteFamily {
        table: String,
        row: Bytes,
        family: Bytes,
        timestamp: i64,
    },
    DeleteColumns {
        table: String,
        row: Bytes,
        family: Bytes,
        qualifier: Bytes,
        timestamp: i64,
    },
    DeleteVersion {
        table: String,
        row: Bytes,
        family: Bytes,
        qualifier: Bytes,
        timestamp: i64,
    },
}

impl JournalRecord {
    pub fn table(&self) -> &str {
        match self {
            JournalRecord::Put { table, .. }
            | JournalRecord::DeleteRow { table, .. }
            | JournalRecord::DeleteFamily { table, .. }
            | JournalRecord::DeleteColumns { table, .. }
            | JournalRecord::DeleteVersion { table, .. } => table,
        }
    }

    fn record_type(&self) -> RecordType {
        match self {
            JournalRecord::Put { .. } => RecordType::Put,
            JournalRecord::DeleteRow { .. } => RecordType::DeleteRow,
            JournalRecord::DeleteFamily { .. } => RecordType::DeleteFamily,
            JournalRecord::DeleteColumns { .. } => RecordType::DeleteColumns,
            JournalRecord::DeleteVersion { .. } => RecordType::DeleteVersion,
        }
    }

    fn encode_payload(&self) -> Bytes {
        let mut buf = BytesMut::new();
        match self {
            JournalRecord::Put {
                table,
                row,
                family,
                qualifier,
                timestamp,
                value,
            } => {
                put_field(&mut buf, table.as_bytes());
                put_field(&mut buf, row);
                put_field(&mut buf, family);
                put_field(&mut buf, qualifier);
                buf.put_i64(*timestamp);
                put_field(&mut buf, value);
            }
            JournalRecord::DeleteRow {
                table,
                row,
                timestamp,
            } => {
                put_field(&mut buf, table.as_bytes());
                put_field(&mut buf, row);
                buf.put_i64(*timestamp);
            }
            JournalRecord::DeleteFamily {
                table,
                row,
                family,
                timestamp,
            } => {
                put_field(&mut buf, table.as_bytes());
                put_field(&mut buf, row);
                put_field(&mut buf, family);
                buf.put_i64(*timestamp);
            }
            JournalRecord::DeleteColumns {
                table,
                row,
                family,
                qualifier,
                timestamp,
            }
            | JournalRecord::DeleteVersion {
                table,
                row,
                family,
                qualifier,
                timestamp,
            } => {
                put_field(&mut buf, table.as_bytes());
                put_field(&mut buf, row);
                put_field(&mut buf, family);
                put_field(&mut buf, qualifier);
                buf.put_i64(*timestamp);
            }
        }
        buf.freeze()
    }

    fn decode_payload(record_type: RecordType, payload: &[u8]) -> Result<Self, Status> {
        let mut buf = payload;
        let table = String::from_utf8(get_field(&mut buf)?.to_vec())
            .map_err(|_| Status::corruption("journal table name is not UTF-8"))?;
        let row = get_field(&mut buf)?;
        let record = match record_type {
            RecordType::Put => {
                let family = get_field(&mut buf)?;
                let qualifier = get_field(&mut buf)?;
                let timestamp = get_i64(&mut buf)?;
                let value = get_field(&mut buf)?;
                JournalRecord::Put {
                    table,
                    row,
                    family,
                    qualifier,
                    timestamp,
                    value,
                }
            }
            RecordType::DeleteRow => JournalRecord::DeleteRow {
                table,
                row,
                timestamp: get_i64(&mut buf)?,
            },
            RecordType::DeleteFamily => {
                let family = get_field(&mut buf)?;
                JournalRecord::DeleteFamily {
                    table,
                    row,
                    family,
                    timestamp: get_i64(&mut buf)?,
                }
            }
            RecordType::DeleteColumns | RecordType::DeleteVersion => {
                let family = get_field(&mut buf)?;
                let qualifier = get_field(&mut buf)?;
                let timestamp = get_i64(&mut buf)?;
                if record_type == RecordType::DeleteColumns {
                    JournalRecord::DeleteColumns {
                        table,
                        row,
                        family,
                        qualifier,
                        timestamp,
                    }
                } else {
                    JournalRecord::DeleteVersion {
                        table,
                        row,
                        family,
                        qualifier,
                        timestamp,
                    }
                }
            }
        };
        if buf.has_remaining() {
            return Err(Status::corruption("trailing bytes in journal record"));
        }
        Ok(record)
    }
}

fn put_field(buf: &mut BytesMut, field: &[u8]) {
    buf.put_u32(field.len() as u32);
    buf.put_slice(field);
}

fn get_field(buf: &mut &[u8]) -> Result<Bytes, Status> {
    if buf.remaining() < 4 {
        return Err(Status::corruption("journal record truncated"));
    }
    let len = buf.get_u32() as usize;
    if buf.remaining() < len {
        return Err(Status::corruption("journal field truncated"));
    }
    let field = Bytes::copy_from_slice(&buf[..len]);
    buf.advance(len);
    Ok(field)
}

fn get_i64(buf: &mut &[u8]) -> Result<i64, Status> {
    if buf.remaining() < 8 {
        return Err(Status::corruption("journal timestamp truncated"));
    }
    Ok(buf.get_i64())
}

fn calculate_checksum(record_type: RecordType, payload: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[record_type as u8]);
    hasher.update(payload);
    hasher.finalize()
}

/// Appends records to a journal file.
pub struct Journal {
    path: PathBuf,
    file: File,
    offset: u64,
}

impl Journal {
    /// Open `path` for appending, creating it if missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Status> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| Status::io_error(format!("failed to open journal {}: {e}", path.display())))?;
        let offset = file.metadata()?.len();
        Ok(Journal { path, file, offset })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes written to the file so far, including pre-existing content.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Append one record, returning the number of bytes written.
    pub fn append(&mut self, record: &JournalRecord) -> Result<usize, Status> {
        let record_type = record.record_type();
        let payload = record.encode_payload();
        let length = u32::try_from(payload.len())
            .map_err(|_| Status::invalid_argument("journal record too large"))?;

        let mut frame = BytesMut::with_capacity(HEADER_SIZE + payload.len());
        frame.put_u32_le(calculate_checksum(record_type, &payload));
        frame.put_u32_le(length);
        frame.put_u8(record_type as u8);
        frame.put_slice(&payload);

        self.file
            .write_all(&frame)
            .map_err(|e| Status::io_error(format!("journal write failed: {e}")))?;
        self.offset += frame.len() as u64;
        Ok(frame.len())
    }

    pub fn sync(&mut self) -> Result<(), Status> {
        self.file
            .sync_all()
            .map_err(|e| Status::io_error(format!("journal sync failed: {e}")))
    }

    /// Read every intact record of the journal at `path`.
    ///
    /// A missing file is an empty journal.
    pub fn replay(path: impl AsRef<Path>) -> Result<Vec<JournalRecord>, Status> {
        let data = match std::fs::read(path.as_ref()) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        let mut buf = data.as_slice();
        while buf.remaining() >= HEADER_SIZE {
            let checksum = buf.get_u32_le();
            let length = buf.get_u32_le() as usize;
            let type_byte = buf.get_u8();
            if buf.remaining() < length {
                tracing::warn!(
                    path = %path.as_ref().display(),
                    "dropping torn journal record at tail"
                );
                break;
            }
            let record_type = RecordType::from_u8(type_byte)
                .ok_or_else(|| Status::corruption(format!("unknown journal record type {type_byte}")))?;
            let payload = &buf[..length];
            if calculate_checksum(record_type, payload) != checksum {
                return Err(Status::corruption("journal checksum mismatch"));
            }
            records.push(JournalRecord::decode_payload(record_type, payload)?);
            buf.advance(length);
        }
        Ok(records)
    }
}
