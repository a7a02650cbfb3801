// src/common/logbook.rs

//! Logbook scanning, dive header validation and dive record assembly.
//!
//! The logbook is a table of fixed-size entries with the newest entry at the
//! end. A dive record is the 4-byte tag `DC DC <version> <entry_len>`, the
//! logbook entry, and the raw dive data, in that order.

use alloc::vec::Vec;

use super::error::GoaError;
use super::identity::{self, ApiConfig, ApiVersion};
use super::types::{Fingerprint, FINGERPRINT_SIZE};

/// First two bytes of every dive record.
pub const RECORD_MAGIC: [u8; 2] = [0xDC, 0xDC];
/// Magic, version and entry length.
pub const RECORD_TAG_LEN: usize = 4;

/// Bytes between the dive number and the copied header in a v0..v3 logbook
/// entry; the dive data itself does not carry them.
const LEGACY_ENTRY_EXTRA: usize = 5;

/// Location of the start date in v4 dive data and logbook entries.
const V4_DIVE_DATE: usize = 4;
const V4_ENTRY_DATE: usize = 3;
const V4_DATE_LEN: usize = 6;
const V4_DIVE_DIPS: usize = 14;

#[inline]
fn read_u16(data: &[u8]) -> u16 {
    u16::from_le_bytes([data[0], data[1]])
}

/// Dive number of a logbook entry (or of dive data). Zero marks an empty slot.
pub fn dive_number(entry: &[u8]) -> u16 {
    read_u16(entry)
}

/// The fingerprint slice of a logbook entry.
pub fn entry_fingerprint<'a>(entry: &'a [u8], config: &ApiConfig) -> &'a [u8] {
    &entry[config.logbook_fp_offset..config.logbook_fp_offset + FINGERPRINT_SIZE]
}

/// Complete logbook entries, newest first. A partial entry at the start of
/// the table is skipped.
pub fn entries_newest_first<'a>(
    logbook: &'a [u8],
    config: &ApiConfig,
) -> impl Iterator<Item = &'a [u8]> {
    // Includes the oldest slot at offset 0 when the table is an exact
    // multiple of the entry size; every non-empty entry is enumerated.
    logbook.rchunks_exact(config.logbook_entry_len)
}

/// Counts the entries that have not been downloaded yet.
///
/// Walks backwards from the newest entry and stops at the first empty slot or
/// at the entry whose fingerprint equals `fingerprint`; that entry is not
/// counted.
pub fn count_pending(logbook: &[u8], config: &ApiConfig, fingerprint: &Fingerprint) -> usize {
    entries_newest_first(logbook, config)
        .take_while(|entry| dive_number(entry) != 0 && entry_fingerprint(entry, config) != fingerprint)
        .count()
}

/// Checks that downloaded dive data belongs to the given logbook entry.
pub fn validate_dive<E>(config: &ApiConfig, entry: &[u8], dive: &[u8]) -> Result<(), GoaError<E>>
where
    E: core::fmt::Debug,
{
    if config.version.is_v4() {
        validate_v4(entry, dive)
    } else {
        validate_legacy(config.logbook_entry_len, entry, dive)
    }
}

fn validate_legacy<E>(entry_len: usize, entry: &[u8], dive: &[u8]) -> Result<(), GoaError<E>>
where
    E: core::fmt::Debug,
{
    let header_len = entry_len - LEGACY_ENTRY_EXTRA;
    if dive.len() < header_len {
        return Err(GoaError::DiveTooShort { size: dive.len(), min: header_len });
    }

    let (logbook, number) = (dive_number(entry), dive_number(dive));
    if logbook != number {
        return Err(GoaError::DiveNumberMismatch { logbook, dive: number });
    }

    if dive[2..header_len] != entry[2 + LEGACY_ENTRY_EXTRA..entry_len] {
        return Err(GoaError::HeaderMismatch { number });
    }

    Ok(())
}

fn validate_v4<E>(entry: &[u8], dive: &[u8]) -> Result<(), GoaError<E>>
where
    E: core::fmt::Debug,
{
    let min = V4_DIVE_DATE + V4_DATE_LEN;
    if dive.len() < min {
        return Err(GoaError::DiveTooShort { size: dive.len(), min });
    }

    let (logbook, number) = (dive_number(entry), dive_number(dive));
    if logbook != number {
        return Err(GoaError::DiveNumberMismatch { logbook, dive: number });
    }

    let expected = &entry[V4_ENTRY_DATE..V4_ENTRY_DATE + V4_DATE_LEN];
    let found = &dive[V4_DIVE_DATE..V4_DIVE_DATE + V4_DATE_LEN];
    if found != expected {
        let mut logbook = [0u8; V4_DATE_LEN];
        let mut dive = [0u8; V4_DATE_LEN];
        logbook.copy_from_slice(expected);
        dive.copy_from_slice(found);
        return Err(GoaError::StartDateMismatch { logbook, dive });
    }

    if let Some(dips) = dive.get(V4_DIVE_DIPS) {
        tracing::debug!(number, size = dive.len(), dips, "received dive data");
    }

    Ok(())
}

/// Builds the dive record handed to the caller.
pub fn assemble_record<E>(config: &ApiConfig, entry: &[u8], dive: &[u8]) -> Result<Vec<u8>, GoaError<E>>
where
    E: core::fmt::Debug,
{
    let size = RECORD_TAG_LEN + entry.len() + dive.len();
    let mut record = Vec::new();
    record
        .try_reserve_exact(size)
        .map_err(|_| GoaError::OutOfMemory { requested: size })?;

    record.extend_from_slice(&RECORD_MAGIC);
    record.push(config.version.number());
    record.push(config.logbook_entry_len as u8);
    record.extend_from_slice(entry);
    record.extend_from_slice(dive);
    Ok(record)
}

/// Read-only view of a dive record.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DiveRecord<'a> {
    bytes: &'a [u8],
}

impl<'a> DiveRecord<'a> {
    /// Wraps record bytes after checking the tag, that the entry length is
    /// one of the known layouts and that the logbook entry is present.
    pub fn new<E>(bytes: &'a [u8]) -> Result<Self, GoaError<E>>
    where
        E: core::fmt::Debug,
    {
        if bytes.len() < RECORD_TAG_LEN {
            return Err(GoaError::DiveTooShort { size: bytes.len(), min: RECORD_TAG_LEN });
        }
        let found = [bytes[0], bytes[1]];
        if found != RECORD_MAGIC {
            return Err(GoaError::UnexpectedRecordTag { found });
        }
        let length = bytes[3];
        if identity::fingerprint_offset(length as usize).is_none() {
            return Err(GoaError::UnknownEntryLength { length });
        }
        let min = RECORD_TAG_LEN + length as usize;
        if bytes.len() < min {
            return Err(GoaError::DiveTooShort { size: bytes.len(), min });
        }
        Ok(DiveRecord { bytes })
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Raw API version byte from the tag.
    pub fn version(&self) -> u8 {
        self.bytes[2]
    }

    pub fn api_version(&self) -> Option<ApiVersion> {
        match self.version() {
            0 => Some(ApiVersion::V0),
            1 => Some(ApiVersion::V1),
            2 => Some(ApiVersion::V2),
            3 => Some(ApiVersion::V3),
            4 => Some(ApiVersion::V4),
            _ => None,
        }
    }

    pub fn entry_len(&self) -> usize {
        self.bytes[3] as usize
    }

    /// The logbook entry copied in front of the dive data.
    pub fn logbook_entry(&self) -> &'a [u8] {
        &self.bytes[RECORD_TAG_LEN..RECORD_TAG_LEN + self.entry_len()]
    }

    /// The dive data exactly as downloaded.
    pub fn dive_data(&self) -> &'a [u8] {
        &self.bytes[RECORD_TAG_LEN + self.entry_len()..]
    }

    pub fn dive_number(&self) -> u16 {
        dive_number(self.logbook_entry())
    }

    /// Fingerprint stored in the logbook entry, if the entry layout is known.
    pub fn fingerprint(&self) -> Option<&'a [u8]> {
        let offset = identity::fingerprint_offset(self.entry_len())?;
        Some(&self.logbook_entry()[offset..offset + FINGERPRINT_SIZE])
    }
}
