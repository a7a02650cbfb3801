// src/common/error.rs

/// Coarse classification of a [`GoaError`].
///
/// Callers deciding whether to retry an operation only need this; the variants
/// of `GoaError` carry the diagnostic detail.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// The caller passed something the driver cannot use.
    InvalidArgument,
    /// The transport failed or timed out.
    Io,
    /// The device sent bytes that violate the framing rules.
    Protocol,
    /// Framing was fine, but the contents are inconsistent.
    DataFormat,
    /// A buffer could not grow.
    OutOfMemory,
    /// The device is not one this driver knows how to talk to.
    Unsupported,
}

#[derive(Debug, thiserror::Error)]
pub enum GoaError<E = ()>
where
    E: core::fmt::Debug,
{
    /// Underlying I/O error from the stream implementation.
    #[error("I/O error: {0:?}")]
    Io(E),

    /// The stream returned fewer bytes than requested before its timeout expired.
    #[error("Operation timed out after {transferred} of {expected} bytes")]
    Timeout { expected: usize, transferred: usize },

    /// Outgoing payload does not fit in a single packet.
    #[error("Payload too large: {size} bytes, at most {max} allowed")]
    PayloadTooLarge { size: usize, max: usize },

    /// Fingerprint must be empty (reset) or exactly the fingerprint size.
    #[error("Invalid fingerprint size: {size} bytes")]
    InvalidFingerprintSize { size: usize },

    /// One of the three header marker bytes was wrong.
    #[error("Unexpected header bytes: {found:02x?}")]
    UnexpectedHeader { found: [u8; 3] },

    /// A received packet is shorter than its header or announced length requires.
    #[error("Truncated packet: {size} bytes, expected at least {min}")]
    Truncated { size: usize, min: usize },

    /// The length byte of a received packet exceeds the packet capacity.
    #[error("Unexpected payload size: {length}")]
    UnexpectedLength { length: u8 },

    /// The trailer byte of a received packet was wrong.
    #[error("Unexpected trailer byte: {found:#04x}")]
    UnexpectedTrailer { found: u8 },

    /// Received CRC does not match calculated CRC.
    #[error("CRC mismatch: expected {expected:#06x}, calculated {calculated:#06x}")]
    CrcMismatch { expected: u16, calculated: u16 },

    /// The byte closing a bulk transfer was not the end marker.
    #[error("Unexpected end byte: {found:#04x}")]
    UnexpectedEndByte { found: u8 },

    /// The dive payload is too short to hold the header it is checked against.
    #[error("Dive data too short: {size} bytes, expected at least {min}")]
    DiveTooShort { size: usize, min: usize },

    /// Dive number in the dive payload differs from the logbook entry.
    #[error("Unexpected dive number {dive} != {logbook}")]
    DiveNumberMismatch { logbook: u16, dive: u16 },

    /// Dive header differs from the copy stored in the logbook entry.
    #[error("Unexpected dive header for dive {number}")]
    HeaderMismatch { number: u16 },

    /// Start date in the dive payload differs from the logbook entry.
    #[error("Unexpected start date {dive:02x?} != {logbook:02x?}")]
    StartDateMismatch { logbook: [u8; 6], dive: [u8; 6] },

    /// A dive record announces a logbook entry length no device family uses.
    #[error("Unknown logbook entry length: {length}")]
    UnknownEntryLength { length: u8 },

    /// A dive record does not start with the record tag.
    #[error("Unexpected record tag: {found:02x?}")]
    UnexpectedRecordTag { found: [u8; 2] },

    /// A buffer could not be grown.
    #[error("Out of memory: failed to reserve {requested} bytes")]
    OutOfMemory { requested: usize },

    /// Identification answer has a length no known device family uses.
    #[error("Unrecognized identification length: {length} bytes")]
    UnrecognizedIdentification { length: usize },

    #[error("Unknown model {0}")]
    UnknownModel(u8),

    #[error("Unknown firmware version {0}")]
    UnknownFirmware(u16),

    /// Model and firmware are known individually but not as a combination.
    #[error("Firmware version {firmware} of model {model} not known to support API v{version}")]
    UnsupportedCombination { model: u8, firmware: u16, version: u8 },
}

impl<E: core::fmt::Debug> GoaError<E> {
    /// Maps this error onto its [`ErrorKind`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            GoaError::PayloadTooLarge { .. } | GoaError::InvalidFingerprintSize { .. } => {
                ErrorKind::InvalidArgument
            }
            GoaError::Io(_) | GoaError::Timeout { .. } => ErrorKind::Io,
            GoaError::UnexpectedHeader { .. }
            | GoaError::Truncated { .. }
            | GoaError::UnexpectedLength { .. }
            | GoaError::UnexpectedTrailer { .. }
            | GoaError::CrcMismatch { .. }
            | GoaError::UnexpectedEndByte { .. } => ErrorKind::Protocol,
            GoaError::DiveTooShort { .. }
            | GoaError::DiveNumberMismatch { .. }
            | GoaError::HeaderMismatch { .. }
            | GoaError::StartDateMismatch { .. }
            | GoaError::UnknownEntryLength { .. }
            | GoaError::UnexpectedRecordTag { .. } => ErrorKind::DataFormat,
            GoaError::OutOfMemory { .. } => ErrorKind::OutOfMemory,
            GoaError::UnrecognizedIdentification { .. }
            | GoaError::UnknownModel(_)
            | GoaError::UnknownFirmware(_)
            | GoaError::UnsupportedCombination { .. } => ErrorKind::Unsupported,
        }
    }
}
