// src/common/frame.rs

//! Wire format of single packets and bulk-transfer chunks.
//!
//! Packet: `AA AA AA | len | cmd | payload[len] | crc16-le | 55`, with the
//! checksum covering `len`, `cmd` and the payload.
//!
//! Bulk chunk: `3 prefix bytes | 512 data bytes | crc16-le`, with the
//! checksum covering the data bytes only.

use arrayvec::ArrayVec;

use super::crc::{calculate_crc16, encode_crc, verify_crc};
use super::error::GoaError;

/// Marker repeated three times at the start of every packet.
pub const HEADER: u8 = 0xAA;
/// Marker closing every packet.
pub const TRAILER: u8 = 0x55;
/// Byte the device sends after the last bulk chunk.
pub const END: u8 = 0x04;
/// Acknowledgement the host sends for every bulk chunk and for the end byte.
pub const ACK: u8 = 0x06;

/// Maximum payload of a single packet.
pub const MAX_PAYLOAD: usize = 12;
/// Header markers, length, command, checksum and trailer.
pub const PACKET_OVERHEAD: usize = 8;
pub const MAX_PACKET: usize = MAX_PAYLOAD + PACKET_OVERHEAD;
/// Bytes read before the payload length is known.
pub const PACKET_HEADER_LEN: usize = 4;

/// Prefix preceding the data of every bulk chunk.
pub const CHUNK_PREFIX: usize = 3;
/// Data bytes carried by every bulk chunk.
pub const CHUNK_DATA: usize = 512;
pub const CHUNK_LEN: usize = CHUNK_PREFIX + CHUNK_DATA + 2;

/// Fixed-capacity buffer holding one encoded packet.
pub type Packet = ArrayVec<u8, MAX_PACKET>;
/// Fixed-capacity buffer holding the payload of one received packet.
pub type Answer = ArrayVec<u8, MAX_PAYLOAD>;

/// Encodes `command` and `payload` into a complete packet.
///
/// # Returns
///
/// * `Err(GoaError::PayloadTooLarge)` if `payload` exceeds [`MAX_PAYLOAD`].
pub fn encode_packet<E>(command: u8, payload: &[u8]) -> Result<Packet, GoaError<E>>
where
    E: core::fmt::Debug,
{
    if payload.len() > MAX_PAYLOAD {
        return Err(GoaError::PayloadTooLarge { size: payload.len(), max: MAX_PAYLOAD });
    }

    let mut packet = Packet::new();
    packet.extend([HEADER, HEADER, HEADER, payload.len() as u8, command]);
    packet.extend(payload.iter().copied());
    let crc = calculate_crc16(&packet[3..]);
    packet.extend(encode_crc(crc));
    packet.push(TRAILER);
    Ok(packet)
}

/// Validates the first [`PACKET_HEADER_LEN`] bytes of a received packet and
/// returns the payload length they announce.
pub fn payload_length<E>(header: &[u8]) -> Result<usize, GoaError<E>>
where
    E: core::fmt::Debug,
{
    if header.len() < PACKET_HEADER_LEN {
        return Err(GoaError::Truncated { size: header.len(), min: PACKET_HEADER_LEN });
    }

    let found = [header[0], header[1], header[2]];
    if found != [HEADER; 3] {
        return Err(GoaError::UnexpectedHeader { found });
    }

    let length = header[3];
    if length as usize > MAX_PAYLOAD {
        return Err(GoaError::UnexpectedLength { length });
    }

    Ok(length as usize)
}

/// Validates a complete received packet and extracts its payload.
///
/// The echoed command byte is not checked; the device answers every command
/// with its own code.
pub fn decode_packet<E>(packet: &[u8]) -> Result<Answer, GoaError<E>>
where
    E: core::fmt::Debug,
{
    let length = payload_length(packet)?;
    let min = length + PACKET_OVERHEAD;
    if packet.len() < min {
        return Err(GoaError::Truncated { size: packet.len(), min });
    }

    let trailer = packet[length + 7];
    if trailer != TRAILER {
        return Err(GoaError::UnexpectedTrailer { found: trailer });
    }

    verify_crc(&packet[3..length + 5], &packet[length + 5..length + 7])?;

    let mut answer = Answer::new();
    answer.extend(packet[5..5 + length].iter().copied());
    Ok(answer)
}

/// Verifies the checksum of one bulk chunk.
pub fn verify_chunk<E>(chunk: &[u8; CHUNK_LEN]) -> Result<(), GoaError<E>>
where
    E: core::fmt::Debug,
{
    verify_crc(
        &chunk[CHUNK_PREFIX..CHUNK_LEN - 2],
        &chunk[CHUNK_LEN - 2..],
    )
}
