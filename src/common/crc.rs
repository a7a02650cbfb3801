// src/common/crc.rs

use super::error::GoaError;
use crc::{Algorithm, Crc};

/// CRC-16/CCITT as used on the Goa link (also known as CRC-16/XMODEM).
/// Polynomial: 0x1021
/// Initial Value: 0x0000
/// Input Reflected: false
/// Output Reflected: false
/// Final XOR: 0x0000
/// Check Value: 0x31C3 (for "123456789")
pub const GOA_CRC: Algorithm<u16> = Algorithm {
    width: 16,
    poly: 0x1021,
    init: 0x0000,
    refin: false,
    refout: false,
    xorout: 0x0000,
    check: 0x31C3,
    residue: 0x0000,
};

const CRC_COMPUTER: Crc<u16> = Crc::<u16>::new(&GOA_CRC);

/// Calculates the CRC-16/CCITT of `data`.
///
/// For single packets the covered region starts at the length byte (the three
/// header markers are excluded) and ends with the last payload byte. For bulk
/// chunks it is the 512 data bytes between the 3-byte prefix and the checksum.
#[inline]
pub fn calculate_crc16(data: &[u8]) -> u16 {
    CRC_COMPUTER.checksum(data)
}

/// Encodes a 16-bit CRC value into two bytes, LSB first.
pub fn encode_crc(crc_value: u16) -> [u8; 2] {
    crc_value.to_le_bytes()
}

/// Decodes two bytes (LSB first) into a 16-bit CRC value.
///
/// # Panics
///
/// Panics if `crc_bytes` does not have a length of exactly 2.
pub fn decode_crc(crc_bytes: &[u8]) -> u16 {
    assert_eq!(crc_bytes.len(), 2, "CRC must be 2 bytes long");
    u16::from_le_bytes([crc_bytes[0], crc_bytes[1]])
}

/// Verifies `data` against the little-endian checksum that was sent with it.
///
/// # Returns
///
/// * `Ok(())` if the CRC is valid.
/// * `Err(GoaError::CrcMismatch)` if the CRCs don't match.
pub fn verify_crc<E>(data: &[u8], crc_bytes: &[u8]) -> Result<(), GoaError<E>>
where
    E: core::fmt::Debug,
{
    let received = decode_crc(crc_bytes);
    let calculated = calculate_crc16(data);

    if received == calculated {
        Ok(())
    } else {
        Err(GoaError::CrcMismatch { expected: received, calculated })
    }
}
