// src/driver/io_helpers.rs

use super::GoaDevice; // Access GoaDevice definition
use crate::common::{
    error::GoaError,
    frame::{self, Answer, MAX_PACKET, PACKET_HEADER_LEN, PACKET_OVERHEAD},
    hal_traits::IoStream,
    timing,
};
use tracing::{error, trace};

// Implementation block for I/O related helpers
impl<IO> GoaDevice<IO>
where
    IO: IoStream,
{
    /// Fills `buf` completely. A read that returns no data means the stream
    /// timed out.
    pub(super) fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), GoaError<IO::Error>> {
        let mut transferred = 0;
        while transferred < buf.len() {
            let count = self.stream.read(&mut buf[transferred..]).map_err(GoaError::Io)?;
            if count == 0 {
                return Err(GoaError::Timeout { expected: buf.len(), transferred });
            }
            transferred += count;
        }
        Ok(())
    }

    /// Writes all of `buf`.
    pub(super) fn write_all(&mut self, buf: &[u8]) -> Result<(), GoaError<IO::Error>> {
        let mut transferred = 0;
        while transferred < buf.len() {
            let count = self.stream.write(&buf[transferred..]).map_err(GoaError::Io)?;
            if count == 0 {
                return Err(GoaError::Timeout { expected: buf.len(), transferred });
            }
            transferred += count;
        }
        Ok(())
    }

    /// Frames and sends one command packet after the inter-command delay.
    pub(super) fn send_packet(&mut self, command: u8, payload: &[u8]) -> Result<(), GoaError<IO::Error>> {
        let packet = frame::encode_packet::<IO::Error>(command, payload)?;

        self.stream.sleep(timing::SEND_DELAY);

        trace!(command, len = payload.len(), "sending packet");
        self.write_all(&packet)
            .inspect_err(|e| error!(error = ?e, "Failed to send the command"))
    }

    /// Reads one answer packet and returns its payload.
    pub(super) fn receive_packet(&mut self) -> Result<Answer, GoaError<IO::Error>> {
        let mut packet = [0u8; MAX_PACKET];

        // Header markers and length first; the length decides how much follows.
        self.read_exact(&mut packet[..PACKET_HEADER_LEN])
            .inspect_err(|e| error!(error = ?e, "Failed to receive the answer"))?;
        let length = frame::payload_length::<IO::Error>(&packet[..PACKET_HEADER_LEN])
            .inspect_err(|e| error!(error = %e, "Unexpected answer header"))?;

        let total = length + PACKET_OVERHEAD;
        self.read_exact(&mut packet[PACKET_HEADER_LEN..total])
            .inspect_err(|e| error!(error = ?e, "Failed to receive the answer"))?;

        let answer = frame::decode_packet::<IO::Error>(&packet[..total])
            .inspect_err(|e| error!(error = %e, "Invalid answer packet"))?;
        trace!(command = packet[4], len = length, "received packet");
        Ok(answer)
    }
}
