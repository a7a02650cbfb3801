// src/driver/transaction.rs

use super::GoaDevice;
use crate::common::{
    command::Command,
    error::GoaError,
    frame::{self, Answer, ACK, CHUNK_DATA, CHUNK_LEN, CHUNK_PREFIX, END},
    hal_traits::IoStream,
    timing,
    types::{DeviceEvent, Progress},
};
use alloc::vec::Vec;
use tracing::{debug, error};

/// The first chunk starts with the little-endian length of the remaining data.
const LENGTH_PREFIX: usize = 2;

impl<IO> GoaDevice<IO>
where
    IO: IoStream,
{
    /// Sends a command answered by a single packet and returns the answer payload.
    pub(super) fn exchange(&mut self, command: &Command) -> Result<Answer, GoaError<IO::Error>> {
        debug_assert!(!command.has_bulk_answer());
        self.send_packet(command.code(), &command.payload())?;
        self.receive_packet()
    }

    /// Sends a command whose answer packet is followed by a bulk transfer.
    /// The bulk data replaces the contents of `buffer`.
    pub(super) fn transfer(
        &mut self,
        command: &Command,
        buffer: &mut Vec<u8>,
        progress: Option<&mut Progress>,
    ) -> Result<Answer, GoaError<IO::Error>> {
        debug_assert!(command.has_bulk_answer());
        self.send_packet(command.code(), &command.payload())?;
        let answer = self.receive_packet()?;
        self.download(buffer, progress)?;
        Ok(answer)
    }

    /// Receives one bulk transfer.
    ///
    /// Every 517-byte chunk is checked and acknowledged before the next one is
    /// read. The first two data bytes give the length of what follows; they
    /// count toward the transfer but are not stored. `progress` advances from
    /// its current value by up to [`timing::PROGRESS_STEPS`] and an event is
    /// emitted after every chunk.
    pub(super) fn download(
        &mut self,
        buffer: &mut Vec<u8>,
        mut progress: Option<&mut Progress>,
    ) -> Result<(), GoaError<IO::Error>> {
        buffer.clear();

        let initial = progress.as_deref().map_or(0, |p| p.current);
        let mut chunk = [0u8; CHUNK_LEN];
        let mut skip = LENGTH_PREFIX;
        let mut size = LENGTH_PREFIX;
        let mut nbytes = 0;

        while nbytes < size {
            self.read_exact(&mut chunk)
                .inspect_err(|e| error!(error = ?e, "Failed to receive the answer"))?;
            frame::verify_chunk::<IO::Error>(&chunk)
                .inspect_err(|e| error!(error = %e, "Unexpected answer checksum"))?;
            self.write_all(&[ACK])
                .inspect_err(|e| error!(error = ?e, "Failed to send the ack"))?;

            if nbytes == 0 {
                let announced = u16::from_le_bytes([chunk[CHUNK_PREFIX], chunk[CHUNK_PREFIX + 1]]);
                size += announced as usize;
                debug!(size, "bulk transfer started");
            }

            let length = (size - nbytes).min(CHUNK_DATA);
            let data = &chunk[CHUNK_PREFIX + skip..CHUNK_PREFIX + length];
            buffer
                .try_reserve(data.len())
                .map_err(|_| GoaError::OutOfMemory { requested: buffer.len() + data.len() })
                .inspect_err(|_| error!("Insufficient buffer space available"))?;
            buffer.extend_from_slice(data);

            nbytes += length;
            skip = 0;

            if let Some(progress) = progress.as_deref_mut() {
                progress.current = initial + timing::progress_step(nbytes, size);
                let snapshot = *progress;
                self.emit(DeviceEvent::Progress(snapshot));
            }
        }

        let mut end = [0u8; 1];
        self.read_exact(&mut end)
            .inspect_err(|e| error!(error = ?e, "Failed to receive the end byte"))?;
        if end[0] != END {
            error!(found = end[0], "Unexpected end byte");
            return Err(GoaError::UnexpectedEndByte { found: end[0] });
        }

        self.write_all(&[ACK])
            .inspect_err(|e| error!(error = ?e, "Failed to send the ack"))
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::super::mock::{bulk_answer, device_packet, EventLog, MockStream};
    use super::*;
    use crate::common::{
        command::{CMD_DIVE, CMD_LOGBOOK, CMD_VERSION},
        error::ErrorKind,
    };
    use alloc::vec;

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 + 3) as u8).collect()
    }

    #[test]
    fn test_exchange() {
        let mut stream = MockStream::new();
        stream.queue(&device_packet(CMD_VERSION, &[9, 8, 7]));
        let mut device = GoaDevice::new(&mut stream);
        let answer = device.exchange(&Command::Version).unwrap();
        assert_eq!(answer.as_slice(), &[9, 8, 7]);
        assert_eq!(stream.tx, vec![0xAA, 0xAA, 0xAA, 0x00, 0x00, 0x00, 0x00, 0x55]);
    }

    #[test]
    fn test_download_empty() {
        let mut stream = MockStream::new();
        stream.queue(&bulk_answer(&[]));
        let mut device = GoaDevice::new(&mut stream);
        let mut buffer = vec![0xFF; 4];
        device.download(&mut buffer, None).unwrap();
        assert!(buffer.is_empty());
        // one chunk, then the end byte
        assert_eq!(stream.tx, vec![ACK, ACK]);
        assert!(stream.rx.is_empty());
    }

    #[test]
    fn test_download_single_chunk() {
        let data = pattern(100);
        let mut stream = MockStream::new();
        stream.queue(&bulk_answer(&data));
        let mut device = GoaDevice::new(&mut stream);
        let mut buffer = Vec::new();
        device.download(&mut buffer, None).unwrap();
        assert_eq!(buffer, data);
    }

    #[test]
    fn test_download_exactly_one_full_chunk() {
        let data = pattern(CHUNK_DATA - LENGTH_PREFIX);
        let mut stream = MockStream::new();
        stream.queue(&bulk_answer(&data));
        let mut device = GoaDevice::new(&mut stream);
        let mut buffer = Vec::new();
        device.download(&mut buffer, None).unwrap();
        assert_eq!(buffer, data);
        assert_eq!(stream.tx, vec![ACK, ACK]);
    }

    #[test]
    fn test_download_multiple_chunks_with_progress() {
        let data = pattern(1100);
        let mut stream = MockStream::new();
        stream.queue(&bulk_answer(&data));
        stream.max_read = Some(200);

        let mut device = GoaDevice::new(&mut stream);
        let log = EventLog::attach(&mut device);
        let mut progress = Progress { current: 1000, maximum: 4000 };
        let mut buffer = Vec::new();
        device.download(&mut buffer, Some(&mut progress)).unwrap();

        assert_eq!(buffer, data);
        assert_eq!(progress.current, 2000);
        let currents: Vec<u32> = log.progress().iter().map(|p| p.current).collect();
        assert_eq!(currents, vec![1465, 1929, 2000]);
        assert!(log.progress().iter().all(|p| p.maximum == 4000));
        assert_eq!(stream.tx, vec![ACK, ACK, ACK, ACK]);
    }

    #[test]
    fn test_download_bad_checksum_is_not_acked() {
        let mut answer = bulk_answer(&pattern(600));
        answer[CHUNK_LEN + 10] ^= 0x01;
        let mut stream = MockStream::new();
        stream.queue(&answer);

        let mut device = GoaDevice::new(&mut stream);
        let mut buffer = Vec::new();
        let result = device.download(&mut buffer, None);
        assert!(matches!(result, Err(GoaError::CrcMismatch { .. })));
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Protocol);
        // only the first chunk was acknowledged
        assert_eq!(stream.tx, vec![ACK]);
    }

    #[test]
    fn test_download_bad_end_byte() {
        let mut answer = bulk_answer(&pattern(10));
        let last = answer.len() - 1;
        answer[last] = 0x05;
        let mut stream = MockStream::new();
        stream.queue(&answer);

        let mut device = GoaDevice::new(&mut stream);
        let mut buffer = Vec::new();
        let result = device.download(&mut buffer, None);
        assert!(matches!(result, Err(GoaError::UnexpectedEndByte { found: 0x05 })));
        assert_eq!(stream.tx, vec![ACK]);
    }

    #[test]
    fn test_download_missing_chunk_times_out() {
        let answer = bulk_answer(&pattern(700));
        let mut stream = MockStream::new();
        stream.queue(&answer[..CHUNK_LEN + 20]);

        let mut device = GoaDevice::new(&mut stream);
        let mut buffer = Vec::new();
        let result = device.download(&mut buffer, None);
        assert!(matches!(result, Err(GoaError::Timeout { expected: CHUNK_LEN, transferred: 20 })));
    }

    #[test]
    fn test_transfer_returns_answer_and_data() {
        let data = pattern(46);
        let mut stream = MockStream::new();
        stream.queue(&device_packet(CMD_LOGBOOK, &[]));
        stream.queue(&bulk_answer(&data));

        let mut device = GoaDevice::new(&mut stream);
        let mut buffer = Vec::new();
        let answer = device
            .transfer(&Command::Logbook { code: CMD_LOGBOOK }, &mut buffer, None)
            .unwrap();
        assert!(answer.is_empty());
        assert_eq!(buffer, data);
        assert_eq!(&stream.tx[..8], &[0xAA, 0xAA, 0xAA, 0x00, 0x21, 0x43, 0x34, 0x55]);
        assert_eq!(&stream.tx[8..], &[ACK, ACK]);
    }

    #[test]
    fn test_transfer_stops_on_bad_answer() {
        let mut stream = MockStream::new();
        stream.queue(&[0xAA, 0xAA, 0xAA, 0x0D]);
        stream.queue(&bulk_answer(&[1, 2, 3]));

        let mut device = GoaDevice::new(&mut stream);
        let mut buffer = Vec::new();
        let result = device.transfer(&Command::Dive { number: [1, 0] }, &mut buffer, None);
        assert!(matches!(result, Err(GoaError::UnexpectedLength { length: 13 })));
        assert!(buffer.is_empty());
        assert_eq!(stream.tx.len(), 10);
        assert_eq!(stream.tx[4], CMD_DIVE);
    }
}
