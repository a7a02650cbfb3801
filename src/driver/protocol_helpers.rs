// src/driver/protocol_helpers.rs

use super::GoaDevice;
use crate::common::{
    command::Command,
    error::GoaError,
    hal_traits::IoStream,
    identity::{self, ApiConfig, Identity},
    logbook,
    types::{DeviceEvent, Progress},
};
use alloc::vec::Vec;
use tracing::{debug, error};

impl<IO> GoaDevice<IO>
where
    IO: IoStream,
{
    /// Queries the identification block and resolves the API configuration.
    /// With `emit_events`, the raw block and the decoded device info are
    /// reported, in that order.
    pub(super) fn read_id(&mut self, emit_events: bool) -> Result<Identity, GoaError<IO::Error>> {
        let id = self
            .exchange(&Command::Version)
            .inspect_err(|e| error!(error = ?e, "Failed to read the version information"))?;

        let identity = identity::identify::<IO::Error>(&id).inspect_err(|e| match e {
            GoaError::UnrecognizedIdentification { length } => {
                error!(length, "Unexpected version length")
            }
            _ => error!(error = %e, "Unsupported device"),
        })?;

        debug!(
            model = identity.info.model,
            firmware = identity.info.firmware,
            serial = identity.info.serial,
            version = %identity.config.version,
            "device identified"
        );

        if emit_events {
            self.emit(DeviceEvent::Vendor(id.as_slice()));
            self.emit(DeviceEvent::DevInfo(identity.info));
        }

        Ok(identity)
    }

    /// Downloads the logbook table into `buffer`.
    pub(super) fn read_logbook(
        &mut self,
        config: &ApiConfig,
        buffer: &mut Vec<u8>,
        progress: &mut Progress,
    ) -> Result<(), GoaError<IO::Error>> {
        self.transfer(
            &Command::Logbook { code: config.logbook_command },
            buffer,
            Some(progress),
        )
        .inspect_err(|e| error!(error = ?e, "Failed to read the logbook data"))?;
        Ok(())
    }

    /// Downloads the dive belonging to `entry`, checks it against the entry
    /// and returns the assembled dive record.
    pub(super) fn read_dive(
        &mut self,
        config: &ApiConfig,
        entry: &[u8],
        buffer: &mut Vec<u8>,
        progress: &mut Progress,
    ) -> Result<Vec<u8>, GoaError<IO::Error>> {
        let number = [entry[0], entry[1]];
        self.transfer(&Command::Dive { number }, buffer, Some(progress))
            .inspect_err(|e| error!(error = ?e, "Failed to read the dive data"))?;

        logbook::validate_dive::<IO::Error>(config, entry, buffer)
            .inspect_err(|e| error!(error = %e, "Unexpected dive header"))?;

        logbook::assemble_record(config, entry, buffer)
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::super::mock::{
        bulk_answer, device_packet, legacy_entry, legacy_id, EventLog, MockStream,
    };
    use super::*;
    use crate::common::{
        command::{CMD_DIVE, CMD_VERSION},
        error::ErrorKind,
        identity::ApiVersion,
    };

    #[test]
    fn test_read_id_without_events() {
        let mut stream = MockStream::new();
        stream.queue(&device_packet(CMD_VERSION, &legacy_id(2, 170)));
        let mut device = GoaDevice::new(&mut stream);
        let log = EventLog::attach(&mut device);

        let identity = device.read_id(false).unwrap();
        assert_eq!(identity.config.version, ApiVersion::V2);
        assert_eq!(identity.info.model, 2);
        assert!(log.vendor().is_empty());
        assert!(log.devinfo().is_empty());
    }

    #[test]
    fn test_read_id_rejects_odd_length() {
        let mut stream = MockStream::new();
        stream.queue(&device_packet(CMD_VERSION, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]));
        let mut device = GoaDevice::new(&mut stream);
        let log = EventLog::attach(&mut device);

        let result = device.read_id(true);
        assert!(matches!(result, Err(GoaError::UnrecognizedIdentification { length: 10 })));
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Unsupported);
        assert!(log.vendor().is_empty());
    }

    #[test]
    fn test_read_id_unknown_firmware() {
        let mut stream = MockStream::new();
        stream.queue(&device_packet(CMD_VERSION, &legacy_id(1, 300)));
        let mut device = GoaDevice::new(&mut stream);
        let result = device.read_id(true);
        assert!(matches!(result, Err(GoaError::UnknownFirmware(300))));
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn test_read_dive_builds_record() {
        let entry = legacy_entry(4);
        let mut dive = Vec::new();
        dive.extend_from_slice(&entry[..2]);
        dive.extend_from_slice(&entry[7..]);
        dive.extend_from_slice(&[0x11, 0x22]);

        let mut stream = MockStream::new();
        stream.queue(&device_packet(CMD_DIVE, &[]));
        stream.queue(&bulk_answer(&dive));
        let mut device = GoaDevice::new(&mut stream);

        let identity = identity::identify::<()>(&legacy_id(1, 163)).unwrap();
        let mut buffer = Vec::new();
        let mut progress = Progress { current: 1000, maximum: 2000 };
        let record = device
            .read_dive(&identity.config, &entry, &mut buffer, &mut progress)
            .unwrap();

        assert_eq!(&record[..4], &[0xDC, 0xDC, 0, 23]);
        assert_eq!(&record[4..27], entry.as_slice());
        assert_eq!(&record[27..], dive.as_slice());
        assert_eq!(progress.current, 2000);
        assert_eq!(&stream.tx[..5], &[0xAA, 0xAA, 0xAA, 0x02, CMD_DIVE]);
        assert_eq!(&stream.tx[5..7], &[0x04, 0x00]);
        assert_eq!(&stream.tx[10..], &[0x06, 0x06]);
    }

    #[test]
    fn test_read_dive_header_mismatch() {
        let entry = legacy_entry(4);
        let mut dive = Vec::new();
        dive.extend_from_slice(&entry[..2]);
        dive.extend_from_slice(&entry[7..]);
        dive[5] ^= 0xFF;

        let mut stream = MockStream::new();
        stream.queue(&device_packet(CMD_DIVE, &[]));
        stream.queue(&bulk_answer(&dive));
        let mut device = GoaDevice::new(&mut stream);

        let identity = identity::identify::<()>(&legacy_id(1, 163)).unwrap();
        let mut buffer = Vec::new();
        let mut progress = Progress::default();
        let result = device.read_dive(&identity.config, &entry, &mut buffer, &mut progress);
        assert!(matches!(result, Err(GoaError::HeaderMismatch { number: 4 })));
        assert_eq!(result.unwrap_err().kind(), ErrorKind::DataFormat);
    }
}
