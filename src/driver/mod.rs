// src/driver/mod.rs

//! Blocking driver for one dive computer connection.

mod io_helpers;
mod protocol_helpers;
mod transaction;

#[cfg(test)]
pub(crate) mod mock;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use tracing::{debug, error, warn};

use crate::common::{
    command::Command,
    error::GoaError,
    hal_traits::{Direction, IoStream, SerialSettings},
    identity::Identity,
    logbook::{self, RECORD_TAG_LEN},
    timing,
    types::{DateTime, DeviceEvent, DiveControl, Fingerprint, Progress, FINGERPRINT_SIZE},
};

/// Callback receiving the driver's notifications.
pub type EventHandler = Box<dyn FnMut(&DeviceEvent<'_>)>;

/// A dive computer bound to a byte stream.
///
/// Every operation is a blocking request/response exchange; nothing is
/// retried, and an error leaves the device in whatever state the aborted
/// exchange left it in.
pub struct GoaDevice<IO>
where
    IO: IoStream,
{
    stream: IO,
    fingerprint: Fingerprint,
    events: Option<EventHandler>,
}

impl<IO> GoaDevice<IO>
where
    IO: IoStream,
{
    /// Wraps a stream that is already configured for the device.
    pub fn new(stream: IO) -> Self {
        GoaDevice {
            stream,
            fingerprint: [0; FINGERPRINT_SIZE],
            events: None,
        }
    }

    /// Configures the stream (115200 8N1, 3 s timeout, RTS/DTR low), lets
    /// the line settle and discards stale input.
    pub fn open(mut stream: IO) -> Result<Self, GoaError<IO::Error>> {
        stream
            .configure(SerialSettings::GOA)
            .map_err(GoaError::Io)
            .inspect_err(|e| error!(error = ?e, "Failed to set the terminal attributes"))?;
        stream
            .set_timeout(timing::READ_TIMEOUT)
            .map_err(GoaError::Io)
            .inspect_err(|e| error!(error = ?e, "Failed to set the timeout"))?;
        stream
            .set_rts(false)
            .map_err(GoaError::Io)
            .inspect_err(|e| error!(error = ?e, "Failed to clear the RTS line"))?;
        stream
            .set_dtr(false)
            .map_err(GoaError::Io)
            .inspect_err(|e| error!(error = ?e, "Failed to clear the DTR line"))?;

        stream.sleep(timing::SETTLE_DELAY);
        if let Err(e) = stream.purge(Direction::All) {
            warn!(error = ?e, "Failed to purge the stream");
        }

        Ok(Self::new(stream))
    }

    /// Releases the stream.
    pub fn into_inner(self) -> IO {
        self.stream
    }

    /// Installs the callback that receives progress, vendor and device-info events.
    pub fn set_event_handler(&mut self, handler: impl FnMut(&DeviceEvent<'_>) + 'static) {
        self.events = Some(Box::new(handler));
    }

    /// Sets the fingerprint of the newest dive the caller already has.
    /// An empty slice resets it, so every dive is downloaded again.
    pub fn set_fingerprint(&mut self, data: &[u8]) -> Result<(), GoaError<IO::Error>> {
        match data.len() {
            0 => self.fingerprint = [0; FINGERPRINT_SIZE],
            FINGERPRINT_SIZE => self.fingerprint.copy_from_slice(data),
            size => return Err(GoaError::InvalidFingerprintSize { size }),
        }
        Ok(())
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Queries the device identity and emits the vendor and device-info events.
    pub fn identify(&mut self) -> Result<Identity, GoaError<IO::Error>> {
        self.read_id(true)
    }

    /// Downloads every dive newer than the stored fingerprint, newest first.
    ///
    /// `callback` receives the dive record and its fingerprint; returning
    /// [`DiveControl::Stop`] ends the enumeration without error. Dives already
    /// handed to the callback stay delivered if a later dive fails.
    pub fn foreach<F>(&mut self, mut callback: F) -> Result<(), GoaError<IO::Error>>
    where
        F: FnMut(&[u8], &[u8]) -> DiveControl,
    {
        let mut progress = Progress::default();
        self.emit(DeviceEvent::Progress(progress));

        let identity = self.read_id(false)?;
        let config = identity.config;

        let mut logbook_data = Vec::new();
        self.read_logbook(&config, &mut logbook_data, &mut progress)?;

        let count = logbook::count_pending(&logbook_data, &config, &self.fingerprint);
        debug!(count, size = logbook_data.len(), version = %config.version, "logbook scanned");

        progress = Progress::for_dives(progress.current, count as u32);
        self.emit(DeviceEvent::Progress(progress));

        let mut dive = Vec::new();
        for entry in logbook::entries_newest_first(&logbook_data, &config).take(count) {
            let record = self.read_dive(&config, entry, &mut dive, &mut progress)?;

            let fp_start = RECORD_TAG_LEN + config.logbook_fp_offset;
            let fingerprint = &record[fp_start..fp_start + FINGERPRINT_SIZE];
            if callback(&record, fingerprint) == DiveControl::Stop {
                debug!("enumeration stopped by callback");
                break;
            }
        }

        Ok(())
    }

    /// Sets the device clock.
    pub fn timesync(&mut self, datetime: &DateTime) -> Result<(), GoaError<IO::Error>> {
        self.exchange(&Command::SetTime(*datetime))
            .inspect_err(|e| error!(error = ?e, "Failed to set the new time"))?;
        Ok(())
    }

    /// Takes the device out of PC-link mode. The stream can still be
    /// released with [`into_inner`](Self::into_inner) if this fails.
    pub fn close(&mut self) -> Result<(), GoaError<IO::Error>> {
        self.exchange(&Command::ExitPcLink)
            .inspect_err(|e| error!(error = ?e, "Failed to exit PC Link"))?;
        Ok(())
    }

    pub(crate) fn emit(&mut self, event: DeviceEvent<'_>) {
        if let Some(handler) = self.events.as_mut() {
            handler(&event);
        }
    }
}

impl<IO> fmt::Debug for GoaDevice<IO>
where
    IO: IoStream + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoaDevice")
            .field("stream", &self.stream)
            .field("fingerprint", &self.fingerprint)
            .field("events", &self.events.is_some())
            .finish()
    }
}
