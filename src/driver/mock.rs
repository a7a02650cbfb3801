// src/driver/mock.rs

//! In-memory stream and device answers for the driver tests.

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::time::Duration;

use crate::common::{
    crc::{calculate_crc16, encode_crc},
    frame::{encode_packet, CHUNK_DATA, END, HEADER},
    hal_traits::{Direction, IoStream, SerialSettings},
    types::{DeviceEvent, DeviceInfo, Progress},
};

use super::GoaDevice;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockIoError;

/// Stream fed from `rx`; everything written lands in `tx`. Reading past the
/// end of `rx` behaves like a timeout.
#[derive(Debug, Default)]
pub struct MockStream {
    pub rx: VecDeque<u8>,
    pub tx: Vec<u8>,
    pub settings: Option<SerialSettings>,
    pub timeout: Option<Duration>,
    pub rts: Option<bool>,
    pub dtr: Option<bool>,
    pub sleeps: Vec<Duration>,
    pub purged: Vec<Direction>,
    /// Largest read the stream hands out at once.
    pub max_read: Option<usize>,
    pub fail_configure: bool,
    pub fail_rts: bool,
    pub fail_purge: bool,
    pub fail_write: bool,
}

impl MockStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }
}

impl IoStream for MockStream {
    type Error = MockIoError;

    fn configure(&mut self, settings: SerialSettings) -> Result<(), Self::Error> {
        if self.fail_configure {
            return Err(MockIoError);
        }
        self.settings = Some(settings);
        Ok(())
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), Self::Error> {
        self.timeout = Some(timeout);
        Ok(())
    }

    fn set_rts(&mut self, level: bool) -> Result<(), Self::Error> {
        if self.fail_rts {
            return Err(MockIoError);
        }
        self.rts = Some(level);
        Ok(())
    }

    fn set_dtr(&mut self, level: bool) -> Result<(), Self::Error> {
        self.dtr = Some(level);
        Ok(())
    }

    fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
    }

    fn purge(&mut self, direction: Direction) -> Result<(), Self::Error> {
        if self.fail_purge {
            return Err(MockIoError);
        }
        self.purged.push(direction);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let limit = self.max_read.unwrap_or(usize::MAX);
        let mut count = 0;
        while count < buf.len() && count < limit {
            match self.rx.pop_front() {
                Some(byte) => {
                    buf[count] = byte;
                    count += 1;
                }
                None => break,
            }
        }
        Ok(count)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.fail_write {
            return Err(MockIoError);
        }
        self.tx.extend_from_slice(buf);
        Ok(buf.len())
    }
}

/// A framed answer as the device sends it.
pub fn device_packet(cmd: u8, payload: &[u8]) -> Vec<u8> {
    encode_packet::<MockIoError>(cmd, payload).unwrap().to_vec()
}

/// Bulk transfer carrying `data`: the 2-byte length prefix, 517-byte chunks
/// and the end byte.
pub fn bulk_answer(data: &[u8]) -> Vec<u8> {
    let mut stream = Vec::new();
    stream.extend_from_slice(&(data.len() as u16).to_le_bytes());
    stream.extend_from_slice(data);

    let mut out = Vec::new();
    for piece in stream.chunks(CHUNK_DATA) {
        let mut body = [0u8; CHUNK_DATA];
        body[..piece.len()].copy_from_slice(piece);
        out.extend_from_slice(&[HEADER; 3]);
        out.extend_from_slice(&body);
        out.extend_from_slice(&encode_crc(calculate_crc16(&body)));
    }
    out.push(END);
    out
}

fn id_block(len: usize, model: u8, firmware: u16) -> Vec<u8> {
    let mut id = Vec::new();
    id.extend_from_slice(&123_456u32.to_le_bytes());
    id.push(model);
    id.extend_from_slice(&firmware.to_le_bytes());
    id.resize(len, 0);
    id
}

/// 9-byte identification block (API v0..v3).
pub fn legacy_id(model: u8, firmware: u16) -> Vec<u8> {
    id_block(9, model, firmware)
}

/// 11-byte identification block (API v4).
pub fn v4_id(model: u8, firmware: u16) -> Vec<u8> {
    id_block(11, model, firmware)
}

/// A 23-byte logbook entry with a distinct fingerprint per dive number.
pub fn legacy_entry(number: u16) -> Vec<u8> {
    let mut entry: Vec<u8> = (0..23u8).map(|i| i.wrapping_add(number as u8 * 16)).collect();
    entry[..2].copy_from_slice(&number.to_le_bytes());
    entry
}

/// Records the events a device emits.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    progress: Rc<RefCell<Vec<Progress>>>,
    vendor: Rc<RefCell<Vec<Vec<u8>>>>,
    devinfo: Rc<RefCell<Vec<DeviceInfo>>>,
}

impl EventLog {
    pub fn attach<IO: IoStream>(device: &mut GoaDevice<IO>) -> Self {
        let log = EventLog::default();
        let sink = log.clone();
        device.set_event_handler(move |event| match event {
            DeviceEvent::Progress(p) => sink.progress.borrow_mut().push(*p),
            DeviceEvent::Vendor(data) => sink.vendor.borrow_mut().push(data.to_vec()),
            DeviceEvent::DevInfo(info) => sink.devinfo.borrow_mut().push(*info),
        });
        log
    }

    pub fn progress(&self) -> Vec<Progress> {
        self.progress.borrow().clone()
    }

    pub fn vendor(&self) -> Vec<Vec<u8>> {
        self.vendor.borrow().clone()
    }

    pub fn devinfo(&self) -> Vec<DeviceInfo> {
        self.devinfo.borrow().clone()
    }
}
