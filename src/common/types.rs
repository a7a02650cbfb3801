// src/common/types.rs

use super::timing::PROGRESS_STEPS;

/// Size of the fingerprint that identifies a dive.
pub const FINGERPRINT_SIZE: usize = 6;

/// Fingerprint of the most recently downloaded dive. All zeros means none.
pub type Fingerprint = [u8; FINGERPRINT_SIZE];

/// Calendar time as the device clock stores it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DateTime {
    /// Encodes the time as the set-time payload: year (LE) followed by one
    /// byte each for month, day, hour, minute and second.
    pub fn encode(&self) -> [u8; 7] {
        let year = self.year.to_le_bytes();
        [year[0], year[1], self.month, self.day, self.hour, self.minute, self.second]
    }
}

/// Identity reported by the version query.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct DeviceInfo {
    pub model: u8,
    pub firmware: u16,
    pub serial: u32,
}

/// Progress snapshot. `maximum == 0` means the total is not known yet.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Progress {
    pub current: u32,
    pub maximum: u32,
}

impl Progress {
    /// Maximum for a download of `dives` dives plus the logbook.
    pub fn for_dives(current: u32, dives: u32) -> Self {
        Progress { current, maximum: (dives + 1) * PROGRESS_STEPS }
    }
}

/// Notifications the driver emits while it works.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent<'a> {
    Progress(Progress),
    /// Raw identification block, as received.
    Vendor(&'a [u8]),
    DevInfo(DeviceInfo),
}

/// Returned by a dive callback to continue or end the enumeration.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DiveControl {
    Continue,
    Stop,
}

impl From<bool> for DiveControl {
    fn from(keep_going: bool) -> Self {
        if keep_going {
            DiveControl::Continue
        } else {
            DiveControl::Stop
        }
    }
}
