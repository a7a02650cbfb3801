// src/common/timing.rs

use core::time::Duration;

/// Pause before every outgoing packet. The device drops most commands that
/// arrive back-to-back with the previous exchange.
pub const SEND_DELAY: Duration = Duration::from_millis(100);

/// Read timeout configured when the link is opened.
pub const READ_TIMEOUT: Duration = Duration::from_millis(3000);

/// Settle time after clearing RTS/DTR, before the input is purged.
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Progress units allotted to one bulk transfer (the logbook or one dive).
pub const PROGRESS_STEPS: u32 = 1000;

/// Progress after `nbytes` of `size` bytes, scaled to [`PROGRESS_STEPS`]
/// and rounded to the nearest unit.
pub fn progress_step(nbytes: usize, size: usize) -> u32 {
    if size == 0 {
        return PROGRESS_STEPS;
    }
    let steps = PROGRESS_STEPS as u64;
    let (nbytes, size) = (nbytes as u64, size as u64);
    ((steps * nbytes + size / 2) / size) as u32
}
