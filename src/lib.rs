// src/lib.rs

#![no_std] // Specify no_std at the crate root

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod common;
pub mod driver;
#[cfg(feature = "serial")]
pub mod serial;

// Re-export key types for convenience
pub use common::{DateTime, DeviceEvent, DiveControl, DiveRecord, ErrorKind, GoaError, IoStream};
pub use driver::GoaDevice;
#[cfg(feature = "serial")]
pub use serial::SerialStream;
