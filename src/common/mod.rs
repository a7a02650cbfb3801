// src/common/mod.rs

// --- Declare all public modules within common ---
pub mod command;
pub mod crc;
pub mod error;
pub mod frame;
pub mod hal_traits;
pub mod identity;
pub mod logbook;
pub mod timing;
pub mod types;

// --- Re-export key types/traits/functions for easier access ---

// From command.rs
pub use command::Command;

// From crc.rs
pub use crc::{calculate_crc16, decode_crc, encode_crc, verify_crc};

// From error.rs
pub use error::{ErrorKind, GoaError};

// From frame.rs
pub use frame::{decode_packet, encode_packet, Answer, Packet};

// From hal_traits.rs
pub use hal_traits::{Direction, FlowControl, IoStream, Parity, SerialSettings, StopBits};

// From identity.rs
pub use identity::{ApiConfig, ApiVersion, Identity};

// From logbook.rs
pub use logbook::DiveRecord;

// From types.rs
pub use types::{DateTime, DeviceEvent, DeviceInfo, DiveControl, Fingerprint, Progress, FINGERPRINT_SIZE};
