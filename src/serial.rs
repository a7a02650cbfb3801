// src/serial.rs

//! [`IoStream`] over a host serial port.

use std::boxed::Box;
use std::io::{self, Read, Write};
use std::string::String;
use std::thread;
use std::time::Duration;
use std::vec::Vec;

use serialport::{ClearBuffer, SerialPort};

use crate::common::{
    hal_traits::{Direction, FlowControl, IoStream, Parity, SerialSettings, StopBits},
    timing,
};

/// Serial port wrapper implementing [`IoStream`].
pub struct SerialStream {
    port: Box<dyn SerialPort>,
}

impl SerialStream {
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }

    /// Opens `path` at the device's line speed. Pass the result to
    /// [`GoaDevice::open`](crate::GoaDevice::open) to finish the setup.
    pub fn open(path: &str) -> io::Result<Self> {
        let port = serialport::new(path, SerialSettings::GOA.baud_rate)
            .timeout(timing::READ_TIMEOUT)
            .open()?;
        Ok(Self::new(port))
    }

    pub fn into_inner(self) -> Box<dyn SerialPort> {
        self.port
    }
}

/// Names of the serial ports present on this host.
pub fn available_ports() -> io::Result<Vec<String>> {
    let ports = serialport::available_ports()?;
    Ok(ports.into_iter().map(|info| info.port_name).collect())
}

impl IoStream for SerialStream {
    type Error = io::Error;

    fn configure(&mut self, settings: SerialSettings) -> Result<(), Self::Error> {
        let data_bits = match settings.data_bits {
            5 => serialport::DataBits::Five,
            6 => serialport::DataBits::Six,
            7 => serialport::DataBits::Seven,
            8 => serialport::DataBits::Eight,
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    std::format!("unsupported data bits: {other}"),
                ))
            }
        };
        let parity = match settings.parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        };
        let stop_bits = match settings.stop_bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        };
        let flow_control = match settings.flow_control {
            FlowControl::None => serialport::FlowControl::None,
            FlowControl::Software => serialport::FlowControl::Software,
            FlowControl::Hardware => serialport::FlowControl::Hardware,
        };

        self.port.set_baud_rate(settings.baud_rate)?;
        self.port.set_data_bits(data_bits)?;
        self.port.set_parity(parity)?;
        self.port.set_stop_bits(stop_bits)?;
        self.port.set_flow_control(flow_control)?;
        Ok(())
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), Self::Error> {
        Ok(self.port.set_timeout(timeout)?)
    }

    fn set_rts(&mut self, level: bool) -> Result<(), Self::Error> {
        Ok(self.port.write_request_to_send(level)?)
    }

    fn set_dtr(&mut self, level: bool) -> Result<(), Self::Error> {
        Ok(self.port.write_data_terminal_ready(level)?)
    }

    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }

    fn purge(&mut self, direction: Direction) -> Result<(), Self::Error> {
        let buffer = match direction {
            Direction::Input => ClearBuffer::Input,
            Direction::Output => ClearBuffer::Output,
            Direction::All => ClearBuffer::All,
        };
        Ok(self.port.clear(buffer)?)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        match self.port.read(buf) {
            Ok(count) => Ok(count),
            // reported to the driver as a short read
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        match self.port.write(buf) {
            Ok(count) => Ok(count),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e),
        }
    }
}
