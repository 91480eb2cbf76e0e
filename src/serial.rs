//! Serial port plumbing: the `Transport` impl, opening and enumeration,
//! and the per-process claim that keeps one camera per port.

use crate::base::{Error, Result, Transport};
use crate::types::SessionConfig;
use log::{debug, trace};
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::collections::HashSet;
use std::io;
use std::sync::{Mutex, MutexGuard, OnceLock};

impl Transport for dyn SerialPort {
    fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(self.bytes_to_read()? as usize)
    }

    fn discard_input(&mut self) -> io::Result<()> {
        Ok(self.clear(ClearBuffer::Input)?)
    }
}

/// Opens `name` as 8N1 at the configured baud rate.
pub fn open_port(name: &str, config: &SessionConfig) -> Result<Box<dyn SerialPort>> {
    trace!("Opening serial port {} at {} baud", name, config.baud_rate);
    serialport::new(name, config.baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(config.port_timeout)
        .open()
        .map_err(|err| Error::PortOpenFailed {
            port: name.to_owned(),
            description: err.to_string(),
        })
}

/// Names of the serial ports present on this host.
pub fn available_port_names() -> Result<Vec<String>> {
    let ports = serialport::available_ports()?;
    debug!("Found {} serial ports", ports.len());
    Ok(ports.into_iter().map(|port| port.port_name).collect())
}

fn claimed_ports() -> MutexGuard<'static, HashSet<String>> {
    static CLAIMED: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();
    CLAIMED
        .get_or_init(|| Mutex::new(HashSet::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Exclusive hold on a port name within this process, released on drop.
#[derive(Debug)]
pub struct PortClaim {
    port: String,
}

impl PortClaim {
    /// Claims `port`, failing with `Error::PortBusy` if it is already held.
    pub fn acquire(port: &str) -> Result<PortClaim> {
        if !claimed_ports().insert(port.to_owned()) {
            return Err(Error::PortBusy {
                port: port.to_owned(),
            });
        }
        trace!("Claimed port {}", port);
        Ok(PortClaim {
            port: port.to_owned(),
        })
    }

    /// Name of the claimed port.
    #[inline]
    pub fn port(&self) -> &str {
        &self.port
    }
}

impl Drop for PortClaim {
    fn drop(&mut self) {
        trace!("Releasing port {}", self.port);
        claimed_ports().remove(&self.port);
    }
}
