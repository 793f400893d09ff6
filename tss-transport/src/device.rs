// SPDX-FileCopyrightText: © 2025 Phala Network <dstack@phala.network>
//
// SPDX-License-Identifier: Apache-2.0

//! TPM driver contract and the Linux character device driver
//!
//! The transport never opens or closes anything itself: a [`DeviceResolver`]
//! hands it a device handle and a driver on first use, and the driver's
//! transmit entry point does the actual I/O.

use anyhow::{bail, Result};
use fs_err::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, warn};

use super::config::TransportConfig;
use super::error::DriverError;

/// Driver transmit capability
pub trait TpmDriver {
    type Device;

    /// Send `buf[..len]` to the TPM and overwrite `buf` with the response.
    ///
    /// Returns the number of response bytes written into `buf`. Blocks until
    /// the TPM answers; any timeout is the driver's business.
    fn transmit(
        &mut self,
        device: &mut Self::Device,
        buf: &mut [u8],
        len: usize,
    ) -> Result<usize, DriverError>;
}

/// Lookup of the platform's TPM device and driver
pub trait DeviceResolver {
    type Driver: TpmDriver;

    fn resolve_device(&mut self) -> Option<<Self::Driver as TpmDriver>::Device>;

    fn resolve_driver(&mut self) -> Option<Self::Driver>;
}

/// TPM character device handle
#[derive(Debug)]
pub struct TpmDevice {
    file: File,
    path: String,
}

impl TpmDevice {
    /// Open a TPM device
    pub fn open(path: &str) -> Result<Self> {
        // Strip "device:" prefix if present
        let device_path = path.strip_prefix("device:").unwrap_or(path);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(device_path)?;

        Ok(Self {
            file,
            path: device_path.to_string(),
        })
    }

    /// Detect and open the default TPM device
    pub fn detect() -> Result<Self> {
        if Path::new("/dev/tpmrm0").exists() {
            Self::open("/dev/tpmrm0")
        } else if Path::new("/dev/tpm0").exists() {
            Self::open("/dev/tpm0")
        } else {
            bail!("TPM device not found")
        }
    }

    /// Get the device path
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Driver for `/dev/tpm*`: one write of the command, one read of the response
#[derive(Debug, Default, Clone, Copy)]
pub struct CharDeviceDriver;

impl TpmDriver for CharDeviceDriver {
    type Device = TpmDevice;

    fn transmit(
        &mut self,
        device: &mut TpmDevice,
        buf: &mut [u8],
        len: usize,
    ) -> Result<usize, DriverError> {
        device.file.write_all(&buf[..len])?;
        let n = device.file.read(buf)?;
        debug!("{}: sent {} bytes, received {} bytes", device.path, len, n);
        Ok(n)
    }
}

/// Resolves the configured (or auto-detected) character device
#[derive(Debug, Clone, Default)]
pub struct CharDeviceResolver {
    device: Option<String>,
}

impl CharDeviceResolver {
    pub fn new(config: &TransportConfig) -> Self {
        Self {
            device: config.device.clone(),
        }
    }
}

impl DeviceResolver for CharDeviceResolver {
    type Driver = CharDeviceDriver;

    fn resolve_device(&mut self) -> Option<TpmDevice> {
        let opened = match &self.device {
            Some(path) => TpmDevice::open(path),
            None => TpmDevice::detect(),
        };
        match opened {
            Ok(device) => Some(device),
            Err(e) => {
                warn!("failed to open TPM device: {e:#}");
                None
            }
        }
    }

    fn resolve_driver(&mut self) -> Option<CharDeviceDriver> {
        Some(CharDeviceDriver)
    }
}
