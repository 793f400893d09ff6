// SPDX-FileCopyrightText: © 2025 Phala Network <dstack@phala.network>
//
// SPDX-License-Identifier: Apache-2.0

//! TSS device transmit adapter
//!
//! Relays a marshalled command through a [`TpmDriver`] and validates the
//! response header. The caller's response buffer doubles as the driver's
//! scratch buffer: the command is copied into it, and the driver overwrites
//! it in place with the response.

use tracing::{debug, info, warn};

use super::config::TransportConfig;
use super::constants::*;
use super::device::{CharDeviceResolver, DeviceResolver, TpmDriver};
use super::error::TransportError;
use super::marshal::ResponseHeader;
use super::trace;

/// Caller-owned response (and scratch) buffer
pub type ResponseBuf = [u8; MAX_RESPONSE_SIZE];

type DeviceOf<R> = <<R as DeviceResolver>::Driver as TpmDriver>::Device;

/// Outcome of a transmit that produced a well-formed response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transmitted {
    /// Response bytes at the start of the response buffer
    pub read: usize,
    /// TPM status from the response header, passed through verbatim
    pub response_code: u32,
}

impl Transmitted {
    pub fn rc(&self) -> u32 {
        self.response_code
    }

    pub fn is_success(&self) -> bool {
        self.response_code == TPM_RC_SUCCESS
    }
}

/// Collapse a transmit result into a single status code.
///
/// Zero is success. TSS-layer codes ([`tss_rc`]) mark transport failures;
/// anything else is the TPM's own status.
pub fn rc_of(result: &Result<Transmitted, TransportError>) -> u32 {
    match result {
        Ok(transmitted) => transmitted.rc(),
        Err(e) => e.rc(),
    }
}

/// Uniform transmit/close contract shared by TSS interface types
pub trait Transport {
    fn transmit(
        &mut self,
        response: &mut ResponseBuf,
        command: &[u8],
        message: &str,
    ) -> Result<Transmitted, TransportError>;

    fn close(&mut self) -> Result<(), TransportError>;
}

/// Per-connection transmit state.
///
/// Device and driver are resolved lazily on the first transmit and cached.
/// Calls on one context must be serialized; `&mut self` enforces that.
pub struct TssContext<R: DeviceResolver> {
    resolver: R,
    device: Option<DeviceOf<R>>,
    driver: Option<R::Driver>,
    first_transmit: bool,
    verbose: bool,
}

impl TssContext<CharDeviceResolver> {
    /// Context for the configured (or auto-detected) `/dev/tpm*` device
    pub fn from_config(config: &TransportConfig) -> Self {
        Self::new(CharDeviceResolver::new(config)).with_verbose(config.verbose())
    }

    /// Path of the resolved device, once the first transmit has opened it
    pub fn device_path(&self) -> Option<&str> {
        self.device.as_ref().map(|device| device.path())
    }
}

impl<R: DeviceResolver> TssContext<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            device: None,
            driver: None,
            first_transmit: true,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn is_first_transmit(&self) -> bool {
        self.first_transmit
    }

    /// Whether both device and driver handles are cached
    pub fn is_connected(&self) -> bool {
        self.device.is_some() && self.driver.is_some()
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Send `command` and receive the response into `response`.
    ///
    /// `message` only labels the verbose trace. On error the contents of
    /// `response` are unspecified.
    pub fn transmit(
        &mut self,
        response: &mut ResponseBuf,
        command: &[u8],
        message: &str,
    ) -> Result<Transmitted, TransportError> {
        if self.verbose {
            info!("TSS transmit: {message}");
            trace::dump("command", command);
        }

        let result = self
            .exchange(response, command)
            .and_then(|received| self.check_response(&response[..received]));

        if self.verbose {
            info!("response code: {:#010x}", rc_of(&result));
        }
        result
    }

    /// Always succeeds. The device and driver stay with whoever resolved them.
    pub fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn connect(&mut self) -> Result<(&mut R::Driver, &mut DeviceOf<R>), TransportError> {
        if self.first_transmit {
            // Single attempt: a failed resolution is not retried.
            self.first_transmit = false;
            self.device = self.resolver.resolve_device();
            self.driver = self.resolver.resolve_driver();
            if !self.is_connected() {
                warn!("TPM device/driver not set");
                return Err(TransportError::NoConnection);
            }
        }
        match (self.driver.as_mut(), self.device.as_mut()) {
            (Some(driver), Some(device)) => Ok((driver, device)),
            _ => Err(TransportError::BadConnection),
        }
    }

    /// Resolve, copy the command into the scratch buffer and run the driver.
    /// Returns the number of bytes received.
    fn exchange(
        &mut self,
        response: &mut ResponseBuf,
        command: &[u8],
    ) -> Result<usize, TransportError> {
        let verbose = self.verbose;
        let (driver, device) = self.connect()?;

        let written = command.len();
        if written > MAX_RESPONSE_SIZE {
            if verbose {
                info!("command of {written} bytes exceeds {MAX_RESPONSE_SIZE} byte buffer");
            }
            return Err(TransportError::BadConnection);
        }

        response[..written].copy_from_slice(command);
        let received = match driver.transmit(device, &mut response[..], written) {
            Ok(n) if n <= MAX_RESPONSE_SIZE => n,
            Ok(n) => {
                debug!("driver reported {n} bytes for a {MAX_RESPONSE_SIZE} byte buffer");
                return Err(TransportError::BadConnection);
            }
            Err(e) => {
                if verbose {
                    info!("receive error: {e}");
                }
                return Err(TransportError::BadConnection);
            }
        };
        Ok(received)
    }

    fn check_response(&self, received: &[u8]) -> Result<Transmitted, TransportError> {
        let read = received.len();
        let declared = match ResponseHeader::declared_size(received) {
            Ok(size) => size,
            Err(_) => {
                if self.verbose {
                    info!("received {read} bytes, no room for a size field");
                }
                return Err(TransportError::MalformedResponse);
            }
        };
        if declared as usize != read {
            if self.verbose {
                info!("bytes read ({read}) and buffer responseSize field ({declared}) don't match");
            }
            return Err(TransportError::MalformedResponse);
        }

        if self.verbose {
            trace::dump("response", received);
        }
        if read < HEADER_SIZE {
            if self.verbose {
                info!("received {read} bytes < header");
            }
            return Err(TransportError::MalformedResponse);
        }

        let header =
            ResponseHeader::decode(received).map_err(|_| TransportError::MalformedResponse)?;
        Ok(Transmitted {
            read,
            response_code: header.response_code,
        })
    }
}

impl<R: DeviceResolver> Transport for TssContext<R> {
    fn transmit(
        &mut self,
        response: &mut ResponseBuf,
        command: &[u8],
        message: &str,
    ) -> Result<Transmitted, TransportError> {
        TssContext::transmit(self, response, command, message)
    }

    fn close(&mut self) -> Result<(), TransportError> {
        TssContext::close(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriverError;

    struct EchoDriver;

    impl TpmDriver for EchoDriver {
        type Device = ();

        fn transmit(
            &mut self,
            _device: &mut (),
            _buf: &mut [u8],
            len: usize,
        ) -> Result<usize, DriverError> {
            Ok(len)
        }
    }

    struct Resolver {
        device: bool,
        driver: bool,
        calls: usize,
    }

    impl DeviceResolver for Resolver {
        type Driver = EchoDriver;

        fn resolve_device(&mut self) -> Option<()> {
            self.calls += 1;
            self.device.then_some(())
        }

        fn resolve_driver(&mut self) -> Option<EchoDriver> {
            self.driver.then_some(EchoDriver)
        }
    }

    fn context(device: bool, driver: bool) -> TssContext<Resolver> {
        TssContext::new(Resolver {
            device,
            driver,
            calls: 0,
        })
    }

    // An echoed command header is a valid response whose code is the command code
    const STARTUP: [u8; 12] = [
        0x80, 0x01, 0x00, 0x00, 0x00, 0x0c, 0x00, 0x00, 0x01, 0x44, 0x00, 0x00,
    ];

    #[test]
    fn test_resolves_once() {
        let mut ctx = context(true, true);
        let mut buf = [0u8; MAX_RESPONSE_SIZE];

        let first = ctx.transmit(&mut buf, &STARTUP, "startup").unwrap();
        let second = ctx.transmit(&mut buf, &STARTUP, "startup").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.response_code, 0x144);
        assert_eq!(ctx.resolver().calls, 1);
    }

    #[test]
    fn test_missing_driver_then_bad_connection() {
        let mut ctx = context(true, false);
        let mut buf = [0u8; MAX_RESPONSE_SIZE];

        assert_eq!(
            ctx.transmit(&mut buf, &STARTUP, "startup"),
            Err(TransportError::NoConnection)
        );
        assert!(!ctx.is_first_transmit());
        assert_eq!(
            ctx.transmit(&mut buf, &STARTUP, "startup"),
            Err(TransportError::BadConnection)
        );
        assert_eq!(ctx.resolver().calls, 1);
    }

    #[test]
    fn test_verbose_does_not_change_result() {
        let mut quiet = context(true, true);
        let mut loud = context(true, true).with_verbose(true);
        let mut buf = [0u8; MAX_RESPONSE_SIZE];

        let short = &STARTUP[..8];
        assert_eq!(
            quiet.transmit(&mut buf, short, "short"),
            loud.transmit(&mut buf, short, "short")
        );
        assert_eq!(
            quiet.transmit(&mut buf, &STARTUP, "startup"),
            loud.transmit(&mut buf, &STARTUP, "startup")
        );
    }

    #[test]
    fn test_rc_of() {
        assert_eq!(rc_of(&Err(TransportError::NoConnection)), tss_rc::NO_CONNECTION);
        let ok = Transmitted {
            read: 10,
            response_code: 0x98E,
        };
        assert_eq!(rc_of(&Ok(ok)), 0x98E);
        assert!(!ok.is_success());
    }
}
