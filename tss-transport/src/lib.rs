// SPDX-FileCopyrightText: © 2025 Phala Network <dstack@phala.network>
//
// SPDX-License-Identifier: Apache-2.0

//! TPM 2.0 device transmit adapter
//!
//! The TSS device-interface layer: it hands an already marshalled command to
//! a TPM driver, validates the response header, and reports either a
//! transport condition or the TPM's own response code.
//!
//! ## Features
//!
//! - **Pluggable drivers**: any [`TpmDriver`] behind a [`DeviceResolver`]
//! - **Direct device communication**: talks to `/dev/tpmrm0` or `/dev/tpm0`
//! - **Disjoint status space**: transport conditions use the TSS error layer,
//!   so they never collide with TPM response codes
//!
//! ## Example
//!
//! ```no_run
//! use tss_transport::{ResponseBuf, TransportConfig, TssContext, MAX_RESPONSE_SIZE};
//!
//! let config = TransportConfig::from_env()?;
//! let mut ctx = TssContext::from_config(&config);
//! let startup: [u8; 12] = [0x80, 0x01, 0x00, 0x00, 0x00, 0x0c, 0x00, 0x00, 0x01, 0x44, 0x00, 0x00];
//! let mut response: ResponseBuf = [0u8; MAX_RESPONSE_SIZE];
//! let transmitted = ctx.transmit(&mut response, &startup, "TPM2_Startup")?;
//! println!("rc = {:#010x}", transmitted.rc());
//! ctx.close()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

mod config;
mod constants;
mod device;
mod error;
mod marshal;
mod trace;
mod transport;

pub use config::{TransportConfig, TPM_DEVICE_ENV, TPM_TRACE_LEVEL_ENV};
pub use constants::*;
pub use error::{DriverError, TransportError};
pub use transport::{rc_of, ResponseBuf, Transmitted, Transport, TssContext};

// Re-export device and marshalling for driver implementors
pub use device::{CharDeviceDriver, CharDeviceResolver, DeviceResolver, TpmDevice, TpmDriver};
pub use marshal::{ResponseBuffer, ResponseHeader};
pub use trace::hex_dump;
