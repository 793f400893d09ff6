// SPDX-FileCopyrightText: © 2025 Phala Network <dstack@phala.network>
//
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

use crate::constants::tss_rc;

/// Transport-layer failure of a TPM transmit.
///
/// A TPM that answers with a nonzero status is not an error at this layer;
/// that status comes back in [`crate::Transmitted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("TPM device or driver not available")]
    NoConnection,
    #[error("TPM connection failed")]
    BadConnection,
    #[error("malformed TPM response")]
    MalformedResponse,
}

impl TransportError {
    /// TSS response code for this condition
    pub fn rc(self) -> u32 {
        match self {
            TransportError::NoConnection => tss_rc::NO_CONNECTION,
            TransportError::BadConnection => tss_rc::BAD_CONNECTION,
            TransportError::MalformedResponse => tss_rc::MALFORMED_RESPONSE,
        }
    }
}

impl From<TransportError> for u32 {
    fn from(e: TransportError) -> Self {
        e.rc()
    }
}

/// Failure reported by a driver's transmit entry point
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("TPM device I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("TPM driver failure: {0}")]
    Other(String),
}
