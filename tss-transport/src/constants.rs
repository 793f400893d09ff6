// SPDX-FileCopyrightText: © 2025 Phala Network <dstack@phala.network>
//
// SPDX-License-Identifier: Apache-2.0

//! TPM 2.0 wire constants and TSS transport limits

/// Largest command the TSS will marshal
pub const MAX_COMMAND_SIZE: usize = 4096;

/// Capacity of the caller-provided response buffer
pub const MAX_RESPONSE_SIZE: usize = 4096;

// The response buffer doubles as the transmit scratch buffer, so every
// command must fit in it.
const _: () = assert!(
    MAX_COMMAND_SIZE <= MAX_RESPONSE_SIZE,
    "MAX_COMMAND_SIZE must not exceed MAX_RESPONSE_SIZE"
);

/// Size of the `tag` field (TPM_ST)
pub const TAG_SIZE: usize = 2;

/// Size of the big-endian `size` field
pub const SIZE_FIELD_SIZE: usize = 4;

/// Size of the big-endian response code field
pub const CODE_FIELD_SIZE: usize = 4;

/// Offset of the `size` field in a command or response header
pub const SIZE_OFFSET: usize = TAG_SIZE;

/// Offset of the response code in a response header
pub const CODE_OFFSET: usize = TAG_SIZE + SIZE_FIELD_SIZE;

/// Header: tag (2) + size (4) + code (4)
pub const HEADER_SIZE: usize = TAG_SIZE + SIZE_FIELD_SIZE + CODE_FIELD_SIZE;

/// TPM 2.0 Structure Tags (TPM_ST)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum TpmSt {
    NoSessions = 0x8001,
    Sessions = 0x8002,
    RspCommand = 0x00C4,
}

impl TpmSt {
    pub fn to_u16(self) -> u16 {
        self as u16
    }

    pub fn from_u16(v: u16) -> Option<Self> {
        match v {
            0x8001 => Some(TpmSt::NoSessions),
            0x8002 => Some(TpmSt::Sessions),
            0x00C4 => Some(TpmSt::RspCommand),
            _ => None,
        }
    }
}

/// TPM_RC_SUCCESS
pub const TPM_RC_SUCCESS: u32 = 0x0000_0000;

/// TSS-layer response codes.
///
/// These live in the TSS error layer (`0x000B_0000`), which never collides
/// with a status returned by the TPM itself.
pub mod tss_rc {
    pub const LAYER: u32 = 0x000B_0000;
    pub const MALFORMED_RESPONSE: u32 = LAYER | 0x0003;
    pub const NO_CONNECTION: u32 = LAYER | 0x0008;
    pub const BAD_CONNECTION: u32 = LAYER | 0x0009;

    /// Whether `rc` was raised by the TSS rather than returned by the TPM
    pub fn is_tss_layer(rc: u32) -> bool {
        rc & 0x00FF_0000 == LAYER
    }
}
