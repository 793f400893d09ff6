// SPDX-FileCopyrightText: © 2025 Phala Network <dstack@phala.network>
//
// SPDX-License-Identifier: Apache-2.0

//! Fixed-layout TPM response header decoding
//!
//! Every field read is bounds-checked against the bytes actually received.

use anyhow::{bail, Result};

use super::constants::*;

/// Cursor over received TPM bytes
#[derive(Debug)]
pub struct ResponseBuffer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ResponseBuffer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn get_u16(&mut self) -> Result<u16> {
        let bytes = self.take::<2>("u16")?;
        Ok(u16::from_be_bytes(bytes))
    }

    pub fn get_u32(&mut self) -> Result<u32> {
        let bytes = self.take::<4>("u32")?;
        Ok(u32::from_be_bytes(bytes))
    }

    /// Skip bytes
    pub fn skip(&mut self, len: usize) -> Result<()> {
        if len > self.remaining() {
            bail!("buffer underflow skipping {} bytes", len);
        }
        self.pos += len;
        Ok(())
    }

    fn take<const N: usize>(&mut self, what: &str) -> Result<[u8; N]> {
        if N > self.remaining() {
            bail!(
                "buffer underflow reading {} (remaining: {})",
                what,
                self.remaining()
            );
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.pos..self.pos + N]);
        self.pos += N;
        Ok(out)
    }
}

/// TPM response header: tag (2) + size (4) + response code (4)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    /// Raw TPM_ST tag, not validated
    pub tag: u16,
    pub size: u32,
    pub response_code: u32,
}

impl ResponseHeader {
    /// Decode the header from the start of `response`
    pub fn decode(response: &[u8]) -> Result<Self> {
        if response.len() < HEADER_SIZE {
            bail!("TPM response too short: {} bytes", response.len());
        }
        let mut buf = ResponseBuffer::new(response);
        let tag = buf.get_u16()?;
        let size = buf.get_u32()?;
        let response_code = buf.get_u32()?;
        Ok(Self {
            tag,
            size,
            response_code,
        })
    }

    /// Read only the `size` field, which needs just tag + size bytes
    pub fn declared_size(response: &[u8]) -> Result<u32> {
        let mut buf = ResponseBuffer::new(response);
        buf.skip(TAG_SIZE)?;
        buf.get_u32()
    }

    pub fn tag(&self) -> Option<TpmSt> {
        TpmSt::from_u16(self.tag)
    }

    pub fn is_success(&self) -> bool {
        self.response_code == TPM_RC_SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_decode() {
        let response = [
            0x80, 0x01, // TPM_ST_NO_SESSIONS
            0x00, 0x00, 0x00, 0x0A, // Size = 10
            0x00, 0x00, 0x01, 0x01, // TPM_RC_FAILURE
        ];

        let header = ResponseHeader::decode(&response).unwrap();
        assert_eq!(header.tag(), Some(TpmSt::NoSessions));
        assert_eq!(header.size, 10);
        assert_eq!(header.response_code, 0x101);
        assert!(!header.is_success());
    }

    #[test]
    fn test_header_too_short() {
        let response = [0x80, 0x01, 0x00, 0x00, 0x00, 0x0A, 0x00, 0x00, 0x00];
        assert!(ResponseHeader::decode(&response).is_err());
    }

    #[test]
    fn test_declared_size_needs_six_bytes() {
        assert_eq!(
            ResponseHeader::declared_size(&[0x80, 0x01, 0x00, 0x00, 0x01, 0x00]).unwrap(),
            0x100
        );
        assert!(ResponseHeader::declared_size(&[0x80, 0x01, 0x00, 0x00, 0x01]).is_err());
        assert!(ResponseHeader::declared_size(&[]).is_err());
    }

    #[test]
    fn test_buffer_underflow_does_not_advance() {
        let data = [0x01, 0x02, 0x03];
        let mut buf = ResponseBuffer::new(&data);
        assert_eq!(buf.get_u16().unwrap(), 0x0102);
        assert!(buf.get_u32().is_err());
        assert_eq!(buf.position(), 2);
        assert_eq!(buf.remaining(), 1);
    }
}
