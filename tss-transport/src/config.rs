// SPDX-FileCopyrightText: © 2025 Phala Network <dstack@phala.network>
//
// SPDX-License-Identifier: Apache-2.0

//! Transport configuration
//!
//! Mirrors the TSS environment properties: `TPM_DEVICE` selects the device
//! node, and `TPM_TRACE_LEVEL` turns on verbose transmit tracing.

use anyhow::{Context, Result};

pub const TPM_DEVICE_ENV: &str = "TPM_DEVICE";
pub const TPM_TRACE_LEVEL_ENV: &str = "TPM_TRACE_LEVEL";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportConfig {
    /// Device node; `None` auto-detects `/dev/tpmrm0` then `/dev/tpm0`
    pub device: Option<String>,
    /// 0 = silent, 1 = transmit dumps, 2 = transmit dumps and flow
    pub trace_level: u8,
}

impl TransportConfig {
    pub fn from_env() -> Result<Self> {
        let device = std::env::var(TPM_DEVICE_ENV)
            .ok()
            .filter(|d| !d.is_empty());
        let trace_level = match std::env::var(TPM_TRACE_LEVEL_ENV) {
            Ok(level) => parse_trace_level(&level)?,
            Err(_) => 0,
        };
        Ok(Self {
            device,
            trace_level,
        })
    }

    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    pub fn with_trace_level(mut self, level: u8) -> Self {
        self.trace_level = level;
        self
    }

    pub fn verbose(&self) -> bool {
        self.trace_level >= 1
    }
}

fn parse_trace_level(level: &str) -> Result<u8> {
    level
        .trim()
        .parse()
        .with_context(|| format!("invalid {TPM_TRACE_LEVEL_ENV}: {level:?}"))
}
