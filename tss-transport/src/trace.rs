// SPDX-FileCopyrightText: © 2025 Phala Network <dstack@phala.network>
//
// SPDX-License-Identifier: Apache-2.0

//! Verbose transmit diagnostics

use tracing::info;

const BYTES_PER_LINE: usize = 16;

/// Render `bytes` as offset-prefixed lines of 16 hex bytes
pub fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::new();
    for (i, chunk) in bytes.chunks(BYTES_PER_LINE).enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let hex = hex::encode(chunk);
        let spaced: Vec<&str> = (0..chunk.len()).map(|j| &hex[j * 2..j * 2 + 2]).collect();
        out.push_str(&format!("{:04x}: {}", i * BYTES_PER_LINE, spaced.join(" ")));
    }
    out
}

/// Log a labelled buffer dump
pub fn dump(label: &str, bytes: &[u8]) {
    info!("{label}: {} bytes\n{}", bytes.len(), hex_dump(bytes));
}
