// SPDX-FileCopyrightText: © 2025 Phala Network <dstack@phala.network>
//
// SPDX-License-Identifier: Apache-2.0

//! Send one raw TPM command to a TPM device and print the response.
//!
//! Usage:
//!   tss-transmit [--device PATH] [--trace-level N] [COMMAND_HEX]
//!
//! With no command, sends TPM2_GetRandom for 8 bytes. The device and trace
//! level fall back to `TPM_DEVICE` and `TPM_TRACE_LEVEL`.

use anyhow::{bail, Context, Result};
use clap::Parser;
use tss_transport::{
    hex_dump, rc_of, ResponseBuf, TransportConfig, TssContext, MAX_COMMAND_SIZE,
    MAX_RESPONSE_SIZE,
};

const GET_RANDOM_8: &str = "80010000000c0000017b0008";

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// TPM device node (defaults to /dev/tpmrm0, then /dev/tpm0)
    #[arg(short, long)]
    device: Option<String>,

    /// 0 = quiet, 1 or more = dump command and response
    #[arg(short, long)]
    trace_level: Option<u8>,

    /// Marshalled command as hex
    #[arg(default_value = GET_RANDOM_8)]
    command: String,
}

fn main() -> Result<()> {
    {
        use tracing_subscriber::{fmt, EnvFilter};
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt().with_env_filter(filter).init();
    }

    let args = Args::parse();

    let mut config = TransportConfig::from_env()?;
    if let Some(device) = args.device {
        config = config.with_device(device);
    }
    if let Some(level) = args.trace_level {
        config = config.with_trace_level(level);
    }

    let command = hex::decode(args.command.trim()).context("invalid command hex")?;
    if command.len() > MAX_COMMAND_SIZE {
        bail!(
            "command is {} bytes, limit is {}",
            command.len(),
            MAX_COMMAND_SIZE
        );
    }

    let mut ctx = TssContext::from_config(&config);
    let mut response: ResponseBuf = [0u8; MAX_RESPONSE_SIZE];
    let result = ctx.transmit(&mut response, &command, "tss-transmit");
    ctx.close()?;

    if let Some(path) = ctx.device_path() {
        println!("device: {path}");
    }
    let rc = rc_of(&result);
    match result {
        Ok(transmitted) => {
            println!("{}", hex_dump(&response[..transmitted.read]));
            println!("response code: {rc:#010x}");
        }
        Err(e) => {
            bail!("transmit failed: {e} ({rc:#010x})");
        }
    }
    Ok(())
}
