// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Host-side firmware sender for bootctl-device.
//!
//! Usage:
//!   bootctl-host --port /dev/ttyUSB0 send firmware.bin
//!   bootctl-host --port /dev/ttyUSB0 probe

mod cli;
mod transport;
mod ymodem_tx;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    env_logger::init();
    let args = cli::Cli::parse();
    cli::run(args)
}
