// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command-line interface definitions.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::transport::Transport;
use crate::ymodem_tx;

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "bootctl-host")]
#[command(about = "Send firmware to bootctl-device over YMODEM")]
pub struct Cli {
    /// Serial port (e.g., /dev/ttyUSB0)
    #[arg(short, long)]
    pub port: String,

    /// Serial baud rate
    #[arg(long, default_value = "115200")]
    pub baud: u32,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Send a firmware image over YMODEM
    Send {
        /// Firmware binary file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Per-byte receive timeout in milliseconds
        #[arg(long, default_value = "5000")]
        timeout_ms: u64,
    },

    /// Check that the device is listening on the given port
    Probe,
}

/// Execute the parsed CLI command.
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Send { file, timeout_ms } => {
            let mut transport = Transport::open(&cli.port, cli.baud, timeout_ms)?;
            ymodem_tx::send_file(&mut transport, &file)
        }
        Commands::Probe => {
            let transport = Transport::open(&cli.port, cli.baud, 2000)?;
            println!("Opened {} at {} baud.", transport.port_name(), cli.baud);
            Ok(())
        }
    }
}
