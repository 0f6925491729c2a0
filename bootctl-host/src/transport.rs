// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Serial transport: a thin byte-oriented wrapper over `serialport`, since
//! YMODEM is a raw byte protocol rather than a framed one.

use anyhow::{Context, Result};
use serialport::SerialPort;
use std::io::{Read, Write};
use std::time::Duration;

pub struct Transport {
    port: Box<dyn SerialPort>,
}

impl Transport {
    pub fn open(port_name: &str, baud: u32, timeout_ms: u64) -> Result<Self> {
        let port = serialport::new(port_name, baud)
            .timeout(Duration::from_millis(timeout_ms))
            .open()
            .with_context(|| format!("failed to open serial port {port_name}"))?;
        Ok(Self { port })
    }

    pub fn port_name(&self) -> String {
        self.port.name().unwrap_or_else(|| "?".to_string())
    }

    pub fn set_timeout(&mut self, timeout_ms: u64) -> Result<()> {
        self.port
            .set_timeout(Duration::from_millis(timeout_ms))
            .context("failed to set serial timeout")
    }

    pub fn recv_byte(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        self.port.read_exact(&mut byte).context("serial read failed or timed out")?;
        Ok(byte[0])
    }

    pub fn send_byte(&mut self, byte: u8) -> Result<()> {
        self.port.write_all(&[byte]).context("serial write failed")?;
        self.port.flush().context("serial flush failed")
    }

    pub fn send_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.port.write_all(bytes).context("serial write failed")?;
        self.port.flush().context("serial flush failed")
    }
}
