// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! YMODEM-1K sender: the mirror image of `bootctl_core::ymodem`'s receiver,
//! driving the same framing and handshake from the other end of the wire.

use std::fs;
use std::path::Path;

use anyhow::{bail, Result};
use crc::{Crc, CRC_16_XMODEM};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};

use crate::transport::Transport;

const SOH: u8 = 0x01;
const STX: u8 = 0x02;
const EOT: u8 = 0x04;
const ACK: u8 = 0x06;
const NAK: u8 = 0x15;
const CAN: u8 = 0x18;
const CTRLZ: u8 = 0x1A;
const C: u8 = b'C';

const BLOCK_SIZE: usize = 1024;
const MAX_RETRIES: u32 = 10;

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

fn send_packet(transport: &mut Transport, seq: u8, data: &[u8; BLOCK_SIZE]) -> Result<()> {
    let crc = CRC16.checksum(data);
    transport.send_byte(STX)?;
    transport.send_byte(seq)?;
    transport.send_byte(!seq)?;
    transport.send_bytes(data)?;
    transport.send_bytes(&crc.to_be_bytes())?;
    Ok(())
}

fn await_byte(transport: &mut Transport, expected: &[u8]) -> Result<u8> {
    for _ in 0..MAX_RETRIES {
        if let Ok(byte) = transport.recv_byte() {
            if expected.contains(&byte) {
                return Ok(byte);
            }
            if byte == CAN {
                bail!("device cancelled the transfer");
            }
        }
    }
    bail!("timed out waiting for one of {:?}", expected)
}

/// Sends `path` to the device over an already-open transport, waiting for
/// the receiver's leading `C` before the header packet and again before
/// each data block.
pub fn send_file(transport: &mut Transport, path: &Path) -> Result<()> {
    let data = fs::read(path)?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("firmware.bin");

    info!("waiting for receiver to request CRC mode");
    await_byte(transport, &[C])?;

    let mut header = [0u8; BLOCK_SIZE];
    let payload = format!("{}\0{}", name, data.len());
    header[..payload.len()].copy_from_slice(payload.as_bytes());
    send_packet(transport, 0, &header)?;
    await_byte(transport, &[ACK])?;
    debug!("header packet acknowledged");

    let pb = ProgressBar::new(data.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")?
            .progress_chars("#>-"),
    );

    let mut seq: u8 = 1;
    for chunk in data.chunks(BLOCK_SIZE) {
        let mut block = [CTRLZ; BLOCK_SIZE];
        block[..chunk.len()].copy_from_slice(chunk);

        let mut attempts = 0;
        loop {
            send_packet(transport, seq, &block)?;
            match await_byte(transport, &[ACK, NAK]) {
                Ok(ACK) => break,
                Ok(NAK) => {
                    attempts += 1;
                    if attempts >= MAX_RETRIES {
                        pb.abandon();
                        bail!("too many retries on block {seq}");
                    }
                }
                _ => unreachable!(),
            }
        }

        seq = seq.wrapping_add(1);
        pb.inc(chunk.len() as u64);
    }
    pb.finish_with_message("transfer complete");

    transport.send_byte(EOT)?;
    await_byte(transport, &[ACK])?;
    await_byte(transport, &[C])?;
    transport.send_byte(EOT)?;
    await_byte(transport, &[ACK])?;

    println!("Firmware sent: {} bytes.", data.len());
    Ok(())
}
