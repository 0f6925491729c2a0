// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! CRC engines used by the wire protocol and by firmware integrity checks.
//!
//! Both variants are exact matches for presets already shipped by the `crc`
//! crate, so there is no hand-rolled table here: CRC-16/CCITT-XMODEM (packet
//! framing) is `CRC_16_XMODEM`, and CRC-32/IEEE (firmware image integrity) is
//! `CRC_32_ISO_HDLC`.

use crc::{Crc, CRC_16_XMODEM, CRC_32_ISO_HDLC};

static CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);
static CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// CRC-16 over a YMODEM packet's data field, transmitted big-endian on the wire.
pub fn crc16(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}

/// One-shot CRC-32 over a full buffer, used by host tooling and tests.
pub fn crc32(data: &[u8]) -> u32 {
    CRC32.checksum(data)
}

/// Incremental CRC-32 accumulator, fed one flash-bound chunk at a time as a
/// firmware image streams in over YMODEM.
pub struct Crc32Accumulator(crc::Digest<'static, u32>);

impl Crc32Accumulator {
    pub fn new() -> Self {
        Self(CRC32.digest())
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.0.update(bytes);
    }

    pub fn finalize(self) -> u32 {
        self.0.finalize()
    }
}

impl Default for Crc32Accumulator {
    fn default() -> Self {
        Self::new()
    }
}
