// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Update sequencing: drives a YMODEM transfer into flash and writes the
//! firmware metadata record.
//!
//! The metadata record is written before the post-transfer CRC verification
//! pass runs, not after: a transfer that completes but fails verification
//! still leaves a `BOOT`-tagged (but stale) record in place until the next
//! update's erase pass overwrites it. This mirrors the upstream C
//! implementation's ordering rather than "fixing" it.

use crate::crc::Crc32Accumulator;
use crate::layout::{APP_START, FLASH_END, FLASH_PAGE_SIZE, META_ADDR};
use crate::metadata::FirmwareMetadata;
use crate::ymodem::{SerialIo, YmodemError, YmodemReceiver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashError {
    Erase,
    Program,
    ReadBack,
    Unaligned,
}

/// Flash controller consumed by the update sequencer. `program_halfword`
/// implementations must read back and verify the written value themselves;
/// callers here only check the `Result`.
pub trait FlashIo {
    fn unlock(&mut self) -> Result<(), FlashError>;
    fn lock(&mut self);
    fn erase_pages(&mut self, start_addr: u32, page_count: u32) -> Result<(), FlashError>;
    fn program_halfword(&mut self, addr: u32, value: u16) -> Result<(), FlashError>;
    fn read_halfword(&self, addr: u32) -> u16;
}

/// Reads an arbitrary byte span out of halfword-addressable flash, for
/// callers (CRC verification, the validator) that don't want to think in
/// halfwords.
pub fn read_bytes<F: FlashIo>(flash: &F, addr: u32, buf: &mut [u8]) {
    let mut offset = 0usize;
    while offset < buf.len() {
        let halfword = flash.read_halfword(addr + offset as u32).to_le_bytes();
        let take = (buf.len() - offset).min(2);
        buf[offset..offset + take].copy_from_slice(&halfword[..take]);
        offset += 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateError {
    Transfer(YmodemError),
    Flash(FlashError),
    SizeExceedsRegion,
    VerifyMismatch,
}

impl From<YmodemError> for UpdateError {
    fn from(e: YmodemError) -> Self {
        UpdateError::Transfer(e)
    }
}

impl From<FlashError> for UpdateError {
    fn from(e: FlashError) -> Self {
        UpdateError::Flash(e)
    }
}

/// Runs every program/erase call bracketed by `unlock`/`lock`, locking even
/// on failure.
fn guarded<F, T>(flash: &mut F, op: impl FnOnce(&mut F) -> Result<T, FlashError>) -> Result<T, FlashError>
where
    F: FlashIo,
{
    flash.unlock()?;
    let result = op(flash);
    flash.lock();
    result
}

/// Programs `data` starting at `addr`, half-word at a time, padding a
/// trailing odd byte with 0xFF.
fn program_block<F: FlashIo>(flash: &mut F, addr: u32, data: &[u8]) -> Result<(), FlashError> {
    guarded(flash, |flash| {
        let mut offset = 0u32;
        let mut chunks = data.chunks(2);
        while let Some(chunk) = chunks.next() {
            let halfword = match chunk {
                [lo, hi] => u16::from_le_bytes([*lo, *hi]),
                [lo] => u16::from_le_bytes([*lo, 0xFF]),
                _ => unreachable!(),
            };
            flash.program_halfword(addr + offset, halfword)?;
            offset += 2;
        }
        Ok(())
    })
}

fn pages_for(byte_len: u32) -> u32 {
    byte_len.div_ceil(FLASH_PAGE_SIZE)
}

/// Runs one full update attempt: negotiates YMODEM, streams the image into
/// flash from [`APP_START`], writes the metadata record, then verifies by
/// re-reading flash and recomputing its CRC-32. Verification runs after the
/// metadata write, so a verify failure is still reported as an error even
/// though the record on flash now claims a valid image.
pub fn run_update<F: FlashIo, S: SerialIo>(
    flash: &mut F,
    io: &mut S,
) -> Result<FirmwareMetadata, UpdateError> {
    let mut header = YmodemReceiver::receive_header(io)?;

    let region_len = FLASH_END - META_ADDR + 1;
    if header.size > region_len {
        return Err(UpdateError::SizeExceedsRegion);
    }

    let erase_len = (APP_START - META_ADDR) + header.size.max(1);
    guarded(flash, |flash| {
        flash.erase_pages(META_ADDR, pages_for(erase_len))
    })?;

    let mut next_addr = APP_START;
    let mut running_crc = Crc32Accumulator::new();
    let mut program_err: Option<FlashError> = None;

    let transfer_result = YmodemReceiver::receive_file(io, &mut header, |payload| {
        match program_block(flash, next_addr, payload) {
            Ok(()) => {
                running_crc.update(payload);
                next_addr += payload.len() as u32;
                true
            }
            Err(e) => {
                program_err = Some(e);
                false
            }
        }
    });

    if let Some(e) = program_err {
        return Err(UpdateError::Flash(e));
    }
    transfer_result?;

    if header.received_size != header.size {
        return Err(UpdateError::VerifyMismatch);
    }

    let expected_crc = running_crc.finalize();
    let meta = FirmwareMetadata::new(0, header.size, expected_crc);
    program_block(flash, META_ADDR, &meta.to_bytes())?;

    let actual_crc = read_back_crc32(flash, APP_START, header.size);
    if actual_crc != expected_crc {
        return Err(UpdateError::VerifyMismatch);
    }

    Ok(meta)
}

fn read_back_crc32<F: FlashIo>(flash: &F, addr: u32, len: u32) -> u32 {
    let mut acc = Crc32Accumulator::new();
    let mut offset = 0u32;
    let mut buf = [0u8; 256];
    while offset < len {
        let take = buf.len().min((len - offset) as usize);
        read_bytes(flash, addr + offset, &mut buf[..take]);
        acc.update(&buf[..take]);
        offset += take as u32;
    }
    acc.finalize()
}

/// Tracks consecutive update failures so the caller knows when to force a
/// hardware reset rather than keep retrying a wedged transfer.
pub struct ErrorBudget {
    consecutive: u8,
    threshold: u8,
}

impl ErrorBudget {
    pub fn new(threshold: u8) -> Self {
        Self {
            consecutive: 0,
            threshold,
        }
    }

    pub fn record_failure(&mut self) {
        self.consecutive = self.consecutive.saturating_add(1);
    }

    pub fn record_success(&mut self) {
        self.consecutive = 0;
    }

    pub fn should_reset(&self) -> bool {
        self.consecutive > self.threshold
    }
}

impl Default for ErrorBudget {
    fn default() -> Self {
        Self::new(5)
    }
}
