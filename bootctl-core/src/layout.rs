// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Flash and RAM layout constants shared by the bootloader core and its
//! concrete board implementations.
//!
//! Mirrors the layout used by the original firmware this protocol was
//! lifted from: a fixed-size bootloader region at the base of flash, the
//! application immediately above it, and a small metadata record carved out
//! of the last 0x30 bytes before the application's own vector table.

/// Start of flash.
pub const FLASH_BASE: u32 = 0x0800_0000;

/// Size reserved for the bootloader itself.
pub const BOOTLOADER_SIZE: u32 = 0x4000;

/// First address of the application image.
pub const APP_START: u32 = FLASH_BASE + BOOTLOADER_SIZE;

/// Bytes reserved immediately below [`APP_START`] for [`crate::metadata::FirmwareMetadata`].
pub const META_RESERVED: u32 = 0x30;

/// Address of the firmware metadata record.
pub const META_ADDR: u32 = APP_START - META_RESERVED;

/// Last valid address of flash (inclusive), on a 64 KiB part.
pub const FLASH_END: u32 = 0x0800_FFFF;

/// Erase granularity of the target's flash controller.
pub const FLASH_PAGE_SIZE: u32 = 1024;

/// Start of SRAM, used to host the entry-request cell.
pub const RAM_BASE: u32 = 0x2000_0000;

/// Address of the word a running application writes to request reentry into
/// update mode on the next reset, without needing a dedicated GPIO.
pub const RAM_ENTRY_REQUEST_ADDR: u32 = RAM_BASE;

/// Sentinel value written to [`RAM_ENTRY_REQUEST_ADDR`] to request update mode.
/// Any other value, including plain zeroed RAM after a power-on reset, means
/// "no request".
pub const RAM_ENTRY_REQUEST_MAGIC: u32 = 0xDEAD_BEEF;
