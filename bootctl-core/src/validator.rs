// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Validates a flashed application image before handing control to it.
//!
//! Three checks, all required: the initial stack pointer must point into
//! RAM, the reset vector must point into flash with its Thumb bit set, and
//! the firmware metadata record's magic must be intact.

use crate::metadata::FirmwareMetadata;
use crate::update::{read_bytes, FlashIo};

const RAM_REGION: core::ops::Range<u32> = 0x2000_0000..0x2010_0000;
const FLASH_REGION: core::ops::Range<u32> = 0x0800_0000..0x0810_0000;

fn read_u32<F: FlashIo>(flash: &F, addr: u32) -> u32 {
    let mut buf = [0u8; 4];
    read_bytes(flash, addr, &mut buf);
    u32::from_le_bytes(buf)
}

/// Returns `true` only if all three checks pass.
pub fn validate_installed_image<F: FlashIo>(flash: &F, app_start: u32, meta_addr: u32) -> bool {
    let initial_sp = read_u32(flash, app_start);
    let reset_vector = read_u32(flash, app_start + 4);

    let sp_in_ram = RAM_REGION.contains(&initial_sp);
    let reset_in_flash = FLASH_REGION.contains(&reset_vector) && reset_vector & 1 == 1;

    let mut meta_bytes = [0u8; FirmwareMetadata::SIZE];
    read_bytes(flash, meta_addr, &mut meta_bytes);
    let meta = FirmwareMetadata::from_bytes(&meta_bytes);

    sp_in_ram && reset_in_flash && meta.is_magic_valid()
}
